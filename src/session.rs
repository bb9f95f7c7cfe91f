use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;
use uuid::Uuid;
use crate::options::ExtractionOptions;
use crate::processor::{Outcome, VideoProcessor};
use crate::ui::format_file_size;
use crate::view::SelectedFile;

/// 用户可触发的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CheckHealth,
    SupportedFormats,
    VideoInfo,
    ExtractFrames,
    ExtractFramesBase64Only,
    ExtractFramesWithRequest,
    GenerateJsonFormat,
    CopyJson,
    CopyFrame(usize),
    QuickTest1,
    QuickTest2,
    QuickTest3,
    ClearLog,
}

/// 任务分组：同组操作写同一块显示区域，新任务会取消旧任务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKey {
    Health,
    Formats,
    Info,
    Extraction,
    Json,
    Clipboard,
    Log,
}

impl Action {
    pub fn key(&self) -> ActionKey {
        match self {
            Action::CheckHealth => ActionKey::Health,
            Action::SupportedFormats => ActionKey::Formats,
            Action::VideoInfo => ActionKey::Info,
            Action::ExtractFrames
            | Action::ExtractFramesBase64Only
            | Action::ExtractFramesWithRequest
            | Action::QuickTest1
            | Action::QuickTest2
            | Action::QuickTest3 => ActionKey::Extraction,
            Action::GenerateJsonFormat => ActionKey::Json,
            Action::CopyJson | Action::CopyFrame(_) => ActionKey::Clipboard,
            Action::ClearLog => ActionKey::Log,
        }
    }
}

async fn perform(processor: VideoProcessor, action: Action) -> Outcome {
    match action {
        Action::CheckHealth => processor.check_health().await,
        Action::SupportedFormats => processor.get_supported_formats().await,
        Action::VideoInfo => processor.get_video_info().await,
        Action::ExtractFrames => processor.extract_frames(ExtractionOptions::default()).await,
        Action::ExtractFramesBase64Only => processor.extract_frames_base64_only(ExtractionOptions::default()).await,
        Action::ExtractFramesWithRequest => processor.extract_frames_with_request(ExtractionOptions::default()).await,
        Action::GenerateJsonFormat => processor.generate_json_format().await,
        Action::CopyJson => processor.copy_json_content().await,
        Action::CopyFrame(number) => processor.copy_frame(number).await,
        Action::QuickTest1 => processor.quick_test_1().await,
        Action::QuickTest2 => processor.quick_test_2().await,
        Action::QuickTest3 => processor.quick_test_3().await,
        Action::ClearLog => {
            processor.logger().clear();
            Outcome::Done
        }
    }
}

/// 事件绑定与启动
///
/// 每个操作作为独立任务运行，并按 `ActionKey` 登记；
/// 同组的新操作启动前会取消仍在进行中的旧任务。
type InFlight = Arc<Mutex<HashMap<ActionKey, (Uuid, AbortHandle)>>>;

pub struct Session {
    processor: VideoProcessor,
    /// 每组仍在进行的任务，任务结束时按 id 移除自己的登记
    in_flight: InFlight,
}

impl Session {
    pub fn new(processor: VideoProcessor) -> Arc<Self> {
        Arc::new(Self {
            processor,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn processor(&self) -> &VideoProcessor {
        &self.processor
    }

    /// 启动：记录启动日志，并在 `health_check_delay` 后自动检查服务状态
    pub fn bootstrap(self: &Arc<Self>, health_check_delay: Duration) -> JoinHandle<Outcome> {
        let logger = self.processor.logger();
        logger.info("视频帧提取器已启动");
        logger.info(format!("API服务地址: {}", self.processor.api().base_url()));

        let session = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(health_check_delay).await;
            match session.dispatch(Action::CheckHealth).await {
                Ok(outcome) => outcome,
                Err(e) => Outcome::Failed(e.to_string()),
            }
        });

        logger.info("应用初始化完成");
        handle
    }

    /// 以任务方式执行操作，取消同组仍在进行的任务
    pub fn dispatch(&self, action: Action) -> JoinHandle<Outcome> {
        let key = action.key();
        let task_id = Uuid::new_v4();

        // 登记完成前持有锁，任务结束时的移除一定发生在登记之后
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());

        let registry = Arc::clone(&self.in_flight);
        let processor = self.processor.clone();
        let handle = tokio::spawn(async move {
            let outcome = perform(processor, action).await;
            let mut in_flight = registry.lock().unwrap_or_else(|e| e.into_inner());
            if in_flight.get(&key).is_some_and(|(id, _)| *id == task_id) {
                in_flight.remove(&key);
            }
            outcome
        });

        if let Some((previous_id, previous)) = in_flight.insert(key, (task_id, handle.abort_handle())) {
            if !previous.is_finished() {
                debug!("取消进行中的任务 {:?} ({})", key, previous_id);
                self.processor.logger().warning(format!("已取消上一次未完成的操作: {:?}", action));
                previous.abort();
            }
        }
        debug!("已启动任务 {:?} ({})", action, task_id);

        handle
    }

    /// 选择视频信息文件
    pub fn select_video_info_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = SelectedFile::open(path)?;
        self.processor
            .logger()
            .info(format!("选择了视频信息文件: {} ({})", file.name, format_file_size(file.size)));
        self.update_view(|v| v.video_info_file = Some(file));
        Ok(())
    }

    /// 选择帧提取文件，同步到视频信息文件
    pub fn select_video_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = SelectedFile::open(path)?;
        self.processor
            .logger()
            .info(format!("选择了视频文件: {} ({})", file.name, format_file_size(file.size)));
        self.update_view(|v| {
            v.video_info_file = Some(file.clone());
            v.video_file = Some(file);
        });
        Ok(())
    }

    /// 选择 JSON 格式生成使用的文件
    pub fn select_json_video_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = SelectedFile::open(path)?;
        self.processor
            .logger()
            .info(format!("选择了JSON视频文件: {} ({})", file.name, format_file_size(file.size)));
        self.update_view(|v| v.json_video_file = Some(file));
        Ok(())
    }

    pub fn set_prompt_text(&self, text: &str) {
        self.processor.logger().info(format!("提示词更新: {}", text));
        self.update_view(|v| v.prompt_text = text.to_string());
    }

    /// 更新提取参数控件
    pub fn set_param(&self, name: &str, value: &str) -> Result<()> {
        let shown = self.update_view(|v| v.form.set(name, value))?;
        self.processor.logger().info(format!("参数更新: {} = {}", name, shown));
        Ok(())
    }

    /// 仍在进行的操作组
    pub fn in_flight(&self) -> Vec<ActionKey> {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect()
    }

    fn update_view<R>(&self, f: impl FnOnce(&mut crate::view::View) -> R) -> R {
        let mut view = self.processor.view().lock().unwrap_or_else(|e| e.into_inner());
        f(&mut view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::ApiClient;
    use crate::clipboard::MemoryClipboard;
    use crate::logger::Logger;
    use crate::view::View;

    fn session() -> Arc<Session> {
        let logger = Logger::new();
        let api = ApiClient::new("http://127.0.0.1:1/api", logger.clone(), None).unwrap();
        Session::new(VideoProcessor::new(api, View::shared(), logger, Arc::new(MemoryClipboard::new())))
    }

    #[test]
    fn test_action_keys() {
        assert_eq!(Action::QuickTest2.key(), ActionKey::Extraction);
        assert_eq!(Action::ExtractFramesBase64Only.key(), Action::ExtractFrames.key());
        assert_ne!(Action::VideoInfo.key(), Action::ExtractFrames.key());
        assert_eq!(Action::CopyFrame(3).key(), ActionKey::Clipboard);
    }

    #[test]
    fn test_video_file_syncs_to_info_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, vec![0u8; 1536]).unwrap();

        let session = session();
        session.select_video_file(&path).unwrap();

        let view = session.processor().snapshot();
        assert_eq!(view.video_file.as_ref().map(|f| f.name.as_str()), Some("clip.mp4"));
        assert_eq!(view.video_info_file, view.video_file);
        assert!(session.processor().logger().contains("选择了视频文件: clip.mp4 (1.5 KB)"));
    }

    #[test]
    fn test_set_param_logs_update() {
        let session = session();
        session.set_param("intervalSeconds", "5").unwrap();
        assert!(session.set_param("imageQuality", "high").is_err());
        assert_eq!(session.processor().snapshot().form.interval_seconds, Some(5));
        assert!(session.processor().logger().contains("参数更新: intervalSeconds = 5"));
    }

    #[tokio::test]
    async fn test_clear_log_action() {
        let session = session();
        session.set_prompt_text("描述这些图片");
        let outcome = session.dispatch(Action::ClearLog).await.unwrap();
        assert_eq!(outcome, Outcome::Done);
        assert!(session.processor().logger().is_empty());
        assert!(session.in_flight().is_empty());
    }
}
