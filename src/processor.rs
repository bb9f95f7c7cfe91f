use anyhow::Context;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::AbortHandle;
use crate::api_client::ApiClient;
use crate::clipboard::Clipboard;
use crate::error::{ClientError, ClientResult};
use crate::gallery::FrameItem;
use crate::logger::Logger;
use crate::models::{
    self, Base64ExtractionResult, DataResponse, ExtractionResult, Frame, HealthStatus,
    JsonFormatResult, SupportedFormats, VideoInfo,
};
use crate::options::{ExtractionOptions, ExtractionRequest};
use crate::ui::{self, format_duration, format_file_size, pretty_json};
use crate::view::{PanelId, SelectedFile, SharedView, View, COPY_BUTTON_LABEL};

/// 服务端接口路径
pub mod endpoints {
    pub const HEALTH: &str = "/video/health";
    pub const SUPPORTED_FORMATS: &str = "/video/supported-formats";
    pub const INFO: &str = "/video/info";
    pub const EXTRACT_FRAMES: &str = "/video/extract-frames";
    pub const EXTRACT_FRAMES_BASE64_ONLY: &str = "/video/extract-frames-base64-only";
    pub const EXTRACT_FRAMES_JSON: &str = "/video/extract-frames-json";
    pub const EXTRACT_FRAMES_JSON_FORMAT: &str = "/video/extract-frames-json-format";
}

/// 复制成功后按钮文字保持的时间
pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_secs(2);
pub const COPIED_LABEL: &str = "已复制!";

const NO_FILE_SELECTED: &str = "请先选择视频文件";
const NO_PROMPT_TEXT: &str = "请输入提示词内容";
const EXTRACTING: &str = "正在提取视频帧，请稍候...";

/// 一次操作的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 成功并已渲染
    Done,
    /// 输入校验失败，未发送请求
    Invalid(String),
    /// 服务端返回 `success: false`
    Refused(String),
    /// 请求失败（网络错误、非 2xx、响应无法解析）
    Failed(String),
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Done => None,
            Outcome::Invalid(m) | Outcome::Refused(m) | Outcome::Failed(m) => Some(m),
        }
    }
}

/// 经过 `success` 判断后的响应
enum Reply<T> {
    Accepted(T),
    Refused(String),
}

/// 先判断 `success`，再解析其余字段
fn gate<T: DeserializeOwned>(value: Value) -> ClientResult<Reply<T>> {
    if !models::is_success(&value) {
        return Ok(Reply::Refused(models::server_message(&value)));
    }
    serde_json::from_value(value)
        .map(Reply::Accepted)
        .map_err(|e| ClientError::Decode(e.to_string()))
}

/// 带上传文件的 multipart 表单
async fn file_form(file: &SelectedFile) -> ClientResult<Form> {
    let bytes = tokio::fs::read(&file.path).await?;
    let part = Part::bytes(bytes).file_name(file.name.clone());
    Ok(Form::new().part("file", part))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramesEndpoint {
    /// 参数作为表单字段
    FormFields,
    /// 参数作为 JSON `request` 部分
    JsonRequest,
}

impl FramesEndpoint {
    fn path(&self) -> &'static str {
        match self {
            FramesEndpoint::FormFields => endpoints::EXTRACT_FRAMES,
            FramesEndpoint::JsonRequest => endpoints::EXTRACT_FRAMES_JSON,
        }
    }

    async fn form(&self, file: &SelectedFile, options: &ExtractionOptions) -> ClientResult<Form> {
        let mut form = file_form(file).await?;
        match self {
            FramesEndpoint::FormFields => {
                for (name, value) in options.form_fields() {
                    form = form.text(name, value);
                }
            }
            FramesEndpoint::JsonRequest => {
                let request = ExtractionRequest {
                    video_file_name: file.name.clone(),
                    options: options.clone(),
                };
                let body = serde_json::to_string(&request)
                    .map_err(|e| ClientError::Decode(e.to_string()))?;
                form = form.part("request", Part::text(body).mime_str("application/json")?);
            }
        }
        Ok(form)
    }
}

/// 视频帧提取业务逻辑
///
/// 每个操作都是：校验输入 → 显示加载 → 调用接口 → 渲染结果或错误。
/// 错误在方法边界内处理完毕，不会继续向上传播。
#[derive(Clone)]
pub struct VideoProcessor {
    api: ApiClient,
    view: SharedView,
    logger: Logger,
    clipboard: Arc<dyn Clipboard>,
    /// 复制按钮文字的恢复计时，新的复制会取消旧的计时
    label_reset: Arc<Mutex<Option<AbortHandle>>>,
}

impl VideoProcessor {
    pub fn new(api: ApiClient, view: SharedView, logger: Logger, clipboard: Arc<dyn Clipboard>) -> Self {
        Self {
            api,
            view,
            logger,
            clipboard,
            label_reset: Arc::new(Mutex::new(None)),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn view(&self) -> &SharedView {
        &self.view
    }

    fn lock(&self) -> MutexGuard<'_, View> {
        self.view.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn update<R>(&self, f: impl FnOnce(&mut View) -> R) -> R {
        f(&mut self.lock())
    }

    /// 当前视图的副本
    pub fn snapshot(&self) -> View {
        self.lock().clone()
    }

    fn invalid(&self, panel: PanelId, message: &str) -> Outcome {
        self.update(|v| ui::show_error(v.panel_mut(panel), message));
        self.logger.warning(message);
        Outcome::Invalid(message.to_string())
    }

    fn refuse(&self, panel: PanelId, message: String) -> Outcome {
        self.update(|v| ui::show_error(v.panel_mut(panel), message.clone()));
        Outcome::Refused(message)
    }

    fn fail(&self, panel: PanelId, message: String) -> Outcome {
        self.update(|v| ui::show_error(v.panel_mut(panel), message.clone()));
        Outcome::Failed(message)
    }

    /// 剪贴板工具是阻塞调用，放到阻塞线程池执行
    async fn write_clipboard(&self, text: String) -> anyhow::Result<()> {
        let clipboard = Arc::clone(&self.clipboard);
        tokio::task::spawn_blocking(move || clipboard.write_text(&text))
            .await
            .context("剪贴板任务异常退出")?
    }

    async fn post_form<T: DeserializeOwned>(&self, endpoint: &str, form: ClientResult<Form>) -> ClientResult<Reply<T>> {
        let value = self.api.post(endpoint, form?).await?;
        gate(value)
    }

    /// 检查服务健康状态
    pub async fn check_health(&self) -> Outcome {
        self.update(|v| ui::show_loading(&mut v.health_status, "检查服务状态..."));

        let result = self.api.get(endpoints::HEALTH).await.and_then(|value| {
            serde_json::from_value::<HealthStatus>(value).map_err(|e| ClientError::Decode(e.to_string()))
        });

        match result {
            Ok(health) => {
                let service = health.service.unwrap_or_else(|| "未知服务".to_string());
                self.update(|v| ui::show_success(&mut v.health_status, format!("服务正常运行 - {}", service)));
                Outcome::Done
            }
            Err(e) => self.fail(PanelId::HealthStatus, format!("服务连接失败: {}", e)),
        }
    }

    /// 获取支持的格式
    pub async fn get_supported_formats(&self) -> Outcome {
        self.update(|v| ui::show_loading(&mut v.supported_formats, "获取支持格式..."));

        let result = self
            .api
            .get(endpoints::SUPPORTED_FORMATS)
            .await
            .and_then(gate::<DataResponse<SupportedFormats>>);

        match result {
            Ok(Reply::Accepted(response)) => {
                let formats = json!({
                    "视频格式": response.data.video_formats,
                    "图片格式": response.data.image_formats,
                });
                self.update(|v| ui::show_info(&mut v.supported_formats, formats));
                Outcome::Done
            }
            Ok(Reply::Refused(message)) => self.refuse(PanelId::SupportedFormats, message),
            Err(e) => self.fail(PanelId::SupportedFormats, format!("获取格式失败: {}", e)),
        }
    }

    /// 获取视频信息
    pub async fn get_video_info(&self) -> Outcome {
        let Some(file) = self.update(|v| v.video_info_file.clone()) else {
            return self.invalid(PanelId::VideoInfoResult, NO_FILE_SELECTED);
        };

        self.update(|v| ui::show_loading(&mut v.video_info_result, "分析视频信息..."));

        let result = self
            .post_form::<DataResponse<VideoInfo>>(endpoints::INFO, file_form(&file).await)
            .await;

        match result {
            Ok(Reply::Accepted(response)) => {
                let info = response.data;
                let display = json!({
                    "文件名": info.file_name,
                    "时长": format_duration(info.duration),
                    "帧率": format!("{} fps", info.frame_rate),
                    "分辨率": format!("{} x {}", info.width, info.height),
                    "文件大小": format_file_size(info.file_size),
                    "格式": info.format.as_deref().map(str::to_uppercase),
                    "总帧数": info.total_frames,
                });
                self.update(|v| ui::show_result(&mut v.video_info_result, display));
                Outcome::Done
            }
            Ok(Reply::Refused(message)) => self.refuse(PanelId::VideoInfoResult, message),
            Err(e) => self.fail(PanelId::VideoInfoResult, format!("获取视频信息失败: {}", e)),
        }
    }

    /// 校验文件、合并参数并进入加载状态
    fn begin_extraction(&self, custom: ExtractionOptions) -> Result<(SelectedFile, ExtractionOptions), Outcome> {
        let (file, form_options) = self.update(|v| (v.video_file.clone(), v.form.options()));
        let Some(file) = file else {
            return Err(self.invalid(PanelId::ExtractResult, NO_FILE_SELECTED));
        };

        self.update(|v| {
            v.show_progress(EXTRACTING);
            ui::show_loading(&mut v.extract_result, "处理中...");
            v.frames.clear();
        });

        Ok((file, custom.or(&form_options)))
    }

    /// 提取视频帧
    pub async fn extract_frames(&self, custom: ExtractionOptions) -> Outcome {
        self.extract_frames_via(FramesEndpoint::FormFields, custom).await
    }

    /// 提取视频帧，参数以 JSON `request` 部分提交
    pub async fn extract_frames_with_request(&self, custom: ExtractionOptions) -> Outcome {
        self.extract_frames_via(FramesEndpoint::JsonRequest, custom).await
    }

    async fn extract_frames_via(&self, endpoint: FramesEndpoint, custom: ExtractionOptions) -> Outcome {
        let (file, options) = match self.begin_extraction(custom) {
            Ok(prepared) => prepared,
            Err(outcome) => return outcome,
        };

        self.logger.info(format!(
            "开始提取帧 - 文件: {}, 参数: {}",
            file.name,
            serde_json::to_string(&options).unwrap_or_default()
        ));

        let form = endpoint.form(&file, &options).await;
        let result = self.post_form::<ExtractionResult>(endpoint.path(), form).await;

        self.update(|v| v.hide_progress());

        match result {
            Ok(Reply::Accepted(data)) => {
                let mut summary = json!({
                    "处理状态": "成功",
                    "提取帧数": data.total_frames_extracted,
                    "处理时间": format!("{} ms", data.processing_time_ms),
                });
                if let Some(info) = &data.video_info {
                    summary["视频信息"] = json!({
                        "文件名": info.file_name,
                        "时长": format_duration(info.duration),
                        "帧率": format!("{} fps", info.frame_rate),
                        "分辨率": format!("{} x {}", info.width, info.height),
                    });
                }
                self.update(|v| ui::show_result(&mut v.extract_result, summary));

                self.display_frames(&data.frames);

                self.logger.success(format!("帧提取完成 - 共提取 {} 帧", data.total_frames_extracted));
                Outcome::Done
            }
            Ok(Reply::Refused(message)) => self.refuse(PanelId::ExtractResult, message),
            Err(e) => self.fail(PanelId::ExtractResult, format!("提取帧失败: {}", e)),
        }
    }

    /// 提取视频帧（仅 Base64 编码）
    pub async fn extract_frames_base64_only(&self, custom: ExtractionOptions) -> Outcome {
        let (file, options) = match self.begin_extraction(custom) {
            Ok((file, options)) => (file, options.without_return_base64()),
            Err(outcome) => return outcome,
        };

        self.logger.info(format!(
            "开始提取帧Base64 - 文件: {}, 参数: {}",
            file.name,
            serde_json::to_string(&options).unwrap_or_default()
        ));

        let form = FramesEndpoint::FormFields.form(&file, &options).await;
        let result = self
            .post_form::<Base64ExtractionResult>(endpoints::EXTRACT_FRAMES_BASE64_ONLY, form)
            .await;

        self.update(|v| v.hide_progress());

        match result {
            Ok(Reply::Accepted(data)) => {
                let summary = json!({
                    "处理状态": "成功",
                    "提取帧数": data.total_frames_extracted,
                    "处理时间": format!("{} ms", data.processing_time_ms),
                    "Base64编码数量": data.base64_frames.len(),
                });
                self.update(|v| ui::show_result(&mut v.extract_result, summary));

                self.display_base64_frames(&data.base64_frames);

                self.logger.success(format!("Base64帧提取完成 - 共提取 {} 帧", data.total_frames_extracted));
                Outcome::Done
            }
            Ok(Reply::Refused(message)) => self.refuse(PanelId::ExtractResult, message),
            Err(e) => self.fail(PanelId::ExtractResult, format!("提取Base64帧失败: {}", e)),
        }
    }

    /// 显示提取的帧
    pub fn display_frames(&self, frames: &[Frame]) {
        self.update(|v| {
            if frames.is_empty() {
                v.frames.show_placeholder("没有提取到帧数据");
                return;
            }

            v.frames.clear();
            for frame in frames {
                v.frames.push(FrameItem {
                    base64_data: frame.base64_data.clone(),
                    alt: format!("Frame {}", frame.frame_number),
                    info: vec![
                        format!("帧号: {}", frame.frame_number),
                        format!("时间: {:.2}s", frame.timestamp_seconds),
                        format!("尺寸: {}x{}", frame.width, frame.height),
                    ],
                    copy_payload: None,
                });
            }
        });

        if !frames.is_empty() {
            self.logger.info(format!("显示了 {} 个帧图像", frames.len()));
        }
    }

    /// 显示 Base64 编码的帧，每帧带复制按钮
    pub fn display_base64_frames(&self, frames: &[String]) {
        self.update(|v| {
            if frames.is_empty() {
                v.frames.show_placeholder("没有提取到Base64帧数据");
                return;
            }

            v.frames.clear();
            for (index, data) in frames.iter().enumerate() {
                v.frames.push(FrameItem {
                    base64_data: Some(data.clone()),
                    alt: format!("Frame {}", index + 1),
                    info: vec![
                        format!("帧序号: {}", index + 1),
                        format!("Base64长度: {} 字符", data.len()),
                        "数据类型: 图片Base64编码".to_string(),
                    ],
                    copy_payload: Some(data.clone()),
                });
            }
        });

        if !frames.is_empty() {
            self.logger.info(format!("显示了 {} 个Base64编码帧", frames.len()));
        }
    }

    /// 复制画廊中第 `number` 帧（从 1 开始）的 Base64 编码
    pub async fn copy_frame(&self, number: usize) -> Outcome {
        let payload = self.update(|v| {
            number
                .checked_sub(1)
                .and_then(|i| v.frames.items().get(i))
                .and_then(|item| item.copy_payload.clone())
        });

        let Some(payload) = payload else {
            let message = format!("第 {} 帧没有可复制的Base64编码", number);
            self.logger.warning(&message);
            return Outcome::Invalid(message);
        };

        match self.write_clipboard(payload).await {
            Ok(()) => {
                self.logger.success(format!("已复制第 {} 帧的Base64编码", number));
                Outcome::Done
            }
            Err(e) => {
                let message = format!("复制失败: {}", e);
                self.logger.error(&message);
                Outcome::Failed(message)
            }
        }
    }

    /// 生成 JSON 格式（每秒一帧）
    pub async fn generate_json_format(&self) -> Outcome {
        let (file, prompt_text) = self.update(|v| (v.json_video_file.clone(), v.prompt_text.trim().to_string()));
        let Some(file) = file else {
            return self.invalid(PanelId::JsonResult, NO_FILE_SELECTED);
        };
        if prompt_text.is_empty() {
            return self.invalid(PanelId::JsonResult, NO_PROMPT_TEXT);
        }

        self.update(|v| {
            ui::show_progress_on(&mut v.json_progress, "正在生成JSON格式，请稍候...");
            ui::show_loading(&mut v.json_result, "处理中...");
            v.json_content.clear();
            v.copy_json_button.visible = false;
        });

        self.logger.info(format!("开始生成JSON格式 - 文件: {}, 提示词: {}", file.name, prompt_text));

        let form = file_form(&file)
            .await
            .map(|form| form.text("promptText", prompt_text.clone()));
        let result = self
            .post_form::<JsonFormatResult>(endpoints::EXTRACT_FRAMES_JSON_FORMAT, form)
            .await;

        self.update(|v| ui::hide_progress(&mut v.json_progress));

        match result {
            Ok(Reply::Accepted(data)) => {
                let summary = json!({
                    "处理状态": "成功",
                    "提取帧数": data.total_frames_extracted,
                    "处理时间": format!("{} ms", data.processing_time_ms),
                    "JSON格式": "已生成",
                });
                let json_string = pretty_json(&data.json_format);

                self.update(|v| {
                    ui::show_result(&mut v.json_result, summary);
                    v.json_content = json_string.clone();
                    v.copy_json_button.visible = true;
                    v.copy_json_button.json_content = Some(json_string);
                });

                self.logger.success(format!("JSON格式生成完成 - 共包含 {} 帧", data.total_frames_extracted));
                Outcome::Done
            }
            Ok(Reply::Refused(message)) => self.refuse(PanelId::JsonResult, message),
            Err(e) => self.fail(PanelId::JsonResult, format!("生成JSON格式失败: {}", e)),
        }
    }

    /// 复制最近生成的 JSON，按钮文字短暂显示为“已复制!”
    pub async fn copy_json_content(&self) -> Outcome {
        let Some(content) = self.update(|v| v.copy_json_button.json_content.clone()) else {
            let message = "没有可复制的JSON内容";
            self.logger.warning(message);
            return Outcome::Invalid(message.to_string());
        };

        if let Err(e) = self.write_clipboard(content).await {
            let message = format!("复制失败: {}", e);
            self.logger.error(&message);
            return Outcome::Failed(message);
        }

        self.logger.success("JSON内容已复制到剪贴板");
        self.update(|v| v.copy_json_button.label = COPIED_LABEL.to_string());

        let view = Arc::clone(&self.view);
        let reset = tokio::spawn(async move {
            tokio::time::sleep(COPY_FEEDBACK_DURATION).await;
            view.lock().unwrap_or_else(|e| e.into_inner()).copy_json_button.label = COPY_BUTTON_LABEL.to_string();
        });
        let previous = self
            .label_reset
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(reset.abort_handle());
        if let Some(previous) = previous {
            previous.abort();
        }

        Outcome::Done
    }

    /// 快速测试1：每5秒提取一帧
    pub async fn quick_test_1(&self) -> Outcome {
        self.logger.info("开始快速测试1: 每5秒提取一帧");
        self.extract_frames(ExtractionOptions::every_five_seconds()).await
    }

    /// 快速测试2：前30秒每2秒一帧
    pub async fn quick_test_2(&self) -> Outcome {
        self.logger.info("开始快速测试2: 前30秒每2秒一帧");
        self.extract_frames(ExtractionOptions::first_thirty_seconds()).await
    }

    /// 快速测试3：提取所有帧
    pub async fn quick_test_3(&self) -> Outcome {
        self.logger.info("开始快速测试3: 提取所有帧");
        self.extract_frames(ExtractionOptions::all_frames()).await
    }
}
