use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use crate::gallery::Gallery;
use crate::options::ExtractionOptions;
use crate::ui::{self, Panel, Progress};

/// 用户选择的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
    /// 文件大小（字节）
    pub size: u64,
}

impl SelectedFile {
    /// 读取文件元数据，文件必须存在
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("无法读取文件: {}", path.display()))?;
        if !metadata.is_file() {
            anyhow::bail!("不是文件: {}", path.display());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string());

        Ok(Self {
            name,
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }
}

/// 图片质量的有效范围
pub const IMAGE_QUALITY_RANGE: std::ops::RangeInclusive<u8> = 1..=100;

/// 提取参数的表单控件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormControls {
    pub interval_seconds: Option<u32>,
    pub start_time_seconds: Option<u32>,
    pub end_time_seconds: Option<u32>,
    pub output_format: String,
    pub image_quality: Option<u8>,
    /// 复选框，始终有值
    pub return_base64: bool,
}

impl Default for FormControls {
    fn default() -> Self {
        Self {
            interval_seconds: None,
            start_time_seconds: Some(0),
            end_time_seconds: None,
            output_format: "jpg".to_string(),
            image_quality: Some(85),
            return_base64: true,
        }
    }
}

impl FormControls {
    /// 表单当前值对应的提取参数
    pub fn options(&self) -> ExtractionOptions {
        ExtractionOptions {
            interval_seconds: self.interval_seconds,
            start_time_seconds: self.start_time_seconds,
            end_time_seconds: self.end_time_seconds,
            output_format: Some(self.output_format.clone()).filter(|f| !f.is_empty()),
            image_quality: self.image_quality,
            return_base64: Some(self.return_base64),
        }
    }

    /// 按控件名更新，空字符串表示清空
    ///
    /// 返回更新后用于日志显示的值
    pub fn set(&mut self, name: &str, value: &str) -> Result<String> {
        let value = value.trim();
        match name {
            "intervalSeconds" => self.interval_seconds = parse_optional(name, value)?,
            "startTimeSeconds" => self.start_time_seconds = parse_optional(name, value)?,
            "endTimeSeconds" => self.end_time_seconds = parse_optional(name, value)?,
            "outputFormat" => self.output_format = value.to_string(),
            "imageQuality" => {
                let quality: Option<u8> = parse_optional(name, value)?;
                if quality.is_some_and(|q| !IMAGE_QUALITY_RANGE.contains(&q)) {
                    anyhow::bail!("图片质量必须在 1-100 之间: {}", value);
                }
                self.image_quality = quality;
            }
            "returnBase64" => {
                self.return_base64 = match value {
                    "true" | "1" | "on" | "yes" => true,
                    "false" | "0" | "off" | "no" => false,
                    _ => anyhow::bail!("无效的参数值: {} = {}", name, value),
                }
            }
            _ => anyhow::bail!("未知参数: {}", name),
        }
        Ok(value.to_string())
    }
}

fn parse_optional<T: std::str::FromStr>(name: &str, value: &str) -> Result<Option<T>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| anyhow::anyhow!("无效的参数值: {} = {}", name, value))
}

/// JSON 复制按钮
#[derive(Debug, Clone)]
pub struct CopyButton {
    pub label: String,
    pub visible: bool,
    /// 最近一次生成的 JSON 文本
    pub json_content: Option<String>,
}

pub const COPY_BUTTON_LABEL: &str = "复制JSON";

impl Default for CopyButton {
    fn default() -> Self {
        Self {
            label: COPY_BUTTON_LABEL.to_string(),
            visible: false,
            json_content: None,
        }
    }
}

/// 页面视图：输入控件与各显示区域
///
/// 显式构造后注入到 `VideoProcessor`，不依赖全局查找。
#[derive(Debug, Clone, Default)]
pub struct View {
    // 输入
    pub video_info_file: Option<SelectedFile>,
    pub video_file: Option<SelectedFile>,
    pub json_video_file: Option<SelectedFile>,
    pub prompt_text: String,
    pub form: FormControls,

    // 显示区域
    pub health_status: Panel,
    pub supported_formats: Panel,
    pub video_info_result: Panel,
    pub extract_result: Panel,
    pub extract_progress: Progress,
    pub frames: Gallery,
    pub json_result: Panel,
    pub json_progress: Progress,
    pub json_content: String,
    pub copy_json_button: CopyButton,
}

pub type SharedView = Arc<Mutex<View>>;

/// 结果显示区域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelId {
    HealthStatus,
    SupportedFormats,
    VideoInfoResult,
    ExtractResult,
    JsonResult,
}

impl View {
    pub fn shared() -> SharedView {
        Arc::new(Mutex::new(View::default()))
    }

    pub fn panel(&self, id: PanelId) -> &Panel {
        match id {
            PanelId::HealthStatus => &self.health_status,
            PanelId::SupportedFormats => &self.supported_formats,
            PanelId::VideoInfoResult => &self.video_info_result,
            PanelId::ExtractResult => &self.extract_result,
            PanelId::JsonResult => &self.json_result,
        }
    }

    pub fn panel_mut(&mut self, id: PanelId) -> &mut Panel {
        match id {
            PanelId::HealthStatus => &mut self.health_status,
            PanelId::SupportedFormats => &mut self.supported_formats,
            PanelId::VideoInfoResult => &mut self.video_info_result,
            PanelId::ExtractResult => &mut self.extract_result,
            PanelId::JsonResult => &mut self.json_result,
        }
    }

    /// 显示帧提取进度
    pub fn show_progress(&mut self, message: &str) {
        ui::show_progress_on(&mut self.extract_progress, message);
    }

    /// 隐藏帧提取进度
    pub fn hide_progress(&mut self) {
        ui::hide_progress(&mut self.extract_progress);
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, panel: &Panel) -> fmt::Result {
    if panel.text().is_empty() {
        return Ok(());
    }
    writeln!(f, "━━ {} ━━", title)?;
    writeln!(f, "{}", panel)
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_section(f, "服务状态", &self.health_status)?;
        write_section(f, "支持格式", &self.supported_formats)?;
        write_section(f, "视频信息", &self.video_info_result)?;
        if self.extract_progress.visible {
            writeln!(f, "⏳ {}", self.extract_progress.message)?;
        }
        write_section(f, "帧提取结果", &self.extract_result)?;
        if !self.frames.is_empty() || self.frames.placeholder().is_some() {
            writeln!(f, "━━ 帧画廊 ━━")?;
            write!(f, "{}", self.frames)?;
        }
        if self.json_progress.visible {
            writeln!(f, "⏳ {}", self.json_progress.message)?;
        }
        write_section(f, "JSON格式", &self.json_result)?;
        if !self.json_content.is_empty() {
            writeln!(f, "{}", self.json_content)?;
        }
        if self.copy_json_button.visible {
            writeln!(f, "[{}]", self.copy_json_button.label)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_set_and_clear() {
        let mut form = FormControls::default();
        assert_eq!(form.set("intervalSeconds", "5").unwrap(), "5");
        assert_eq!(form.interval_seconds, Some(5));
        form.set("endTimeSeconds", "").unwrap();
        assert_eq!(form.end_time_seconds, None);
        form.set("returnBase64", "false").unwrap();
        assert!(!form.return_base64);

        assert!(form.set("imageQuality", "abc").is_err());
        assert!(form.set("unknown", "1").is_err());
    }

    #[test]
    fn test_image_quality_range() {
        let mut form = FormControls::default();
        assert!(form.set("imageQuality", "0").is_err());
        assert!(form.set("imageQuality", "101").is_err());
        assert!(form.set("imageQuality", "200").is_err());
        assert_eq!(form.image_quality, Some(85));

        form.set("imageQuality", "100").unwrap();
        assert_eq!(form.image_quality, Some(100));
        form.set("imageQuality", "1").unwrap();
        assert_eq!(form.image_quality, Some(1));
        form.set("imageQuality", "").unwrap();
        assert_eq!(form.image_quality, None);
    }

    #[test]
    fn test_form_options_always_carry_checkbox() {
        let mut form = FormControls::default();
        form.output_format.clear();
        let options = form.options();
        assert_eq!(options.return_base64, Some(true));
        assert_eq!(options.output_format, None);
        assert_eq!(options.end_time_seconds, None);
    }

    #[test]
    fn test_selected_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let file = SelectedFile::open(&path).unwrap();
        assert_eq!(file.name, "clip.mp4");
        assert_eq!(file.size, 2048);
        assert!(SelectedFile::open(dir.path()).is_err());
        assert!(SelectedFile::open(dir.path().join("missing.mp4")).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_selected_file_non_utf8_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OsStr::from_bytes(b"clip-\xff.mp4"));
        std::fs::write(&path, b"fake video").unwrap();

        let file = SelectedFile::open(&path).unwrap();
        assert_eq!(file.name, "clip-\u{fffd}.mp4");
    }

    #[test]
    fn test_default_progress_target() {
        let mut view = View::default();
        view.show_progress("正在提取视频帧，请稍候...");
        assert!(view.extract_progress.visible);
        assert!(!view.json_progress.visible);
        view.hide_progress();
        assert!(!view.extract_progress.visible);
    }
}
