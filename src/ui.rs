use serde_json::Value;
use std::fmt;

/// 显示区域的样式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// `status`
    Neutral,
    /// `status success`
    Success,
    /// `status error`
    Error,
    /// `info`
    Info,
    /// `result`
    Result,
}

impl StatusClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusClass::Neutral => "status",
            StatusClass::Success => "status success",
            StatusClass::Error => "status error",
            StatusClass::Info => "info",
            StatusClass::Result => "result",
        }
    }
}

/// 显示区域的内容
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PanelContent {
    #[default]
    Empty,
    /// 加载动画 + 文本
    Loading(String),
    Text(String),
    /// 格式化输出的 JSON
    Json(Value),
}

/// 一个结果显示区域
#[derive(Debug, Clone, Default)]
pub struct Panel {
    pub content: PanelContent,
    pub class: Option<StatusClass>,
}

impl Panel {
    /// 面板中显示的文本
    pub fn text(&self) -> String {
        match &self.content {
            PanelContent::Empty => String::new(),
            PanelContent::Loading(text) | PanelContent::Text(text) => text.clone(),
            PanelContent::Json(value) => pretty_json(value),
        }
    }

    pub fn is_error(&self) -> bool {
        self.class == Some(StatusClass::Error)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.content, PanelContent::Loading(_))
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.class {
            Some(StatusClass::Success) => "✅ ",
            Some(StatusClass::Error) => "❌ ",
            _ => "",
        };
        match &self.content {
            PanelContent::Empty => Ok(()),
            PanelContent::Loading(text) => write!(f, "⏳ {}", text),
            _ => write!(f, "{}{}", marker, self.text()),
        }
    }
}

/// 进度提示
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub visible: bool,
    pub message: String,
}

pub fn show_loading(panel: &mut Panel, text: &str) {
    panel.content = PanelContent::Loading(text.to_string());
    panel.class = Some(StatusClass::Neutral);
}

pub fn show_success(panel: &mut Panel, message: impl Into<String>) {
    panel.content = PanelContent::Text(message.into());
    panel.class = Some(StatusClass::Success);
}

pub fn show_error(panel: &mut Panel, message: impl Into<String>) {
    panel.content = PanelContent::Text(message.into());
    panel.class = Some(StatusClass::Error);
}

/// 结构化数据格式化为 JSON，字符串按纯文本显示
pub fn show_info(panel: &mut Panel, data: Value) {
    panel.content = into_content(data);
    panel.class = Some(StatusClass::Info);
}

/// 同 `show_info`，仅样式不同
pub fn show_result(panel: &mut Panel, data: Value) {
    panel.content = into_content(data);
    panel.class = Some(StatusClass::Result);
}

fn into_content(data: Value) -> PanelContent {
    match data {
        Value::String(text) => PanelContent::Text(text),
        other => PanelContent::Json(other),
    }
}

pub fn show_progress_on(progress: &mut Progress, message: &str) {
    progress.message = message.to_string();
    progress.visible = true;
}

pub fn hide_progress(progress: &mut Progress) {
    progress.visible = false;
}

/// 两空格缩进的 JSON 文本
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// 字节数转为可读大小，最多保留两位小数
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    while unit + 1 < UNITS.len() && bytes >= 1024u64.pow(unit as u32 + 1) {
        unit += 1;
    }

    let value = bytes as f64 / 1024f64.powi(unit as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// 毫秒转为 `H:MM:SS`（有小时）或 `M:SS`
pub fn format_duration(milliseconds: u64) -> String {
    let seconds = milliseconds / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes % 60, seconds % 60)
    } else {
        format!("{}:{:02}", minutes, seconds % 60)
    }
}
