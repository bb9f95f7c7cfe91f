use std::sync::{Arc, Mutex, MutexGuard};
use chrono::Local;
use serde::Serialize;
use tracing::{error, info, warn};

/// 日志条目类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Success,
    Error,
    Warning,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Success => "success",
            LogKind::Error => "error",
            LogKind::Warning => "warning",
        }
    }
}

/// 日志面板中的一条记录
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// 本地时间（HH:MM:SS）
    pub timestamp: String,
    pub kind: LogKind,
    pub message: String,
}

impl LogEntry {
    /// 面板中显示的文本：`[时间] 消息`
    pub fn line(&self) -> String {
        format!("[{}] {}", self.timestamp, self.message)
    }
}

/// 日志面板
///
/// 只追加，可整体清空。克隆后共享同一份条目列表，每条记录同时转发到 tracing。
#[derive(Debug, Clone, Default)]
pub struct Logger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn log(&self, message: impl Into<String>, kind: LogKind) {
        let message = message.into();
        match kind {
            LogKind::Info => info!("{}", message),
            LogKind::Success => info!("✅ {}", message),
            LogKind::Warning => warn!("⚠️ {}", message),
            LogKind::Error => error!("❌ {}", message),
        }

        let entry = LogEntry {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            kind,
            message,
        };
        self.lock().push(entry);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(message, LogKind::Info);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(message, LogKind::Success);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(message, LogKind::Error);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(message, LogKind::Warning);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// 当前所有条目的快照
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// 最新一条（面板自动滚动到的位置）
    pub fn latest(&self) -> Option<LogEntry> {
        self.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 是否存在包含指定文本的条目
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|e| e.message.contains(needle))
    }
}
