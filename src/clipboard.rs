use anyhow::{Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Mutex;

/// 剪贴板写入
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// 系统剪贴板：把文本通过 stdin 交给平台剪贴板工具
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    program: String,
    args: Vec<String>,
}

impl SystemClipboard {
    /// 使用自定义命令，例如 `xclip -selection clipboard`
    pub fn with_command(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().context("剪贴板命令为空")?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// 按平台选择默认工具
    pub fn detect() -> Self {
        let (program, args): (&str, &[&str]) = if cfg!(target_os = "macos") {
            ("pbcopy", &[])
        } else if cfg!(windows) {
            ("clip", &[])
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            ("wl-copy", &[])
        } else {
            ("xclip", &["-selection", "clipboard"])
        };

        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("无法启动剪贴板工具: {}", self.program))?;

        child
            .stdin
            .take()
            .context("无法打开剪贴板工具的标准输入")?
            .write_all(text.as_bytes())
            .context("写入剪贴板失败")?;

        let status = child.wait().context("等待剪贴板工具退出失败")?;
        if !status.success() {
            anyhow::bail!("剪贴板工具执行失败: {} ({})", self.program, status);
        }
        Ok(())
    }
}

/// 内存剪贴板，保存最近一次写入的内容
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        *self.contents.lock().unwrap_or_else(|e| e.into_inner()) = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard() {
        let clipboard = MemoryClipboard::new();
        assert_eq!(clipboard.contents(), None);
        clipboard.write_text("{\"content\": []}").unwrap();
        assert_eq!(clipboard.contents().as_deref(), Some("{\"content\": []}"));
    }

    #[test]
    fn test_custom_command_parsing() {
        let clipboard = SystemClipboard::with_command("xclip -selection clipboard").unwrap();
        assert_eq!(clipboard.program, "xclip");
        assert_eq!(clipboard.args, vec!["-selection", "clipboard"]);
        assert!(SystemClipboard::with_command("   ").is_err());
    }

    #[test]
    fn test_missing_tool_fails() {
        let clipboard = SystemClipboard::with_command("definitely-not-a-clipboard-tool-xyz").unwrap();
        assert!(clipboard.write_text("abc").is_err());
    }
}
