use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use crate::session::{Action, Session};

/// 交互模式下的一条命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// 触发一个操作
    Run(Action),
    /// 选择帧提取文件（同步到视频信息文件）
    File(PathBuf),
    InfoFile(PathBuf),
    JsonFile(PathBuf),
    Prompt(String),
    Set { name: String, value: String },
    Show,
    Log,
    Help,
    Quit,
}

pub const HELP: &str = "\
命令:
  file <路径>            选择帧提取视频（同时用于视频信息）
  info-file <路径>       选择视频信息文件
  json-file <路径>       选择JSON格式生成使用的视频
  prompt <文本>          设置提示词
  set <参数> [值]        更新参数：intervalSeconds startTimeSeconds endTimeSeconds
                         outputFormat imageQuality returnBase64（省略值表示清空）
  health | formats | info
  extract | extract-base64 | extract-json
  json | copy | copy-frame <n> | quick <1|2|3>
  show                   显示当前页面
  log                    显示日志
  clear                  清空日志
  help | quit";

impl ShellCommand {
    /// 解析一行输入，空行返回 None
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let required = |what: &str| -> Result<String> {
            if rest.is_empty() {
                anyhow::bail!("命令 {} 缺少参数: {}", name, what);
            }
            Ok(rest.to_string())
        };

        let command = match name {
            "health" => ShellCommand::Run(Action::CheckHealth),
            "formats" => ShellCommand::Run(Action::SupportedFormats),
            "info" => ShellCommand::Run(Action::VideoInfo),
            "extract" => ShellCommand::Run(Action::ExtractFrames),
            "extract-base64" => ShellCommand::Run(Action::ExtractFramesBase64Only),
            "extract-json" => ShellCommand::Run(Action::ExtractFramesWithRequest),
            "json" => ShellCommand::Run(Action::GenerateJsonFormat),
            "copy" => ShellCommand::Run(Action::CopyJson),
            "copy-frame" => {
                let number = required("帧序号")?
                    .parse()
                    .context("帧序号必须是正整数")?;
                ShellCommand::Run(Action::CopyFrame(number))
            }
            "quick" => match required("预设编号")?.as_str() {
                "1" => ShellCommand::Run(Action::QuickTest1),
                "2" => ShellCommand::Run(Action::QuickTest2),
                "3" => ShellCommand::Run(Action::QuickTest3),
                other => anyhow::bail!("未知的快速测试: {}", other),
            },
            "clear" => ShellCommand::Run(Action::ClearLog),
            "file" => ShellCommand::File(PathBuf::from(required("文件路径")?)),
            "info-file" => ShellCommand::InfoFile(PathBuf::from(required("文件路径")?)),
            "json-file" => ShellCommand::JsonFile(PathBuf::from(required("文件路径")?)),
            "prompt" => ShellCommand::Prompt(required("提示词")?),
            "set" => {
                let args = required("参数名")?;
                let (param, value) = match args.split_once(char::is_whitespace) {
                    Some((param, value)) => (param.to_string(), value.trim().to_string()),
                    None => (args, String::new()),
                };
                ShellCommand::Set { name: param, value }
            }
            "show" => ShellCommand::Show,
            "log" => ShellCommand::Log,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => anyhow::bail!("未知命令: {}（输入 help 查看帮助）", other),
        };

        Ok(Some(command))
    }
}

/// 从标准输入读取命令，直到 quit 或输入结束
pub async fn run(session: Arc<Session>) -> Result<()> {
    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("读取输入失败")? {
        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        let result = match command {
            ShellCommand::Run(action) => {
                // 操作在后台执行，结果用 show 查看
                session.dispatch(action);
                Ok(())
            }
            ShellCommand::File(path) => session.select_video_file(path),
            ShellCommand::InfoFile(path) => session.select_video_info_file(path),
            ShellCommand::JsonFile(path) => session.select_json_video_file(path),
            ShellCommand::Prompt(text) => {
                session.set_prompt_text(&text);
                Ok(())
            }
            ShellCommand::Set { name, value } => session.set_param(&name, &value),
            ShellCommand::Show => {
                println!("{}", session.processor().snapshot());
                Ok(())
            }
            ShellCommand::Log => {
                for entry in session.processor().logger().entries() {
                    println!("{:<8}{}", entry.kind.as_str(), entry.line());
                }
                Ok(())
            }
            ShellCommand::Help => {
                println!("{}", HELP);
                Ok(())
            }
            ShellCommand::Quit => break,
        };

        if let Err(e) = result {
            eprintln!("{:#}", e);
        }
    }

    Ok(())
}
