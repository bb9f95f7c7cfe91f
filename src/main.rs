use clap::{Args as ClapArgs, Parser, Subcommand};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use frame_extractor_client::{
    shell, ApiClient, ClientConfig, Clipboard, ConfigLoader, ConfigOverrides, ExtractionOptions,
    Logger, Outcome, Session, SystemClipboard, View, VideoProcessor,
};

/// 视频帧提取客户端 - 调用远程帧提取服务，获取视频信息、提取帧、生成JSON格式
#[derive(Parser, Debug)]
#[command(name = "frame-extractor-client")]
#[command(about = "视频帧提取客户端：健康检查、视频信息、帧提取、JSON格式生成", long_about = None)]
struct Args {
    /// 配置文件路径（可选，支持 .ini 格式）
    /// 优先级：命令行参数 > 环境变量 > 配置文件 > 默认值
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API 服务地址，可通过环境变量 FRAME_CLIENT_BASE_URL 或配置文件设置
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// 日志级别（trace, debug, info, warn, error）
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// 将提取到的帧保存到此目录
    #[arg(long, global = true)]
    frames_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// 帧提取参数，未指定的参数不发送
#[derive(ClapArgs, Debug, Clone)]
struct ExtractArgs {
    /// 提取间隔（秒）
    #[arg(long)]
    interval: Option<u32>,

    /// 开始时间（秒）
    #[arg(long)]
    start: Option<u32>,

    /// 结束时间（秒）
    #[arg(long)]
    end: Option<u32>,

    /// 输出图片格式（jpg / png）
    #[arg(long)]
    format: Option<String>,

    /// 图片质量（1-100）
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// 不返回 Base64 数据
    #[arg(long)]
    no_base64: bool,
}

impl ExtractArgs {
    fn options(&self) -> ExtractionOptions {
        ExtractionOptions {
            interval_seconds: self.interval,
            start_time_seconds: self.start,
            end_time_seconds: self.end,
            output_format: self.format.clone(),
            image_quality: self.quality,
            return_base64: if self.no_base64 { Some(false) } else { None },
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 检查服务健康状态
    Health,
    /// 获取支持的视频和图片格式
    Formats,
    /// 获取视频信息
    Info {
        /// 视频文件路径
        file: PathBuf,
    },
    /// 提取视频帧
    Extract {
        /// 视频文件路径
        file: PathBuf,

        #[command(flatten)]
        options: ExtractArgs,

        /// 只返回 Base64 编码列表
        #[arg(long, conflicts_with = "json_request")]
        base64_only: bool,

        /// 参数以 JSON 请求体提交
        #[arg(long)]
        json_request: bool,
    },
    /// 生成JSON格式（每秒一帧 + 提示词）
    Json {
        /// 视频文件路径
        file: PathBuf,

        /// 提示词
        #[arg(short, long)]
        prompt: String,
    },
    /// 快速测试预设：1 每5秒一帧；2 前30秒每2秒一帧；3 全部帧
    Quick {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=3))]
        preset: u8,

        /// 视频文件路径
        file: PathBuf,
    },
    /// 交互模式
    Shell,
}

fn build_session(config: &ClientConfig) -> Result<Arc<Session>> {
    let logger = Logger::new();
    let api = ApiClient::new(&config.base_url, logger.clone(), config.timeout())?;
    let clipboard: Arc<dyn Clipboard> = match &config.clipboard_command {
        Some(command) => Arc::new(SystemClipboard::with_command(command)?),
        None => Arc::new(SystemClipboard::detect()),
    };
    let processor = VideoProcessor::new(api, View::shared(), logger, clipboard);
    Ok(Session::new(processor))
}

/// 打印页面并按需保存帧，失败的操作返回错误以设置退出码
fn finish(session: &Session, outcome: Outcome, frames_dir: Option<&Path>) -> Result<()> {
    let view = session.processor().snapshot();
    println!("{}", view);

    if let Some(dir) = frames_dir {
        if !view.frames.is_empty() {
            let saved = view.frames.save_to(dir)?;
            tracing::info!("💾 已保存 {} 帧到 {}", saved.len(), dir.display());
        }
    }

    match outcome.message() {
        None => Ok(()),
        Some(message) => Err(anyhow::anyhow!("{}", message)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::load_config(
        args.config.as_deref(),
        ConfigOverrides {
            base_url: args.base_url.clone(),
            frames_dir: args.frames_dir.clone(),
            log_level: args.log_level.clone(),
        },
    )
    .context("加载配置失败")?;

    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .with_target(false)
        .init();

    let session = build_session(&config).context("创建客户端失败")?;
    let processor = session.processor().clone();
    let frames_dir = config.frames_dir.as_deref();

    let outcome = match args.command {
        Commands::Health => processor.check_health().await,
        Commands::Formats => processor.get_supported_formats().await,
        Commands::Info { file } => {
            session.select_video_info_file(&file)?;
            processor.get_video_info().await
        }
        Commands::Extract {
            file,
            options,
            base64_only,
            json_request,
        } => {
            session.select_video_file(&file)?;
            let custom = options.options();
            if base64_only {
                processor.extract_frames_base64_only(custom).await
            } else if json_request {
                processor.extract_frames_with_request(custom).await
            } else {
                processor.extract_frames(custom).await
            }
        }
        Commands::Json { file, prompt } => {
            session.select_json_video_file(&file)?;
            session.set_prompt_text(&prompt);
            processor.generate_json_format().await
        }
        Commands::Quick { preset, file } => {
            session.select_video_file(&file)?;
            match preset {
                1 => processor.quick_test_1().await,
                2 => processor.quick_test_2().await,
                _ => processor.quick_test_3().await,
            }
        }
        Commands::Shell => {
            let startup = session.bootstrap(config.health_check_delay());
            shell::run(Arc::clone(&session)).await?;
            startup.abort();
            return Ok(());
        }
    };

    finish(&session, outcome, frames_dir)
}
