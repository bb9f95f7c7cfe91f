use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::api_client::DEFAULT_API_BASE_URL;

const SECTION: &str = "frame_client";
const DEFAULT_HEALTH_CHECK_DELAY_MS: u64 = 500;

/// 客户端配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API 服务地址
    pub base_url: String,
    /// 请求超时（秒），未设置时不限制
    pub timeout_secs: Option<u64>,
    /// 帧图片输出目录（可选）
    pub frames_dir: Option<PathBuf>,
    /// 剪贴板命令（可选，未设置时按平台选择）
    pub clipboard_command: Option<String>,
    /// 启动后自动健康检查的延迟（毫秒）
    pub health_check_delay_ms: u64,
    /// 日志级别（trace, debug, info, warn, error）
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: None,
            frames_dir: None,
            clipboard_command: None,
            health_check_delay_ms: DEFAULT_HEALTH_CHECK_DELAY_MS,
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn health_check_delay(&self) -> Duration {
        Duration::from_millis(self.health_check_delay_ms)
    }

    /// tracing 日志级别，无法识别时使用 INFO
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

/// 命令行中可覆盖的配置项
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub frames_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// 单一来源读到的配置（未设置的为 None）
#[derive(Debug, Clone, Default)]
struct PartialConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    frames_dir: Option<PathBuf>,
    clipboard_command: Option<String>,
    health_check_delay_ms: Option<u64>,
    log_level: Option<String>,
}

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从多个源加载配置，优先级：命令行参数 > 环境变量 > 配置文件 > 默认值
    pub fn load_config(config_file: Option<&Path>, overrides: ConfigOverrides) -> Result<ClientConfig> {
        // 1. 指定的配置文件必须可读；未指定时尝试默认位置
        let file_config = match config_file {
            Some(config_path) => Self::load_from_file(config_path)?,
            None => Self::load_from_default_locations().unwrap_or_default(),
        };

        // 2. 环境变量
        let env_config = Self::load_from_env();

        Ok(Self::merge(overrides, env_config, file_config))
    }

    fn merge(overrides: ConfigOverrides, env_config: PartialConfig, file_config: PartialConfig) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            base_url: overrides
                .base_url
                .or(env_config.base_url)
                .or(file_config.base_url)
                .unwrap_or(defaults.base_url),
            timeout_secs: env_config.timeout_secs.or(file_config.timeout_secs),
            frames_dir: overrides
                .frames_dir
                .or(env_config.frames_dir)
                .or(file_config.frames_dir),
            clipboard_command: env_config.clipboard_command.or(file_config.clipboard_command),
            health_check_delay_ms: env_config
                .health_check_delay_ms
                .or(file_config.health_check_delay_ms)
                .unwrap_or(defaults.health_check_delay_ms),
            log_level: overrides
                .log_level
                .or(env_config.log_level)
                .or(file_config.log_level)
                .unwrap_or(defaults.log_level),
        }
    }

    fn load_from_env() -> PartialConfig {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.is_empty());
        PartialConfig {
            base_url: non_empty("FRAME_CLIENT_BASE_URL"),
            timeout_secs: non_empty("FRAME_CLIENT_TIMEOUT_SECS").and_then(|v| v.parse().ok()),
            frames_dir: non_empty("FRAME_CLIENT_FRAMES_DIR").map(PathBuf::from),
            clipboard_command: non_empty("FRAME_CLIENT_CLIPBOARD"),
            health_check_delay_ms: non_empty("FRAME_CLIENT_HEALTH_DELAY_MS").and_then(|v| v.parse().ok()),
            log_level: non_empty("LOG_LEVEL"),
        }
    }

    /// 从INI配置文件加载
    fn load_from_file(config_path: &Path) -> Result<PartialConfig> {
        if !config_path.exists() {
            return Err(anyhow::anyhow!("配置文件不存在: {}", config_path.display()));
        }

        let mut config_parser = configparser::ini::Ini::new();
        config_parser
            .load(config_path)
            .map_err(|e| anyhow::anyhow!("读取配置文件失败: {}: {}", config_path.display(), e))?;

        // 优先 [frame_client] 节，其次 [DEFAULT] 节
        let get = |key: &str| {
            config_parser
                .get(SECTION, key)
                .or_else(|| config_parser.get("DEFAULT", key))
                .filter(|v| !v.is_empty())
        };

        Ok(PartialConfig {
            base_url: get("base_url"),
            timeout_secs: get("timeout_secs").and_then(|v| v.parse().ok()),
            frames_dir: get("frames_dir").map(PathBuf::from),
            clipboard_command: get("clipboard_command"),
            health_check_delay_ms: get("health_check_delay_ms").and_then(|v| v.parse().ok()),
            log_level: get("log_level"),
        })
    }

    /// 从默认位置加载配置文件
    fn load_from_default_locations() -> Result<PartialConfig> {
        let mut candidates = vec![
            PathBuf::from("frame-client.ini"),
            PathBuf::from(".frame-client.ini"),
        ];
        if let Some(home) = env::var_os("HOME") {
            candidates.push(PathBuf::from(home).join(".frame-client.ini"));
        }
        candidates.push(PathBuf::from("/etc/frame-client.ini"));

        for candidate in candidates {
            if candidate.exists() {
                return Self::load_from_file(&candidate);
            }
        }

        Err(anyhow::anyhow!("未找到配置文件"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_ini(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame-client.ini");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_from_file() {
        let (_dir, path) = write_ini(
            "[frame_client]\nbase_url = http://localhost:8080/api\ntimeout_secs = 30\nframes_dir = ./frames\nhealth_check_delay_ms = 0\n",
        );
        let partial = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(partial.base_url.as_deref(), Some("http://localhost:8080/api"));
        assert_eq!(partial.timeout_secs, Some(30));
        assert_eq!(partial.frames_dir, Some(PathBuf::from("./frames")));
        assert_eq!(partial.health_check_delay_ms, Some(0));
        assert_eq!(partial.log_level, None);
    }

    #[test]
    fn test_merge_priority() {
        let overrides = ConfigOverrides {
            base_url: Some("http://cli/api".to_string()),
            ..ConfigOverrides::default()
        };
        let env_config = PartialConfig {
            base_url: Some("http://env/api".to_string()),
            log_level: Some("debug".to_string()),
            ..PartialConfig::default()
        };
        let file_config = PartialConfig {
            log_level: Some("warn".to_string()),
            timeout_secs: Some(10),
            ..PartialConfig::default()
        };

        let config = ConfigLoader::merge(overrides, env_config, file_config);
        assert_eq!(config.base_url, "http://cli/api");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.health_check_delay(), Duration::from_millis(500));
        assert_eq!(config.tracing_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_defaults() {
        let config = ConfigLoader::merge(ConfigOverrides::default(), PartialConfig::default(), PartialConfig::default());
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = ConfigLoader::load_config(Some(Path::new("/nonexistent/frame-client.ini")), ConfigOverrides::default());
        assert!(result.is_err());
    }
}
