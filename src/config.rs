use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 配置文件路径的环境变量名
pub const CONFIG_PATH_ENV: &str = "AUDIO_QA_CONFIG";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 后端服务地址
    pub api_base_url: String,
    /// 两次状态查询之间的间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 状态查询次数上限
    pub max_poll_attempts: u32,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 命令行驱动使用 ---
    pub username: Option<String>,
    pub password: Option<String>,
    pub audio_file: Option<String>,
    /// 登录前是否先注册
    pub register_first: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            poll_interval_ms: 2000,
            max_poll_attempts: 60,
            request_timeout_secs: 30,
            verbose_logging: false,
            username: None,
            password: None,
            audio_file: None,
            register_first: false,
        }
    }
}

impl Config {
    /// 先读取配置文件（若设置了 `AUDIO_QA_CONFIG`），再用环境变量覆盖
    pub fn load() -> AppResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// 同 `load`，环境变量通过 `lookup` 读取
    pub fn load_with<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::from_toml_file(Path::new(&path))?,
            None => Self::default(),
        };
        let config = base.overlay(&lookup);
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载配置
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileLoadFailed {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        parse_toml(&content, &display)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        parse_toml(content, "<inline>")
    }

    /// 用环境变量覆盖已有的值，解析失败的值保持不变
    fn overlay<F>(self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_base_url: lookup("API_BASE_URL").unwrap_or(self.api_base_url),
            poll_interval_ms: parsed(lookup, "POLL_INTERVAL_MS").unwrap_or(self.poll_interval_ms),
            max_poll_attempts: parsed(lookup, "MAX_POLL_ATTEMPTS").unwrap_or(self.max_poll_attempts),
            request_timeout_secs: parsed(lookup, "REQUEST_TIMEOUT_SECS")
                .unwrap_or(self.request_timeout_secs),
            verbose_logging: parsed(lookup, "VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            username: lookup("AUDIO_QA_USERNAME").or(self.username),
            password: lookup("AUDIO_QA_PASSWORD").or(self.password),
            audio_file: lookup("AUDIO_FILE").or(self.audio_file),
            register_first: parsed(lookup, "REGISTER_FIRST").unwrap_or(self.register_first),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> AppResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(invalid("api_base_url", "不能为空"));
        }
        if self.poll_interval_ms == 0 {
            return Err(invalid("poll_interval_ms", "必须大于 0"));
        }
        if self.max_poll_attempts == 0 {
            return Err(invalid("max_poll_attempts", "必须大于 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "必须大于 0"));
        }
        Ok(())
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_poll_attempts,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn parse_toml(content: &str, path: &str) -> AppResult<Config> {
    let config: Config = toml::from_str(content).map_err(|e| ConfigError::FileLoadFailed {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    Ok(config)
}

fn invalid(field: &str, reason: &str) -> crate::error::AppError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// 轮询参数
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_attempts: 60,
        }
    }
}
