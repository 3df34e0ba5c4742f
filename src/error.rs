use thiserror::Error;

/// 通用兜底提示（远端未给出 detail 时使用）
pub const GENERIC_FAILURE: &str = "请求失败，请稍后重试";

/// 应用程序错误类型
///
/// 超时不是错误：它是轮询的终止结果之一，见 `workflow::PollOutcome::TimedOut`
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入校验错误（立即返回，不重试）
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 传输层错误（网络故障、响应格式错误）
    #[error("传输错误: {0}")]
    Transport(#[from] TransportError),
    /// 远端服务明确报告的失败
    #[error("服务错误: {0}")]
    Remote(#[from] RemoteError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 输入校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 未选择文件
    #[error("未选择音频文件")]
    MissingFile,
    /// 文件内容为空
    #[error("音频文件为空: {filename}")]
    EmptyFile { filename: String },
    /// 用户名或密码为空
    #[error("用户名和密码不能为空")]
    EmptyCredentials,
    /// 未登录
    #[error("当前未登录")]
    NotLoggedIn,
    /// 本地文件无法读取
    #[error("无法读取音频文件 {path}: {reason}")]
    FileUnreadable { path: String, reason: String },
}

/// 传输层错误
#[derive(Debug, Error)]
pub enum TransportError {
    /// 网络请求失败
    #[error("请求 {endpoint} 失败: {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 状态查询类接口返回非成功状态码
    #[error("{endpoint} 返回状态码 {status}{}", .detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default())]
    BadStatus {
        endpoint: String,
        status: u16,
        detail: Option<String>,
    },
    /// 响应体无法解析
    #[error("{endpoint} 响应格式错误: {reason}")]
    MalformedResponse { endpoint: String, reason: String },
}

/// 远端服务报告的失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .detail.as_deref().unwrap_or(GENERIC_FAILURE))]
pub struct RemoteError {
    /// HTTP 状态码（若来自 HTTP 响应）
    pub status: Option<u16>,
    /// 远端给出的 detail 文本
    pub detail: Option<String>,
}

impl RemoteError {
    pub fn new(status: Option<u16>, detail: Option<String>) -> Self {
        Self { status, detail }
    }
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    InvalidValue { field: String, reason: String },
    /// 配置文件读取或解析失败
    #[error("配置文件 {path} 加载失败: {reason}")]
    FileLoadFailed { path: String, reason: String },
}

// ========== 从常见错误类型转换 ==========

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        if err.is_decode() {
            return AppError::Transport(TransportError::MalformedResponse {
                endpoint,
                reason: err.to_string(),
            });
        }
        AppError::Transport(TransportError::RequestFailed {
            endpoint,
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建响应格式错误
    pub fn malformed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Transport(TransportError::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        })
    }

    /// 创建远端错误
    pub fn remote(status: Option<u16>, detail: Option<String>) -> Self {
        AppError::Remote(RemoteError::new(status, detail))
    }

    /// 是否为传输层错误
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }

    /// 面向用户的单行提示
    ///
    /// 远端 detail 原样透出；传输错误没有可展示的 detail，统一使用通用提示
    pub fn user_message(&self) -> String {
        match self {
            AppError::Remote(e) => e.to_string(),
            AppError::Validation(e) => e.to_string(),
            AppError::Transport(_) => GENERIC_FAILURE.to_string(),
            AppError::Config(e) => e.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_message_is_verbatim() {
        let err = AppError::remote(Some(401), Some("Invalid credentials".to_string()));
        assert_eq!(err.user_message(), "Invalid credentials");
    }

    #[test]
    fn test_remote_message_falls_back_to_generic() {
        let err = AppError::remote(Some(500), None);
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_transport_classification() {
        let err = AppError::malformed("/api/result/1", "missing status");
        assert!(err.is_transport());
        assert_eq!(err.user_message(), GENERIC_FAILURE);
        assert!(err.to_string().contains("missing status"));

        let err: AppError = ValidationError::MissingFile.into();
        assert!(!err.is_transport());
    }
}
