//! HTTP 执行器 - 基础设施层
//!
//! 持有唯一的 HTTP 连接池，只暴露"发请求并归类结果"的能力

use crate::error::{AppError, AppResult, ConfigError, TransportError};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

/// HTTP 执行器
///
/// 职责：
/// - 持有唯一的 `reqwest::Client`
/// - 把网络故障、非 2xx 响应、无法解析的响应体归类为 `AppError`
/// - 不认识 Job / User
#[derive(Clone)]
pub struct HttpExecutor {
    client: Client,
    base_url: String,
}

impl HttpExecutor {
    /// 创建新的 HTTP 执行器
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 在 `prefix` 后追加一个路径段，段内的 `/`、`?`、`#` 等字符会被转义
    fn url_with_segment(&self, prefix: &str, segment: &str) -> AppResult<Url> {
        let invalid = |reason: String| ConfigError::InvalidValue {
            field: "api_base_url".to_string(),
            reason,
        };
        let mut url = Url::parse(&self.url(prefix)).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("{} 不能作为基础地址", self.base_url)))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// GET 请求并反序列化响应
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        let request = self.client.get(self.url(path)).query(query);
        self.send(path, request).await
    }

    /// GET `prefix/{segment}` 并反序列化响应
    pub async fn get_json_by_id<T: DeserializeOwned>(
        &self,
        prefix: &str,
        segment: &str,
    ) -> AppResult<T> {
        let url = self.url_with_segment(prefix, segment)?;
        let path = url.path().to_string();
        let request = self.client.get(url);
        self.send(&path, request).await
    }

    /// 以查询参数携带数据的 POST 请求
    pub async fn post_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        let request = self.client.post(self.url(path)).query(query);
        self.send(path, request).await
    }

    /// multipart 上传
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        form: Form,
    ) -> AppResult<T> {
        let request = self.client.post(self.url(path)).query(query).multipart(form);
        self.send(path, request).await
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> AppResult<T> {
        debug!("请求 {}", path);

        let response = request.send().await.map_err(|e| {
            AppError::Transport(TransportError::RequestFailed {
                endpoint: path.to_string(),
                source: Box::new(e),
            })
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            AppError::Transport(TransportError::RequestFailed {
                endpoint: path.to_string(),
                source: Box::new(e),
            })
        })?;

        if !status.is_success() {
            let detail = extract_detail(&body);
            debug!("{} 返回 {} (detail: {:?})", path, status, detail);
            return Err(AppError::remote(Some(status.as_u16()), detail));
        }

        serde_json::from_slice(&body).map_err(|e| AppError::malformed(path, e.to_string()))
    }
}

/// 从错误响应体中提取 detail
///
/// - 字符串：原样返回
/// - 校验错误列表：拼接各项的 `msg`
/// - 其他情况：None
pub fn extract_detail(body: &[u8]) -> Option<String> {
    let value: JsonValue = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}
