/// 后端 API 客户端
///
/// 封装所有与音频问答后端相关的调用逻辑
use crate::clients::{AuthService, HistoryService, JobService};
use crate::config::Config;
use crate::error::{AppError, AppResult, TransportError};
use crate::infrastructure::HttpExecutor;
use crate::models::{AudioFile, Job, JobId, StatusReport, StatusResponse, UserId};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

const LOGIN_PATH: &str = "/api/login/";
const REGISTER_PATH: &str = "/api/register/";
const UPLOAD_PATH: &str = "/api/upload-audio/";
const RESULT_PATH: &str = "/api/result/";
const HISTORY_PATH: &str = "/api/history/";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    user_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    job_id: JobId,
}

/// 后端 API 客户端
#[derive(Clone)]
pub struct BackendClient {
    executor: HttpExecutor,
}

impl BackendClient {
    /// 根据配置创建客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let executor = HttpExecutor::new(&config.api_base_url, config.request_timeout())?;
        Ok(Self { executor })
    }
}

/// 状态类接口只区分"拿到结果"和"传输失败"
fn remote_as_transport(endpoint: &str, err: AppError) -> AppError {
    match err {
        AppError::Remote(remote) => AppError::Transport(TransportError::BadStatus {
            endpoint: endpoint.to_string(),
            status: remote.status.unwrap_or_default(),
            detail: remote.detail,
        }),
        other => other,
    }
}

#[async_trait]
impl AuthService for BackendClient {
    async fn login(&self, username: &str, password: &str) -> AppResult<UserId> {
        let resp: LoginResponse = self
            .executor
            .post_query(LOGIN_PATH, &[("username", username), ("password", password)])
            .await?;
        resp.user_id.ok_or_else(|| AppError::remote(None, None))
    }

    async fn register(&self, username: &str, password: &str) -> AppResult<()> {
        let _: serde_json::Value = self
            .executor
            .post_query(REGISTER_PATH, &[("username", username), ("password", password)])
            .await?;
        Ok(())
    }
}

#[async_trait]
impl JobService for BackendClient {
    async fn submit_audio(&self, user_id: &UserId, file: &AudioFile) -> AppResult<JobId> {
        debug!("上传 {} ({} 字节)", file.filename, file.bytes.len());
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.mime)?;
        let form = Form::new().part("file", part);

        let resp: UploadResponse = self
            .executor
            .post_multipart(UPLOAD_PATH, &[("user_id", user_id.as_str())], form)
            .await?;
        Ok(resp.job_id)
    }

    async fn job_status(&self, job_id: &JobId) -> AppResult<StatusReport> {
        let path = format!("{}{}", RESULT_PATH, job_id);
        let resp: StatusResponse = self
            .executor
            .get_json_by_id(RESULT_PATH, job_id.as_str())
            .await
            .map_err(|e| remote_as_transport(&path, e))?;
        resp.into_report()
            .map_err(|reason| AppError::malformed(path, reason))
    }
}

#[async_trait]
impl HistoryService for BackendClient {
    async fn list_jobs(&self, user_id: &UserId) -> AppResult<Vec<Job>> {
        self.executor
            .get_json(HISTORY_PATH, &[("user_id", user_id.as_str())])
            .await
            .map_err(|e| remote_as_transport(HISTORY_PATH, e))
    }
}
