//! 外部服务接口
//!
//! 认证、任务、历史三个远端能力各自是一个 trait，
//! `BackendClient` 是基于 HTTP 的实现，测试中用内存假实现替换

pub mod backend_client;
#[cfg(test)]
pub mod testing;

use crate::error::AppResult;
use crate::models::{AudioFile, Job, JobId, StatusReport, UserId};
use async_trait::async_trait;

pub use backend_client::BackendClient;

/// 认证服务
#[async_trait]
pub trait AuthService: Send + Sync {
    /// 登录，成功返回用户标识
    async fn login(&self, username: &str, password: &str) -> AppResult<UserId>;

    /// 注册（不会自动登录）
    async fn register(&self, username: &str, password: &str) -> AppResult<()>;
}

/// 任务服务
#[async_trait]
pub trait JobService: Send + Sync {
    /// 上传音频，返回任务标识
    async fn submit_audio(&self, user_id: &UserId, file: &AudioFile) -> AppResult<JobId>;

    /// 查询任务状态
    ///
    /// 任何失败都应归类为传输错误，由轮询器计入尝试次数
    async fn job_status(&self, job_id: &JobId) -> AppResult<StatusReport>;
}

/// 历史服务
#[async_trait]
pub trait HistoryService: Send + Sync {
    /// 获取用户的任务列表（顺序由远端决定）
    async fn list_jobs(&self, user_id: &UserId) -> AppResult<Vec<Job>>;
}
