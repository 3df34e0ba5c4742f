//! 历史同步 - 业务能力层
//!
//! 拉取用户的任务列表并整体替换本地副本

use crate::clients::HistoryService;
use crate::error::AppResult;
use crate::models::{Job, UserId};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// 历史同步器
///
/// 列表顺序保持远端返回的顺序，不做重新排序
pub struct HistorySync<H: HistoryService> {
    service: Arc<H>,
    jobs: Vec<Job>,
    stale: bool,
    last_error: Option<String>,
    last_synced_at: Option<DateTime<Utc>>,
}

impl<H: HistoryService> HistorySync<H> {
    pub fn new(service: Arc<H>) -> Self {
        Self {
            service,
            jobs: Vec::new(),
            stale: false,
            last_error: None,
            last_synced_at: None,
        }
    }

    /// 刷新列表
    ///
    /// 失败时保留旧列表并标记为过期
    pub async fn refresh(&mut self, user_id: &UserId) -> AppResult<&[Job]> {
        match self.service.list_jobs(user_id).await {
            Ok(jobs) => {
                info!("✓ 已同步 {} 条历史任务", jobs.len());
                self.jobs = jobs;
                self.stale = false;
                self.last_error = None;
                self.last_synced_at = Some(Utc::now());
                Ok(&self.jobs)
            }
            Err(e) => {
                warn!("⚠️ 历史任务同步失败，保留旧数据: {}", e);
                self.stale = true;
                self.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// 最近一次刷新失败后为 true
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }
}
