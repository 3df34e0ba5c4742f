use crate::models::de;
use crate::models::qa::{Answer, Question};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// 任务标识（后端生成，对客户端不透明）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(#[serde(deserialize_with = "de::id")] String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 任务状态
///
/// 只能沿 `submitted → processing → {done | error | timeout}` 前进
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Submitted,
    Processing,
    Done,
    Error,
    Timeout,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error | JobStatus::Timeout)
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Submitted => 0,
            JobStatus::Processing => 1,
            JobStatus::Done | JobStatus::Error | JobStatus::Timeout => 2,
        }
    }

    /// 是否允许从当前状态转到 `next`
    ///
    /// 终止状态不可再变；非终止状态不能后退，停留在原状态视为允许
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        !self.is_terminal() && next.rank() >= self.rank()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobStatus::Submitted => "submitted",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
            JobStatus::Timeout => "timeout",
        };
        f.write_str(label)
    }
}

/// 一次音频处理任务
///
/// 同时用于上传后的本地跟踪和历史列表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub filename: String,
    pub status: JobStatus,
    #[serde(deserialize_with = "de::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "de::optional_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// 上传被后端接受时创建
    pub fn submitted(job_id: JobId, filename: impl Into<String>) -> Self {
        Self {
            job_id,
            filename: filename.into(),
            status: JobStatus::Submitted,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// 推进状态，返回是否生效
    ///
    /// 进入终止状态时记录完成时间
    pub fn advance(&mut self, next: JobStatus) -> bool {
        if !self.status.can_advance_to(next) {
            debug!("[任务 {}] 忽略状态回退 {} → {}", self.job_id, self.status, next);
            return false;
        }
        self.status = next;
        if next.is_terminal() && self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
        true
    }
}

// ========== 状态查询响应 ==========

/// 远端可能返回的状态（不含客户端自己判定的 timeout）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    Submitted,
    Processing,
    Done,
    Error,
}

/// `GET /api/result/{job_id}` 的原始响应
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: RemoteStatus,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
    #[serde(default)]
    pub answers: Option<Vec<Answer>>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// 任务完成时的载荷
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobPayload {
    pub transcript: String,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
}

/// 单次状态查询的结论
#[derive(Debug, Clone, PartialEq)]
pub enum StatusReport {
    /// 尚未结束（submitted / processing）
    Pending(JobStatus),
    /// 已完成
    Done(JobPayload),
    /// 远端报告失败，附带原因（若有）
    Failed(Option<String>),
}

impl StatusResponse {
    /// 转换为状态结论
    ///
    /// 问题列表和答案列表必须同时出现或同时缺失，只出现一个视为格式错误
    pub fn into_report(self) -> Result<StatusReport, String> {
        match self.status {
            RemoteStatus::Submitted => Ok(StatusReport::Pending(JobStatus::Submitted)),
            RemoteStatus::Processing => Ok(StatusReport::Pending(JobStatus::Processing)),
            RemoteStatus::Error => Ok(StatusReport::Failed(self.detail.or(self.error))),
            RemoteStatus::Done => {
                let (questions, answers) = match (self.questions, self.answers) {
                    (Some(q), Some(a)) => (q, a),
                    (None, None) => (Vec::new(), Vec::new()),
                    (Some(_), None) => return Err("done 响应缺少 answers".to_string()),
                    (None, Some(_)) => return Err("done 响应缺少 questions".to_string()),
                };
                Ok(StatusReport::Done(JobPayload {
                    transcript: self.transcript.unwrap_or_default(),
                    questions,
                    answers,
                }))
            }
        }
    }
}
