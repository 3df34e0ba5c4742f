//! 轮询状态机
//!
//! 只描述"收到一次查询结果后该怎么走"，不做 I/O、不等待。
//! 等待与取消由 `JobPoller` 负责。

use crate::error::{AppError, AppResult};
use crate::models::{JobPayload, JobStatus, StatusReport};

/// 轮询的终止结果
#[derive(Debug)]
pub enum PollOutcome {
    /// 任务完成
    Done(JobPayload),
    /// 远端报告失败，或最后一次尝试遇到传输错误
    Failed(AppError),
    /// 尝试次数耗尽仍未结束
    TimedOut { attempts: u32 },
    /// 调用方取消
    Cancelled,
}

/// 一次观察后的走向
#[derive(Debug)]
pub enum Transition {
    /// 尚未结束，等待一个间隔后发起第 `attempt + 1` 次查询
    Wait {
        attempt: u32,
        status: JobStatus,
        /// 本次尝试是否因传输错误而无结论
        inconclusive: bool,
    },
    /// 到达终止结果
    Finished(PollOutcome),
}

/// 单个任务的轮询状态机
#[derive(Debug, Clone)]
pub struct PollMachine {
    max_attempts: u32,
    attempts: u32,
    status: JobStatus,
}

impl PollMachine {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            attempts: 0,
            status: JobStatus::Submitted,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// 记录一次查询结果
    ///
    /// 每次调用都消耗一次尝试；传输错误只有在最后一次尝试时才是终止结果
    pub fn observe(&mut self, result: AppResult<StatusReport>) -> Transition {
        debug_assert!(!self.is_finished(), "observe() after terminal status");
        self.attempts += 1;

        match result {
            Ok(StatusReport::Done(payload)) => {
                self.status = JobStatus::Done;
                Transition::Finished(PollOutcome::Done(payload))
            }
            Ok(StatusReport::Failed(reason)) => {
                self.status = JobStatus::Error;
                Transition::Finished(PollOutcome::Failed(AppError::remote(None, reason)))
            }
            Ok(StatusReport::Pending(reported)) => {
                // 后退的状态直接忽略
                if self.status.can_advance_to(reported) && !reported.is_terminal() {
                    self.status = reported;
                }
                self.wait_or_time_out(false)
            }
            Err(err) => {
                if self.budget_exhausted() {
                    self.status = JobStatus::Error;
                    Transition::Finished(PollOutcome::Failed(err))
                } else {
                    self.wait_or_time_out(true)
                }
            }
        }
    }

    fn budget_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    fn wait_or_time_out(&mut self, inconclusive: bool) -> Transition {
        if self.budget_exhausted() {
            self.status = JobStatus::Timeout;
            return Transition::Finished(PollOutcome::TimedOut {
                attempts: self.attempts,
            });
        }
        Transition::Wait {
            attempt: self.attempts,
            status: self.status,
            inconclusive,
        }
    }
}
