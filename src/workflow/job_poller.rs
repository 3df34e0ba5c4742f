//! 任务轮询器 - 流程层
//!
//! 把 `PollMachine` 放到真实的时间线上：查询、等待、再查询，直到终止或被取消。
//!
//! 挂起点只有两处：等待状态查询的响应，以及两次查询之间的固定间隔。
//! 取消只在间隔等待处生效；正在进行的查询允许完成，但其结果会被丢弃。

use crate::clients::JobService;
use crate::config::PollSettings;
use crate::models::{JobId, JobStatus};
use crate::workflow::poll_machine::{PollMachine, PollOutcome, Transition};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 每次非终止查询后的进度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollProgress {
    pub attempt: u32,
    pub max_attempts: u32,
    pub status: JobStatus,
}

/// 任务轮询器
pub struct JobPoller<S: JobService> {
    service: Arc<S>,
    settings: PollSettings,
}

impl<S: JobService> JobPoller<S> {
    pub fn new(service: Arc<S>, settings: PollSettings) -> Self {
        Self { service, settings }
    }

    /// 轮询直到终止或取消
    pub async fn poll(&self, job_id: &JobId, cancel: &CancellationToken) -> PollOutcome {
        self.poll_with_progress(job_id, cancel, |_| {}).await
    }

    /// 轮询直到终止或取消，每次非终止查询后回调 `on_progress`
    pub async fn poll_with_progress<F>(
        &self,
        job_id: &JobId,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> PollOutcome
    where
        F: FnMut(PollProgress) + Send,
    {
        let mut machine = PollMachine::new(self.settings.max_attempts);

        loop {
            if cancel.is_cancelled() {
                info!("[任务 {}] 轮询已取消 (已查询 {} 次)", job_id, machine.attempts());
                return PollOutcome::Cancelled;
            }

            let result = self.service.job_status(job_id).await;

            if cancel.is_cancelled() {
                debug!("[任务 {}] 取消后到达的响应已丢弃", job_id);
                info!("[任务 {}] 轮询已取消 (已查询 {} 次)", job_id, machine.attempts() + 1);
                return PollOutcome::Cancelled;
            }

            match machine.observe(result) {
                Transition::Finished(outcome) => {
                    log_outcome(job_id, &outcome, machine.attempts());
                    return outcome;
                }
                Transition::Wait {
                    attempt,
                    status,
                    inconclusive,
                } => {
                    if inconclusive {
                        warn!(
                            "[任务 {}] 第 {}/{} 次查询无结论（传输错误），{:?} 后重试",
                            job_id, attempt, machine.max_attempts(), self.settings.interval
                        );
                    } else {
                        debug!(
                            "[任务 {}] 第 {}/{} 次查询: {}",
                            job_id, attempt, machine.max_attempts(), status
                        );
                    }

                    on_progress(PollProgress {
                        attempt,
                        max_attempts: machine.max_attempts(),
                        status,
                    });

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            info!("[任务 {}] 轮询已取消 (已查询 {} 次)", job_id, attempt);
                            return PollOutcome::Cancelled;
                        }
                        _ = tokio::time::sleep(self.settings.interval) => {}
                    }
                }
            }
        }
    }
}

fn log_outcome(job_id: &JobId, outcome: &PollOutcome, attempts: u32) {
    match outcome {
        PollOutcome::Done(payload) => info!(
            "[任务 {}] ✓ 处理完成 (查询 {} 次, {} 个问题)",
            job_id,
            attempts,
            payload.questions.len()
        ),
        PollOutcome::Failed(e) => warn!("[任务 {}] ❌ 处理失败: {}", job_id, e),
        PollOutcome::TimedOut { attempts } => {
            warn!("[任务 {}] ⏱️ 查询 {} 次后仍未完成，判定超时", job_id, attempts)
        }
        PollOutcome::Cancelled => {}
    }
}
