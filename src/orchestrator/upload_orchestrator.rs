//! 上传编排器 - 编排层
//!
//! ## 职责
//!
//! 对外只有一个入口 `submit(file, user_id)`，把"上传 → 轮询 → 结果关联"
//! 的整个生命周期表达为一串可观察的状态：
//!
//! ```text
//! idle → uploading → processing → { done | error | timeout }
//! ```
//!
//! ## 并发模型
//!
//! - 每次 `submit` 启动一个任务，上传与轮询在同一个任务中顺序执行
//! - 状态通过 `watch` 通道发布，每个快照带有提交代号（generation）
//! - 新的 `submit` / `reset` 会先取消旧任务的轮询，再推进代号；
//!   旧任务的发布在通道锁内比对代号，迟到的结果不会覆盖新任务的状态

use crate::clients::JobService;
use crate::config::PollSettings;
use crate::error::{AppResult, ValidationError};
use crate::models::{AudioFile, Job, JobResult, JobStatus, UserId};
use crate::services::correlate;
use crate::workflow::{JobPoller, PollOutcome};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// 上传生命周期状态
#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    /// 未选择文件或已重置
    Idle,
    /// 正在上传
    Uploading { filename: String },
    /// 后端已接受，正在轮询
    Processing { job: Job, attempt: u32 },
    /// 完成，附带转写文本与关联后的问答
    Done { job: Job, result: JobResult },
    /// 上传或处理失败
    Error { job: Option<Job>, message: String },
    /// 轮询次数耗尽
    TimedOut { job: Job, attempts: u32 },
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadState::Done { .. } | UploadState::Error { .. } | UploadState::TimedOut { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::Uploading { .. } => "uploading",
            UploadState::Processing { .. } => "processing",
            UploadState::Done { .. } => "done",
            UploadState::Error { .. } => "error",
            UploadState::TimedOut { .. } => "timeout",
        }
    }

    /// 面向用户的单行状态描述
    pub fn message(&self) -> String {
        match self {
            UploadState::Idle => String::new(),
            UploadState::Uploading { filename } => format!("正在上传 {}...", filename),
            UploadState::Processing { attempt, .. } => format!("正在处理... (第 {} 次查询)", attempt),
            UploadState::Done { result, .. } => {
                format!("处理完成，共 {} 个问题", result.pairs.len())
            }
            UploadState::Error { message, .. } => format!("错误: {}", message),
            UploadState::TimedOut { attempts, .. } => {
                format!("处理超时 (已查询 {} 次)", attempts)
            }
        }
    }

    pub fn job(&self) -> Option<&Job> {
        match self {
            UploadState::Processing { job, .. }
            | UploadState::Done { job, .. }
            | UploadState::TimedOut { job, .. } => Some(job),
            UploadState::Error { job, .. } => job.as_ref(),
            UploadState::Idle | UploadState::Uploading { .. } => None,
        }
    }
}

/// 带提交代号的状态快照
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSnapshot {
    pub generation: u64,
    pub state: UploadState,
}

/// 上传编排器
///
/// 同一时刻最多只有一个活跃任务
pub struct UploadOrchestrator<S: JobService + 'static> {
    service: Arc<S>,
    settings: PollSettings,
    state: Arc<watch::Sender<UploadSnapshot>>,
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl<S: JobService + 'static> UploadOrchestrator<S> {
    pub fn new(service: Arc<S>, settings: PollSettings) -> Self {
        let (tx, _rx) = watch::channel(UploadSnapshot {
            generation: 0,
            state: UploadState::Idle,
        });
        Self {
            service,
            settings,
            state: Arc::new(tx),
            generation: 0,
            cancel: None,
        }
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<UploadSnapshot> {
        self.state.subscribe()
    }

    /// 当前状态
    pub fn state(&self) -> UploadState {
        self.state.borrow().state.clone()
    }

    /// 当前提交代号
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 提交音频文件
    ///
    /// 未提供文件或文件为空时直接返回校验错误，状态保持不变。
    /// 若已有任务在进行，先取消其轮询再开始新的上传。
    pub fn submit(&mut self, file: Option<AudioFile>, user_id: &UserId) -> AppResult<u64> {
        let file = file.ok_or(ValidationError::MissingFile)?;
        file.validate()?;

        let generation = self.begin(UploadState::Uploading {
            filename: file.filename.clone(),
        });

        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());

        let lifecycle = Lifecycle {
            service: self.service.clone(),
            settings: self.settings,
            state: self.state.clone(),
            generation,
            cancel,
        };
        tokio::spawn(lifecycle.run(file, user_id.clone()));

        Ok(generation)
    }

    /// 放弃当前任务并回到 idle
    pub fn reset(&mut self) {
        self.begin(UploadState::Idle);
    }

    /// 等待本次提交结束
    ///
    /// 返回终止状态；若期间被新的提交或重置取代，返回取代后的状态
    pub async fn wait_until_settled(&self) -> UploadState {
        let generation = self.generation;
        let mut rx = self.state.subscribe();
        let settled = rx
            .wait_for(|snap| {
                snap.generation != generation
                    || snap.state.is_terminal()
                    || snap.state == UploadState::Idle
            })
            .await
            .map(|snap| snap.state.clone());
        settled.unwrap_or_else(|_| self.state())
    }

    /// 取消旧任务、推进代号并发布新状态
    fn begin(&mut self, state: UploadState) -> u64 {
        if let Some(token) = self.cancel.take() {
            info!("放弃进行中的任务 (代号 {})", self.generation);
            token.cancel();
        }
        self.generation += 1;
        let generation = self.generation;
        self.state.send_modify(|snap| {
            snap.generation = generation;
            snap.state = state;
        });
        generation
    }
}

impl<S: JobService + 'static> Drop for UploadOrchestrator<S> {
    fn drop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

/// 单次提交的生命周期任务
struct Lifecycle<S: JobService> {
    service: Arc<S>,
    settings: PollSettings,
    state: Arc<watch::Sender<UploadSnapshot>>,
    generation: u64,
    cancel: CancellationToken,
}

impl<S: JobService + 'static> Lifecycle<S> {
    async fn run(self, file: AudioFile, user_id: UserId) {
        info!("📤 正在上传 {} ({} 字节)", file.filename, file.bytes.len());

        let job_id = match self.service.submit_audio(&user_id, &file).await {
            Ok(job_id) => job_id,
            Err(e) => {
                error!("❌ 上传 {} 失败: {}", file.filename, e);
                self.publish(UploadState::Error {
                    job: None,
                    message: e.user_message(),
                });
                return;
            }
        };

        if self.cancel.is_cancelled() {
            info!("[任务 {}] 上传完成时已被取消，不再轮询", job_id);
            return;
        }

        info!("[任务 {}] ✓ 上传成功，开始轮询处理状态", job_id);
        let mut job = Job::submitted(job_id.clone(), file.filename);
        self.publish(UploadState::Processing {
            job: job.clone(),
            attempt: 0,
        });

        let poller = JobPoller::new(self.service.clone(), self.settings);
        let outcome = poller
            .poll_with_progress(&job_id, &self.cancel, |progress| {
                job.advance(progress.status);
                self.publish(UploadState::Processing {
                    job: job.clone(),
                    attempt: progress.attempt,
                });
            })
            .await;

        let terminal = match outcome {
            PollOutcome::Done(payload) => {
                job.advance(JobStatus::Done);
                let pairs = correlate(&payload.questions, &payload.answers);
                UploadState::Done {
                    job,
                    result: JobResult {
                        transcript: payload.transcript,
                        pairs,
                    },
                }
            }
            PollOutcome::Failed(e) => {
                job.advance(JobStatus::Error);
                UploadState::Error {
                    job: Some(job),
                    message: e.user_message(),
                }
            }
            PollOutcome::TimedOut { attempts } => {
                job.advance(JobStatus::Timeout);
                UploadState::TimedOut { job, attempts }
            }
            PollOutcome::Cancelled => return,
        };
        self.publish(terminal);
    }

    /// 仅当代号仍是当前代号时发布
    fn publish(&self, state: UploadState) -> bool {
        let generation = self.generation;
        self.state.send_if_modified(|snap| {
            if snap.generation != generation {
                return false;
            }
            snap.state = state;
            true
        })
    }
}
