//! 测试用的内存假服务

use crate::clients::{AuthService, HistoryService, JobService};
use crate::error::{AppError, AppResult};
use crate::models::{AudioFile, Job, JobId, JobPayload, JobStatus, StatusReport, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 脚本中的一步：等待 `delay` 后返回 `result`
pub struct Step {
    pub delay: Duration,
    pub result: AppResult<StatusReport>,
}

pub fn pending() -> Step {
    Step {
        delay: Duration::ZERO,
        result: Ok(StatusReport::Pending(JobStatus::Processing)),
    }
}

pub fn done(payload: JobPayload) -> Step {
    Step {
        delay: Duration::ZERO,
        result: Ok(StatusReport::Done(payload)),
    }
}

pub fn failed(reason: Option<&str>) -> Step {
    Step {
        delay: Duration::ZERO,
        result: Ok(StatusReport::Failed(reason.map(str::to_string))),
    }
}

pub fn transport_failure() -> Step {
    Step {
        delay: Duration::ZERO,
        result: Err(AppError::malformed("/api/result/", "connection reset")),
    }
}

impl Step {
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// 按脚本返回状态的任务服务
///
/// 脚本用完后一直返回 processing
#[derive(Default)]
pub struct ScriptedJobService {
    submissions: Mutex<VecDeque<(Duration, AppResult<JobId>)>>,
    scripts: Mutex<HashMap<JobId, VecDeque<Step>>>,
    calls: Mutex<HashMap<JobId, u32>>,
    submit_calls: AtomicU32,
    cancel_on_call: Mutex<Option<(u32, CancellationToken)>>,
}

impl ScriptedJobService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, job_id: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(JobId::new(job_id), steps.into());
        self
    }

    pub fn with_submission(self, delay: Duration, result: AppResult<JobId>) -> Self {
        self.submissions.lock().unwrap().push_back((delay, result));
        self
    }

    /// 第 `call` 次状态查询返回前取消 `token`
    pub fn cancel_on_call(self, call: u32, token: CancellationToken) -> Self {
        *self.cancel_on_call.lock().unwrap() = Some((call, token));
        self
    }

    pub fn status_calls(&self, job_id: &str) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(&JobId::new(job_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobService for ScriptedJobService {
    async fn submit_audio(&self, _user_id: &UserId, _file: &AudioFile) -> AppResult<JobId> {
        let n = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let next = self.submissions.lock().unwrap().pop_front();
        match next {
            Some((delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Ok(JobId::new(format!("job-{}", n))),
        }
    }

    async fn job_status(&self, job_id: &JobId) -> AppResult<StatusReport> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(job_id.clone()).or_insert(0);
            *count += 1;
            *count
        };
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(|s| s.pop_front())
            .unwrap_or_else(pending);

        tokio::time::sleep(step.delay).await;

        if let Some((at, token)) = self.cancel_on_call.lock().unwrap().as_ref() {
            if *at == call {
                token.cancel();
            }
        }
        step.result
    }
}

/// 内存认证服务
#[derive(Default)]
pub struct FakeAuth {
    users: Mutex<HashMap<String, (String, UserId)>>,
    pub login_calls: AtomicU32,
}

impl FakeAuth {
    pub fn with_user(self, username: &str, password: &str, id: &str) -> Self {
        self.users.lock().unwrap().insert(
            username.to_string(),
            (password.to_string(), UserId::new(id)),
        );
        self
    }
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn login(&self, username: &str, password: &str) -> AppResult<UserId> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        match self.users.lock().unwrap().get(username) {
            Some((pw, id)) if pw == password => Ok(id.clone()),
            _ => Err(AppError::remote(
                Some(401),
                Some("Invalid credentials".to_string()),
            )),
        }
    }

    async fn register(&self, username: &str, password: &str) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(username) {
            return Err(AppError::remote(
                Some(400),
                Some("Username already exists".to_string()),
            ));
        }
        let id = UserId::new((users.len() + 1).to_string());
        users.insert(username.to_string(), (password.to_string(), id));
        Ok(())
    }
}

/// 按顺序返回预设结果的历史服务
#[derive(Default)]
pub struct FakeHistory {
    responses: Mutex<VecDeque<AppResult<Vec<Job>>>>,
}

impl FakeHistory {
    pub fn then(self, response: AppResult<Vec<Job>>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }
}

#[async_trait]
impl HistoryService for FakeHistory {
    async fn list_jobs(&self, _user_id: &UserId) -> AppResult<Vec<Job>> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
