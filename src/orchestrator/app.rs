//! 顶层控制器 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建后端客户端，装配会话、上传、历史三个组件
//! 2. **会话管理**：持有进程内唯一的 `SessionHolder`，未登录时不进入上传与历史
//! 3. **单次运行**：登录 → 上传并跟踪 → 输出问答 → 同步历史 → 登出

use crate::clients::BackendClient;
use crate::config::Config;
use crate::models::{AudioFile, UserId};
use crate::orchestrator::{UploadOrchestrator, UploadState};
use crate::services::{HistorySync, SessionHolder};
use crate::utils::logging::{log_history, log_job_result, log_startup, log_state};
use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    session: SessionHolder<BackendClient>,
    uploads: UploadOrchestrator<BackendClient>,
    history: HistorySync<BackendClient>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        config.validate().context("配置校验失败")?;
        let client = Arc::new(BackendClient::new(&config).context("无法创建 HTTP 客户端")?);

        Ok(Self {
            session: SessionHolder::new(client.clone()),
            uploads: UploadOrchestrator::new(client.clone(), config.poll_settings()),
            history: HistorySync::new(client),
            config,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<()> {
        log_startup(&self.config);

        let username = self
            .config
            .username
            .clone()
            .context("缺少用户名 (AUDIO_QA_USERNAME)")?;
        let password = self
            .config
            .password
            .clone()
            .context("缺少密码 (AUDIO_QA_PASSWORD)")?;

        if self.config.register_first {
            if let Err(e) = self.session.register(&username, &password).await {
                warn!("注册失败: {}，继续尝试登录", e);
            }
        }

        self.session
            .login(&username, &password)
            .await
            .map_err(|e| anyhow!("登录失败: {}", e.user_message()))?;
        let user_id = self.session.require_user()?;

        let outcome = self.process_audio(&user_id).await;
        self.sync_history(&user_id).await;

        self.session.logout();
        outcome
    }

    /// 上传配置中的音频文件并跟踪到结束
    async fn process_audio(&mut self, user_id: &UserId) -> Result<()> {
        let path = self
            .config
            .audio_file
            .clone()
            .context("缺少音频文件路径 (AUDIO_FILE)")?;
        let file = AudioFile::from_path(Path::new(&path)).await?;

        let mut rx = self.uploads.subscribe();
        let generation = self.uploads.submit(Some(file), user_id)?;

        loop {
            if rx.changed().await.is_err() {
                break;
            }
            let snap = rx.borrow_and_update().clone();
            if snap.generation != generation {
                continue;
            }
            log_state(&snap.state);
            if snap.state.is_terminal() {
                break;
            }
        }

        match self.uploads.state() {
            UploadState::Done { result, .. } => {
                log_job_result(&result);
                Ok(())
            }
            UploadState::Error { message, .. } => bail!("处理失败: {}", message),
            UploadState::TimedOut { attempts, .. } => bail!("处理超时: 已查询 {} 次", attempts),
            other => bail!("任务未结束: {}", other.label()),
        }
    }

    /// 同步并输出历史任务，失败不影响本次运行结果
    async fn sync_history(&mut self, user_id: &UserId) {
        if let Err(e) = self.history.refresh(user_id).await {
            warn!("历史任务获取失败: {}", e);
        }
        log_history(self.history.jobs(), self.history.is_stale());
        info!("✓ 运行结束");
    }
}
