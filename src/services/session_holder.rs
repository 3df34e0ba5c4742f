//! 会话持有者 - 业务能力层
//!
//! 持有当前登录用户，决定上传与历史功能是否可用

use crate::clients::AuthService;
use crate::error::{AppResult, ValidationError};
use crate::models::{Session, UserId};
use std::sync::Arc;
use tracing::{info, warn};

/// 当前应展示的凭证表单
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthForm {
    Login,
    Register,
}

/// 会话持有者
///
/// 职责：
/// - 进程内唯一的 `Session`，启动时为空
/// - 只有 login / logout 会修改它，每次修改都是整体替换
/// - 失败时保持原有会话不变
pub struct SessionHolder<A: AuthService> {
    auth: Arc<A>,
    session: Session,
    form: AuthForm,
    last_error: Option<String>,
}

impl<A: AuthService> SessionHolder<A> {
    pub fn new(auth: Arc<A>) -> Self {
        Self {
            auth,
            session: Session::default(),
            form: AuthForm::Login,
            last_error: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_user(&self) -> Option<&UserId> {
        self.session.user_id.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.user_id.is_some()
    }

    /// 获取当前用户，未登录时返回校验错误
    pub fn require_user(&self) -> AppResult<UserId> {
        self.session
            .user_id
            .clone()
            .ok_or_else(|| ValidationError::NotLoggedIn.into())
    }

    pub fn form(&self) -> AuthForm {
        self.form
    }

    /// 在登录/注册表单之间切换，同时清除上次的错误
    pub fn toggle_form(&mut self) {
        self.form = match self.form {
            AuthForm::Login => AuthForm::Register,
            AuthForm::Register => AuthForm::Login,
        };
        self.last_error = None;
    }

    /// 最近一次失败的提示
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// 登录
    pub async fn login(&mut self, username: &str, password: &str) -> AppResult<UserId> {
        self.last_error = None;
        check_credentials(username, password).inspect_err(|e| self.record_error(e))?;

        match self.auth.login(username, password).await {
            Ok(user_id) => {
                info!("✓ 用户 {} 登录成功 (id: {})", username, user_id);
                self.session = Session {
                    user_id: Some(user_id.clone()),
                };
                Ok(user_id)
            }
            Err(e) => {
                warn!("用户 {} 登录失败: {}", username, e);
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// 注册，成功后切换到登录表单（不自动登录）
    pub async fn register(&mut self, username: &str, password: &str) -> AppResult<AuthForm> {
        self.last_error = None;
        check_credentials(username, password).inspect_err(|e| self.record_error(e))?;

        match self.auth.register(username, password).await {
            Ok(()) => {
                info!("✓ 用户 {} 注册成功，请登录", username);
                self.form = AuthForm::Login;
                Ok(self.form)
            }
            Err(e) => {
                warn!("用户 {} 注册失败: {}", username, e);
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// 登出，无论当前状态如何都清空会话
    pub fn logout(&mut self) {
        if let Some(user_id) = &self.session.user_id {
            info!("用户 {} 已登出", user_id);
        }
        self.session = Session::default();
        self.form = AuthForm::Login;
        self.last_error = None;
    }

    fn record_error(&mut self, err: &crate::error::AppError) {
        self.last_error = Some(err.user_message());
    }
}

fn check_credentials(username: &str, password: &str) -> AppResult<()> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(ValidationError::EmptyCredentials.into());
    }
    Ok(())
}
