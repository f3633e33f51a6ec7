//! 登录状态机
//!
//! Anonymous -> Authenticating -> Authenticated，登出或会话校验失败回到 Anonymous。

use crate::directory::auth::api::AuthBackend;
use crate::directory::auth::models::{AuthState, Credentials, PasswordChange, Principal};
use crate::directory::error::{DirectoryError, Result};
use crate::directory::listener::{DirectoryListener, Notifier};
use crate::directory::session::SessionContext;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

pub struct AuthService {
    backend: Arc<dyn AuthBackend>,
    session: Arc<SessionContext>,
    notifier: Notifier,
    state: Mutex<AuthState>,
}

impl AuthService {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        session: Arc<SessionContext>,
        listener: Arc<dyn DirectoryListener>,
    ) -> Self {
        Self {
            backend,
            session,
            notifier: Notifier::new(listener),
            state: Mutex::new(AuthState::Anonymous),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.state().principal().cloned()
    }

    async fn transition(&self, next: AuthState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next.clone();
        self.notifier.auth_state(next).await;
    }

    /// 提交登录凭据
    ///
    /// 只有在拿到完整的用户信息后才持久化 token；任何一步失败都回到 Anonymous。
    pub async fn login(&self, credentials: &Credentials) -> Result<Principal> {
        if let Err(err) = credentials.validate() {
            self.notifier.failure(&err).await;
            return Err(err);
        }

        self.transition(AuthState::Authenticating).await;
        match self.authenticate(credentials).await {
            Ok(principal) => {
                info!(
                    "[Auth] ✅ 登录成功: {} ({})",
                    principal.username,
                    principal.role.as_str()
                );
                self.transition(AuthState::Authenticated(principal.clone()))
                    .await;
                self.notifier.success("signed in").await;
                Ok(principal)
            }
            Err(err) => {
                warn!("[Auth] 登录失败: {}", err);
                // 状态回到 Anonymous，旧会话不能继续授权请求
                if self.session.is_authenticated() {
                    if let Err(clear_err) = self.session.clear().await {
                        error!("[Auth] 清除旧会话失败: {}", clear_err);
                    }
                }
                self.transition(AuthState::Anonymous).await;
                self.notifier.failure(&err).await;
                Err(err)
            }
        }
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Principal> {
        let response = self.backend.login(&credentials.to_request()).await?;
        let principal = match response.principal() {
            Some(principal) => principal,
            // 只返回 token 和角色的旧接口：再用 token 换一次用户信息
            None => self.backend.current_principal(&response.token).await?,
        };
        self.session
            .establish(response.token, principal.clone())
            .await?;
        Ok(principal)
    }

    /// 启动时恢复会话
    ///
    /// 服务器拒绝 token 时清除本地存储；网络故障时保留 token，本次运行按未登录处理。
    pub async fn restore(&self) -> Result<Option<Principal>> {
        let Some(token) = self.session.stored_token().await? else {
            info!("[Auth] 本地没有会话 token");
            return Ok(None);
        };

        match self.backend.current_principal(&token).await {
            Ok(principal) => {
                self.session.adopt(token, principal.clone());
                self.transition(AuthState::Authenticated(principal.clone()))
                    .await;
                Ok(Some(principal))
            }
            Err(err) if err.is_network() => {
                warn!("[Auth] 会话校验时网络故障，暂不清除 token: {}", err);
                self.transition(AuthState::Anonymous).await;
                Ok(None)
            }
            Err(err) => {
                warn!("[Auth] 会话已失效，清除本地 token: {}", err);
                self.session.clear().await?;
                self.transition(AuthState::Anonymous).await;
                Ok(None)
            }
        }
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.clear().await.map_err(|e| {
            error!("[Auth] 清除会话失败: {}", e);
            e
        })?;
        self.transition(AuthState::Anonymous).await;
        info!("[Auth] 👋 已登出");
        Ok(())
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        let Some(token) = self.session.token() else {
            let err = DirectoryError::Forbidden("sign in to change the password".to_string());
            self.notifier.failure(&err).await;
            return Err(err);
        };

        match self.backend.change_password(&token, change).await {
            Ok(()) => {
                info!("[Auth] ✅ 密码已修改");
                self.notifier.success("password changed").await;
                Ok(())
            }
            Err(err) => {
                warn!("[Auth] 修改密码失败: {}", err);
                self.notifier.failure(&err).await;
                Err(err)
            }
        }
    }
}
