//! 登录 / 会话校验 / 修改密码的 HTTP API 客户端

use crate::directory::auth::models::{LoginRequest, LoginResponse, PasswordChange, Principal};
use crate::directory::error::Result;
use crate::directory::types::{
    handle_empty_response, handle_http_response, new_request_id, REQUEST_ID_HEADER,
    SESSION_HEADER,
};
use async_trait::async_trait;
use tracing::{debug, info};

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;

    /// 用 token 换取当前用户；token 无效或过期时服务器返回 401
    async fn current_principal(&self, token: &str) -> Result<Principal>;

    async fn change_password(&self, token: &str, change: &PasswordChange) -> Result<()>;
}

pub struct AuthApi {
    client: reqwest::Client,
    auth_url: String,
    change_password_url: String,
}

impl AuthApi {
    pub fn new(client: reqwest::Client, auth_url: String, change_password_url: String) -> Self {
        Self {
            client,
            auth_url,
            change_password_url,
        }
    }
}

#[async_trait]
impl AuthBackend for AuthApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let request_id = new_request_id();
        info!("[AuthAPI] 🔐 正在登录...");
        debug!(
            "[AuthAPI]   URL: {}, 用户名: {:?}, 请求ID: {}",
            self.auth_url, request.username, request_id
        );

        let response = self
            .client
            .post(&self.auth_url)
            .header(REQUEST_ID_HEADER, &request_id)
            .json(request)
            .send()
            .await?;
        handle_http_response(response, "登录").await
    }

    async fn current_principal(&self, token: &str) -> Result<Principal> {
        info!("[AuthAPI] 📡 校验会话");
        let response = self
            .client
            .get(&self.auth_url)
            .header(REQUEST_ID_HEADER, new_request_id())
            .header(SESSION_HEADER, token)
            .send()
            .await?;
        handle_http_response(response, "会话校验").await
    }

    async fn change_password(&self, token: &str, change: &PasswordChange) -> Result<()> {
        info!("[AuthAPI] 📡 修改密码");
        let response = self
            .client
            .post(&self.change_password_url)
            .header(REQUEST_ID_HEADER, new_request_id())
            .header(SESSION_HEADER, token)
            .json(change)
            .send()
            .await?;
        handle_empty_response(response, "修改密码").await
    }
}
