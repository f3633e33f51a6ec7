//! 编辑账号 HTTP API 客户端
//!
//! 所有接口都需要超级管理员的会话 token

use crate::directory::editor::models::{Editor, EditorInput};
use crate::directory::error::Result;
use crate::directory::session::SessionContext;
use crate::directory::types::{
    handle_empty_response, handle_http_response, new_request_id, REQUEST_ID_HEADER,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

#[async_trait]
pub trait EditorBackend: Send + Sync {
    async fn list_editors(&self) -> Result<Vec<Editor>>;

    async fn create_editor(&self, input: &EditorInput) -> Result<()>;

    async fn delete_editor(&self, id: i64) -> Result<()>;
}

pub struct EditorApi {
    client: reqwest::Client,
    editors_url: String,
    session: Arc<SessionContext>,
}

impl EditorApi {
    pub fn new(client: reqwest::Client, editors_url: String, session: Arc<SessionContext>) -> Self {
        Self {
            client,
            editors_url,
            session,
        }
    }
}

#[async_trait]
impl EditorBackend for EditorApi {
    async fn list_editors(&self) -> Result<Vec<Editor>> {
        info!("[EditorAPI] 📡 请求编辑列表");
        let request = self
            .client
            .get(&self.editors_url)
            .header(REQUEST_ID_HEADER, new_request_id());
        let response = self.session.authorize(request).send().await?;
        let editors = handle_http_response::<Option<Vec<Editor>>>(response, "编辑列表")
            .await?
            .unwrap_or_default();
        info!("[EditorAPI] ✅ 编辑列表，共 {} 个", editors.len());
        Ok(editors)
    }

    async fn create_editor(&self, input: &EditorInput) -> Result<()> {
        info!("[EditorAPI] 📡 新建编辑: {}", input.username);
        let request = self
            .client
            .post(&self.editors_url)
            .header(REQUEST_ID_HEADER, new_request_id())
            .json(input);
        let response = self.session.authorize(request).send().await?;
        handle_empty_response(response, "新建编辑").await
    }

    async fn delete_editor(&self, id: i64) -> Result<()> {
        info!("[EditorAPI] 📡 删除编辑 id={}", id);
        let request = self
            .client
            .delete(format!("{}?id={}", self.editors_url, id))
            .header(REQUEST_ID_HEADER, new_request_id());
        let response = self.session.authorize(request).send().await?;
        handle_empty_response(response, "删除编辑").await
    }
}
