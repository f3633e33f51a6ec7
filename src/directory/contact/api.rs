//! 联系人 HTTP API 客户端
//!
//! 负责所有联系人相关的 HTTP 请求

use crate::directory::contact::models::{Contact, ContactInput, OrderEntry, ReorderRequest};
use crate::directory::error::Result;
use crate::directory::session::SessionContext;
use crate::directory::types::{
    handle_empty_response, handle_http_response, new_request_id, REQUEST_ID_HEADER,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// 联系人远端接口（服务层只依赖这个 trait，测试里可替换成内存实现）
#[async_trait]
pub trait ContactBackend: Send + Sync {
    /// 按 order_index 排好序的全部联系人
    async fn list_contacts(&self) -> Result<Vec<Contact>>;

    async fn create_contact(&self, input: &ContactInput) -> Result<()>;

    async fn update_contact(&self, id: i64, input: &ContactInput) -> Result<()>;

    async fn delete_contact(&self, id: i64) -> Result<()>;

    /// 一次请求提交完整的位置表
    async fn save_order(&self, orders: &[OrderEntry]) -> Result<()>;
}

pub struct ContactApi {
    client: reqwest::Client,
    contacts_url: String,
    session: Arc<SessionContext>,
}

impl ContactApi {
    pub fn new(client: reqwest::Client, contacts_url: String, session: Arc<SessionContext>) -> Self {
        Self {
            client,
            contacts_url,
            session,
        }
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}?id={}", self.contacts_url, id)
    }
}

#[async_trait]
impl ContactBackend for ContactApi {
    async fn list_contacts(&self) -> Result<Vec<Contact>> {
        let request_id = new_request_id();
        info!("[ContactAPI] 📡 请求联系人列表");
        debug!(
            "[ContactAPI]   请求URL: {}, 请求ID: {}",
            self.contacts_url, request_id
        );

        let response = self
            .client
            .get(&self.contacts_url)
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await?;

        // 服务器已按 order_index, id 排序，顺序以服务器为准
        let contacts: Vec<Contact> =
            handle_http_response::<Option<Vec<Contact>>>(response, "联系人列表")
                .await?
                .unwrap_or_default();

        info!("[ContactAPI] ✅ 联系人列表，共 {} 个", contacts.len());
        Ok(contacts)
    }

    async fn create_contact(&self, input: &ContactInput) -> Result<()> {
        let request_id = new_request_id();
        info!("[ContactAPI] 📡 新建联系人: {}", input.name);

        let request = self
            .client
            .post(&self.contacts_url)
            .header(REQUEST_ID_HEADER, &request_id)
            .json(input);
        let response = self.session.authorize(request).send().await?;
        handle_empty_response(response, "新建联系人").await
    }

    async fn update_contact(&self, id: i64, input: &ContactInput) -> Result<()> {
        let request_id = new_request_id();
        info!("[ContactAPI] 📡 更新联系人 id={}", id);

        let request = self
            .client
            .put(self.item_url(id))
            .header(REQUEST_ID_HEADER, &request_id)
            .json(input);
        let response = self.session.authorize(request).send().await?;
        handle_empty_response(response, "更新联系人").await
    }

    async fn delete_contact(&self, id: i64) -> Result<()> {
        let request_id = new_request_id();
        info!("[ContactAPI] 📡 删除联系人 id={}", id);

        let request = self
            .client
            .delete(self.item_url(id))
            .header(REQUEST_ID_HEADER, &request_id);
        let response = self.session.authorize(request).send().await?;
        handle_empty_response(response, "删除联系人").await
    }

    async fn save_order(&self, orders: &[OrderEntry]) -> Result<()> {
        let request_id = new_request_id();
        info!("[ContactAPI] 📡 提交排序，共 {} 项", orders.len());
        debug!("[ContactAPI]   请求ID: {}", request_id);

        let body = ReorderRequest {
            orders: orders.to_vec(),
        };
        let request = self
            .client
            .patch(&self.contacts_url)
            .header(REQUEST_ID_HEADER, &request_id)
            .json(&body);
        let response = self.session.authorize(request).send().await?;
        handle_empty_response(response, "联系人排序").await
    }
}
