//! 新闻 HTTP API 客户端

use crate::directory::error::Result;
use crate::directory::news::models::{NewsInput, NewsItem};
use crate::directory::session::SessionContext;
use crate::directory::types::{
    handle_empty_response, handle_http_response, new_request_id, REQUEST_ID_HEADER,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

#[async_trait]
pub trait NewsBackend: Send + Sync {
    /// 最新的在前
    async fn list_news(&self) -> Result<Vec<NewsItem>>;

    async fn create_news(&self, input: &NewsInput) -> Result<()>;

    async fn update_news(&self, id: i64, input: &NewsInput) -> Result<()>;

    async fn delete_news(&self, id: i64) -> Result<()>;
}

pub struct NewsApi {
    client: reqwest::Client,
    news_url: String,
    session: Arc<SessionContext>,
}

impl NewsApi {
    pub fn new(client: reqwest::Client, news_url: String, session: Arc<SessionContext>) -> Self {
        Self {
            client,
            news_url,
            session,
        }
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}?id={}", self.news_url, id)
    }
}

#[async_trait]
impl NewsBackend for NewsApi {
    async fn list_news(&self) -> Result<Vec<NewsItem>> {
        let request_id = new_request_id();
        info!("[NewsAPI] 📡 请求新闻列表");
        debug!("[NewsAPI]   请求URL: {}, 请求ID: {}", self.news_url, request_id);

        let response = self
            .client
            .get(&self.news_url)
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await?;

        let news = handle_http_response::<Option<Vec<NewsItem>>>(response, "新闻列表")
            .await?
            .unwrap_or_default();
        info!("[NewsAPI] ✅ 新闻列表，共 {} 条", news.len());
        Ok(news)
    }

    async fn create_news(&self, input: &NewsInput) -> Result<()> {
        info!("[NewsAPI] 📡 新建新闻: {}", input.title);
        let request = self
            .client
            .post(&self.news_url)
            .header(REQUEST_ID_HEADER, new_request_id())
            .json(input);
        let response = self.session.authorize(request).send().await?;
        handle_empty_response(response, "新建新闻").await
    }

    async fn update_news(&self, id: i64, input: &NewsInput) -> Result<()> {
        info!("[NewsAPI] 📡 更新新闻 id={}", id);
        let request = self
            .client
            .put(self.item_url(id))
            .header(REQUEST_ID_HEADER, new_request_id())
            .json(input);
        let response = self.session.authorize(request).send().await?;
        handle_empty_response(response, "更新新闻").await
    }

    async fn delete_news(&self, id: i64) -> Result<()> {
        info!("[NewsAPI] 📡 删除新闻 id={}", id);
        let request = self
            .client
            .delete(self.item_url(id))
            .header(REQUEST_ID_HEADER, new_request_id());
        let response = self.session.authorize(request).send().await?;
        handle_empty_response(response, "删除新闻").await
    }
}
