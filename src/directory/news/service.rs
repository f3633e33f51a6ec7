//! 新闻服务层

use crate::directory::error::Result;
use crate::directory::forms::NewsSubmission;
use crate::directory::listener::{DirectoryListener, Notifier};
use crate::directory::news::api::NewsBackend;
use crate::directory::news::models::{NewsInput, NewsItem};
use crate::directory::state::ListState;
use crate::directory::types::EntityKind;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct NewsService {
    backend: Arc<dyn NewsBackend>,
    state: ListState<NewsItem>,
    notifier: Notifier,
}

impl NewsService {
    pub fn new(backend: Arc<dyn NewsBackend>, listener: Arc<dyn DirectoryListener>) -> Self {
        Self {
            backend,
            state: ListState::new(),
            notifier: Notifier::new(listener),
        }
    }

    pub fn news(&self) -> Vec<NewsItem> {
        self.state.snapshot()
    }

    pub async fn refresh(&self) -> Result<bool> {
        let seen = self.state.generation();
        let news = self.backend.list_news().await.map_err(|e| {
            error!("[NewsSvc] 拉取新闻失败: {}", e);
            e
        })?;
        let applied = self.state.replace_if_current(news, seen);
        if !applied {
            warn!("[NewsSvc] 快照已过期，丢弃");
        }
        Ok(applied)
    }

    pub async fn create(&self, input: &NewsInput) -> Result<()> {
        let result = self.backend.create_news(input).await;
        self.finish_mutation(result, "news published").await
    }

    pub async fn update(&self, id: i64, input: &NewsInput) -> Result<()> {
        let result = self.backend.update_news(id, input).await;
        self.finish_mutation(result, "news updated").await
    }

    pub async fn save(&self, submission: &NewsSubmission) -> Result<()> {
        match submission.id {
            Some(id) => self.update(id, &submission.input).await,
            None => self.create(&submission.input).await,
        }
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = self.backend.delete_news(id).await;
        self.finish_mutation(result, "news deleted").await
    }

    async fn finish_mutation(&self, result: Result<()>, done: &str) -> Result<()> {
        if let Err(err) = result {
            warn!("[NewsSvc] 写操作失败: {}", err);
            self.notifier.failure(&err).await;
            return Err(err);
        }

        info!("[NewsSvc] ✅ {}", done);
        self.notifier.success(done).await;
        let refreshed = self.refresh().await;
        self.notifier.data_changed(EntityKind::News).await;
        if let Err(err) = refreshed {
            self.notifier.failure(&err).await;
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::test_support::{init_test_logger, FakeNewsBackend, RecordingListener};

    #[tokio::test]
    async fn publish_puts_newest_first() {
        init_test_logger();
        let backend = Arc::new(FakeNewsBackend::default());
        let listener = Arc::new(RecordingListener::default());
        let service = NewsService::new(backend, listener.clone());

        for title in ["Launch", "Holiday hours"] {
            service
                .create(&NewsInput {
                    title: title.into(),
                    description: "details".into(),
                    date: "March 2025".into(),
                })
                .await
                .unwrap();
        }

        let titles: Vec<String> = service.news().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["Holiday hours".to_string(), "Launch".to_string()]);
        assert_eq!(listener.changed(), vec![EntityKind::News, EntityKind::News]);
    }

    #[tokio::test]
    async fn delete_then_list_no_longer_contains_item() {
        init_test_logger();
        let backend = Arc::new(FakeNewsBackend::default());
        let service = NewsService::new(backend, Arc::new(RecordingListener::default()));
        service
            .create(&NewsInput {
                title: "Launch".into(),
                description: "details".into(),
                date: "today".into(),
            })
            .await
            .unwrap();
        let id = service.news()[0].id;

        service.delete(id).await.unwrap();

        assert!(service.news().is_empty());
    }
}
