//! 目录客户端监听器回调接口

use crate::directory::auth::AuthState;
use crate::directory::error::DirectoryError;
use crate::directory::types::{EntityKind, Notice};
use async_trait::async_trait;
use std::sync::Arc;

/// 客户端事件回调（页面层据此刷新派生视图、弹出提示）
#[async_trait]
pub trait DirectoryListener: Send + Sync {
    /// 某类数据在服务器上发生了变更（新增、修改、删除或排序）
    async fn on_data_changed(&self, kind: EntityKind);

    /// 需要展示给用户的一次性提示
    async fn on_notice(&self, notice: Notice);

    /// 登录状态发生变化
    async fn on_auth_state_changed(&self, state: AuthState);
}

/// 默认空实现（无操作）
pub struct EmptyDirectoryListener;

#[async_trait]
impl DirectoryListener for EmptyDirectoryListener {
    async fn on_data_changed(&self, _kind: EntityKind) {}
    async fn on_notice(&self, _notice: Notice) {}
    async fn on_auth_state_changed(&self, _state: AuthState) {}
}

/// 各服务共用的通知辅助
#[derive(Clone)]
pub(crate) struct Notifier {
    listener: Arc<dyn DirectoryListener>,
}

impl Notifier {
    pub(crate) fn new(listener: Arc<dyn DirectoryListener>) -> Self {
        Self { listener }
    }

    pub(crate) async fn success(&self, message: &str) {
        self.listener.on_notice(Notice::success(message)).await;
    }

    pub(crate) async fn error(&self, message: &str) {
        self.listener.on_notice(Notice::error(message)).await;
    }

    pub(crate) async fn failure(&self, err: &DirectoryError) {
        self.error(&err.user_message()).await;
    }

    pub(crate) async fn data_changed(&self, kind: EntityKind) {
        self.listener.on_data_changed(kind).await;
    }

    pub(crate) async fn auth_state(&self, state: AuthState) {
        self.listener.on_auth_state_changed(state).await;
    }
}
