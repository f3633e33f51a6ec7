//! 联系人服务层
//!
//! 持有本地联系人列表，所有写操作成功后整体重新拉取。
//! 拖拽排序见 `reorder.rs`。

use crate::directory::auth::{visible_contacts, Principal};
use crate::directory::contact::api::ContactBackend;
use crate::directory::contact::models::{Contact, ContactInput};
use crate::directory::error::Result;
use crate::directory::forms::ContactSubmission;
use crate::directory::listener::{DirectoryListener, Notifier};
use crate::directory::session::SessionContext;
use crate::directory::state::ListState;
use crate::directory::types::EntityKind;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 快照被丢弃后最多重新拉取的次数
const MAX_REFRESH_ATTEMPTS: usize = 3;

pub struct ContactService {
    pub(super) backend: Arc<dyn ContactBackend>,
    pub(super) state: ListState<Contact>,
    pub(super) session: Arc<SessionContext>,
    pub(super) notifier: Notifier,
}

impl ContactService {
    pub fn new(
        backend: Arc<dyn ContactBackend>,
        session: Arc<SessionContext>,
        listener: Arc<dyn DirectoryListener>,
    ) -> Self {
        Self {
            backend,
            state: ListState::new(),
            session,
            notifier: Notifier::new(listener),
        }
    }

    /// 当前本地列表（渲染顺序）
    pub fn contacts(&self) -> Vec<Contact> {
        self.state.snapshot()
    }

    pub fn generation(&self) -> u64 {
        self.state.generation()
    }

    /// 后台面板里该用户可见的联系人
    pub fn visible_for(&self, principal: &Principal) -> Vec<Contact> {
        visible_contacts(principal, &self.state.snapshot())
    }

    /// 从服务器拉取权威列表并整体替换
    ///
    /// 返回 `false` 表示拉取期间本地已有更新的修改，快照被丢弃。
    pub async fn refresh(&self) -> Result<bool> {
        let seen = self.state.generation();
        let contacts = self.backend.list_contacts().await.map_err(|e| {
            error!("[ContactSvc] 拉取联系人失败: {}", e);
            e
        })?;

        let count = contacts.len();
        if self.state.replace_if_current(contacts, seen) {
            debug!("[ContactSvc] 本地列表已替换，共 {} 个", count);
            Ok(true)
        } else {
            warn!(
                "[ContactSvc] 快照已过期（拉取开始于 generation={}），丢弃",
                seen
            );
            Ok(false)
        }
    }

    /// 拉取直到快照被采用
    ///
    /// 快照被丢弃说明拉取期间有更新的本地修改（例如一次已保存的排序），
    /// 服务器此时已包含那次修改，再拉一次即可对齐。
    pub async fn refresh_until_current(&self) -> Result<bool> {
        for attempt in 1..=MAX_REFRESH_ATTEMPTS {
            if self.refresh().await? {
                return Ok(true);
            }
            debug!("[ContactSvc] 第 {} 次拉取被丢弃，重新拉取", attempt);
        }
        warn!(
            "[ContactSvc] 连续 {} 次拉取都被更新的本地修改覆盖，放弃对齐",
            MAX_REFRESH_ATTEMPTS
        );
        Ok(false)
    }

    pub async fn create(&self, input: &ContactInput) -> Result<()> {
        let result = self.backend.create_contact(input).await;
        self.finish_mutation(result, "contact created").await
    }

    pub async fn update(&self, id: i64, input: &ContactInput) -> Result<()> {
        let result = self.backend.update_contact(id, input).await;
        self.finish_mutation(result, "contact updated").await
    }

    /// 表单提交：有 id 则更新，否则新建
    pub async fn save(&self, submission: &ContactSubmission) -> Result<()> {
        match submission.id {
            Some(id) => self.update(id, &submission.input).await,
            None => self.create(&submission.input).await,
        }
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = self.backend.delete_contact(id).await;
        self.finish_mutation(result, "contact deleted").await
    }

    async fn finish_mutation(&self, result: Result<()>, done: &str) -> Result<()> {
        if let Err(err) = result {
            warn!("[ContactSvc] 写操作失败: {}", err);
            self.notifier.failure(&err).await;
            return Err(err);
        }

        info!("[ContactSvc] ✅ {}", done);
        self.notifier.success(done).await;
        let refreshed = self.refresh_until_current().await;
        self.notifier.data_changed(EntityKind::Contacts).await;
        if let Err(err) = refreshed {
            self.notifier.failure(&err).await;
            return Err(err);
        }
        Ok(())
    }
}
