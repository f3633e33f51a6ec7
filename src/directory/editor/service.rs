//! 编辑账号服务层

use crate::directory::auth::can_manage_editors;
use crate::directory::editor::api::EditorBackend;
use crate::directory::editor::models::{Editor, EditorInput};
use crate::directory::error::{DirectoryError, Result};
use crate::directory::listener::{DirectoryListener, Notifier};
use crate::directory::session::SessionContext;
use crate::directory::state::ListState;
use crate::directory::types::EntityKind;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct EditorService {
    backend: Arc<dyn EditorBackend>,
    state: ListState<Editor>,
    session: Arc<SessionContext>,
    notifier: Notifier,
}

impl EditorService {
    pub fn new(
        backend: Arc<dyn EditorBackend>,
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

    pub fn editors(&self) -> Vec<Editor> {
        self.state.snapshot()
    }

    /// 编辑 id -> 用户名，用于在联系人旁标注创建者
    pub fn usernames(&self) -> HashMap<i64, String> {
        self.state
            .snapshot()
            .into_iter()
            .map(|e| (e.id, e.username))
            .collect()
    }

    fn ensure_allowed(&self) -> Result<()> {
        match self.session.principal() {
            Some(p) if can_manage_editors(&p) => Ok(()),
            _ => Err(DirectoryError::Forbidden(
                "editor management is available to superadmins only".to_string(),
            )),
        }
    }

    pub async fn refresh(&self) -> Result<bool> {
        self.ensure_allowed()?;
        let seen = self.state.generation();
        let editors = self.backend.list_editors().await?;
        Ok(self.state.replace_if_current(editors, seen))
    }

    pub async fn create(&self, input: &EditorInput) -> Result<()> {
        if let Err(err) = self.ensure_allowed() {
            self.notifier.failure(&err).await;
            return Err(err);
        }
        let result = self.backend.create_editor(input).await;
        self.finish_mutation(result, "editor added").await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if let Err(err) = self.ensure_allowed() {
            self.notifier.failure(&err).await;
            return Err(err);
        }
        let result = self.backend.delete_editor(id).await;
        self.finish_mutation(result, "editor deleted").await
    }

    async fn finish_mutation(&self, result: Result<()>, done: &str) -> Result<()> {
        if let Err(err) = result {
            warn!("[EditorSvc] 写操作失败: {}", err);
            self.notifier.failure(&err).await;
            return Err(err);
        }

        info!("[EditorSvc] ✅ {}", done);
        self.notifier.success(done).await;
        let refreshed = self.refresh().await;
        self.notifier.data_changed(EntityKind::Editors).await;
        if let Err(err) = refreshed {
            self.notifier.failure(&err).await;
            return Err(err);
        }
        Ok(())
    }
}
