//! 联系人拖拽排序
//!
//! 两阶段提交：先在本地应用新顺序（乐观更新），再把完整位置表一次性提交给服务器。
//! 提交失败时不手工回滚，而是重新拉取服务器上的权威列表。

use crate::directory::auth::can_reorder;
use crate::directory::contact::models::{Contact, OrderEntry};
use crate::directory::contact::service::ContactService;
use crate::directory::error::{DirectoryError, Result};
use crate::directory::types::EntityKind;
use tracing::{debug, info, warn};

/// 一次拖拽结束事件；`target_id` 为空表示拖到了列表外
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragEnd {
    pub source_id: i64,
    pub target_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// 前置条件不满足，没有发请求
    Unchanged,
    /// 服务器已确认新顺序
    Persisted,
    /// 提交失败，本地已替换为服务器快照
    Reverted,
}

/// 把 `source_id` 移动到 `target_id` 所在位置（先删除再插入，中间元素依次平移）
///
/// 两个 id 相同或任一不存在时返回 `None`。返回列表的 `order_index` 已按新位置重写。
pub fn move_contact(contacts: &[Contact], source_id: i64, target_id: i64) -> Option<Vec<Contact>> {
    if source_id == target_id {
        return None;
    }
    let from = contacts.iter().position(|c| c.id == source_id)?;
    let to = contacts.iter().position(|c| c.id == target_id)?;

    let mut moved = contacts.to_vec();
    let item = moved.remove(from);
    moved.insert(to, item);
    for (index, contact) in moved.iter_mut().enumerate() {
        contact.order_index = index as i64;
    }
    Some(moved)
}

/// 位置表：每个联系人的 order_index 等于它在列表中的下标
pub fn position_map(contacts: &[Contact]) -> Vec<OrderEntry> {
    contacts
        .iter()
        .enumerate()
        .map(|(index, c)| OrderEntry {
            id: c.id,
            order_index: index as i64,
        })
        .collect()
}

impl ContactService {
    pub async fn handle_drag_end(&self, event: DragEnd) -> Result<ReorderOutcome> {
        match event.target_id {
            Some(target_id) => self.reorder(event.source_id, target_id).await,
            None => Ok(ReorderOutcome::Unchanged),
        }
    }

    pub async fn reorder(&self, source_id: i64, target_id: i64) -> Result<ReorderOutcome> {
        let allowed = self
            .session
            .principal()
            .map(|p| can_reorder(&p))
            .unwrap_or(false);
        if !allowed {
            warn!("[Reorder] 当前用户无排序权限");
            return Err(DirectoryError::Forbidden(
                "reordering is available to superadmins only".to_string(),
            ));
        }

        let applied = self.state.mutate(|contacts| {
            let moved = move_contact(contacts, source_id, target_id)?;
            let orders = position_map(&moved);
            Some((moved, orders))
        });
        let Some((orders, generation)) = applied else {
            debug!(
                "[Reorder] 无需排序: source={}, target={}",
                source_id, target_id
            );
            return Ok(ReorderOutcome::Unchanged);
        };

        info!(
            "[Reorder] 乐观更新: {} -> {} 的位置 (generation={})",
            source_id, target_id, generation
        );

        match self.backend.save_order(&orders).await {
            Ok(()) => {
                info!("[Reorder] ✅ 新顺序已保存");
                self.notifier.data_changed(EntityKind::Contacts).await;
                Ok(ReorderOutcome::Persisted)
            }
            Err(err) => {
                warn!("[Reorder] 保存顺序失败，重新拉取服务器列表: {}", err);
                self.notifier
                    .error(&format!("failed to save order: {}", err.user_message()))
                    .await;
                // 拉取期间若又有新的本地修改，快照会被丢弃，随后再拉一次
                self.refresh_until_current().await?;
                Ok(ReorderOutcome::Reverted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::contact::models::ContactInput;
    use crate::directory::test_support::{
        contact, editor, init_test_logger, session_as, superadmin, FakeContactBackend,
        RecordingListener,
    };
    use crate::directory::types::NoticeLevel;
    use std::sync::Arc;
    use std::time::Duration;

    fn ids(contacts: &[Contact]) -> Vec<i64> {
        contacts.iter().map(|c| c.id).collect()
    }

    fn three() -> Vec<Contact> {
        vec![contact(1, 0), contact(2, 1), contact(3, 2)]
    }

    #[test]
    fn dragging_last_onto_first() {
        let moved = move_contact(&three(), 3, 1).unwrap();
        assert_eq!(ids(&moved), vec![3, 1, 2]);
        assert_eq!(
            position_map(&moved),
            vec![
                OrderEntry { id: 3, order_index: 0 },
                OrderEntry { id: 1, order_index: 1 },
                OrderEntry { id: 2, order_index: 2 },
            ]
        );
    }

    #[test]
    fn move_matches_remove_then_insert_for_every_pair() {
        let n = 6;
        let list: Vec<Contact> = (0..n).map(|i| contact(10 + i, i)).collect();
        for i in 0..n as usize {
            for j in 0..n as usize {
                let source = list[i].id;
                let target = list[j].id;
                let result = move_contact(&list, source, target);
                if i == j {
                    assert!(result.is_none());
                    continue;
                }
                let mut expected = ids(&list);
                let item = expected.remove(i);
                expected.insert(j, item);

                let moved = result.unwrap();
                assert_eq!(ids(&moved), expected, "move {} -> {}", i, j);
                let indices: Vec<i64> = position_map(&moved).iter().map(|e| e.order_index).collect();
                assert_eq!(indices, (0..n).collect::<Vec<i64>>());
            }
        }
    }

    #[test]
    fn unknown_ids_are_ignored() {
        assert!(move_contact(&three(), 9, 1).is_none());
        assert!(move_contact(&three(), 1, 9).is_none());
        assert!(move_contact(&[], 1, 2).is_none());
    }

    async fn service_with(
        backend: Arc<FakeContactBackend>,
        listener: Arc<RecordingListener>,
        admin: bool,
    ) -> Arc<ContactService> {
        let principal = if admin { superadmin() } else { editor(7) };
        let service = Arc::new(ContactService::new(
            backend,
            session_as(Some(principal)).await,
            listener,
        ));
        service.refresh().await.unwrap();
        service
    }

    #[tokio::test]
    async fn successful_reorder_keeps_optimistic_order() {
        init_test_logger();
        let backend = Arc::new(FakeContactBackend::with(three()));
        let listener = Arc::new(RecordingListener::default());
        let service = service_with(backend.clone(), listener.clone(), true).await;
        let fetches = backend.list_calls();

        let outcome = service.reorder(3, 1).await.unwrap();

        assert_eq!(outcome, ReorderOutcome::Persisted);
        assert_eq!(ids(&service.contacts()), vec![3, 1, 2]);
        assert_eq!(backend.saved_orders().len(), 1);
        assert_eq!(backend.saved_orders()[0], position_map(&service.contacts()));
        // 成功时不重新拉取
        assert_eq!(backend.list_calls(), fetches);
        assert_eq!(listener.changed(), vec![EntityKind::Contacts]);
    }

    #[tokio::test]
    async fn same_id_is_a_no_op() {
        init_test_logger();
        let backend = Arc::new(FakeContactBackend::with(three()));
        let listener = Arc::new(RecordingListener::default());
        let service = service_with(backend.clone(), listener.clone(), true).await;
        let generation = service.generation();

        assert_eq!(service.reorder(2, 2).await.unwrap(), ReorderOutcome::Unchanged);
        assert_eq!(
            service
                .handle_drag_end(DragEnd {
                    source_id: 2,
                    target_id: None
                })
                .await
                .unwrap(),
            ReorderOutcome::Unchanged
        );

        assert_eq!(service.generation(), generation);
        assert!(backend.saved_orders().is_empty());
        assert!(listener.changed().is_empty());
    }

    #[tokio::test]
    async fn failed_save_reverts_to_fresh_server_order() {
        init_test_logger();
        let backend = Arc::new(FakeContactBackend::with(three()));
        let listener = Arc::new(RecordingListener::default());
        let service = service_with(backend.clone(), listener.clone(), true).await;

        // 期间服务器上的顺序被别人改过，回滚应以服务器最新数据为准
        backend.set_server(vec![contact(2, 0), contact(1, 1), contact(3, 2)]);
        backend.fail_orders(true);

        let outcome = service.reorder(3, 1).await.unwrap();

        assert_eq!(outcome, ReorderOutcome::Reverted);
        assert_eq!(ids(&service.contacts()), vec![2, 1, 3]);
        let notices = listener.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(listener.changed().is_empty());
    }

    #[tokio::test]
    async fn editors_cannot_reorder() {
        init_test_logger();
        let backend = Arc::new(FakeContactBackend::with(three()));
        let listener = Arc::new(RecordingListener::default());
        let service = service_with(backend.clone(), listener, false).await;

        let err = service.reorder(3, 1).await.unwrap_err();

        assert!(matches!(err, DirectoryError::Forbidden(_)));
        assert_eq!(ids(&service.contacts()), vec![1, 2, 3]);
        assert!(backend.saved_orders().is_empty());
    }

    #[tokio::test]
    async fn late_revert_does_not_clobber_newer_reorder() {
        init_test_logger();
        let backend = Arc::new(FakeContactBackend::with(three()));
        let listener = Arc::new(RecordingListener::default());
        let service = service_with(backend.clone(), listener, true).await;
        let fetches = backend.list_calls();

        backend.fail_orders(true);
        let gate = backend.hold_lists();

        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.reorder(3, 1).await })
        };

        // 等第一次排序失败并进入重新拉取
        while backend.list_calls() == fetches {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // 第二次排序在旧快照返回前完成
        backend.fail_orders(false);
        assert_eq!(service.reorder(1, 2).await.unwrap(), ReorderOutcome::Persisted);
        assert_eq!(ids(&service.contacts()), vec![3, 2, 1]);

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), ReorderOutcome::Reverted);

        // 旧快照 [1, 2, 3] 被丢弃，重新拉到的是第二次排序后的顺序
        assert_eq!(ids(&service.contacts()), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn create_overlapping_reorder_still_lands_locally() {
        init_test_logger();
        let backend = Arc::new(FakeContactBackend::with(three()));
        let listener = Arc::new(RecordingListener::default());
        let service = service_with(backend.clone(), listener, true).await;
        let fetches = backend.list_calls();

        let gate = backend.hold_lists();
        let create = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create(&ContactInput {
                        name: "New".into(),
                        role: "Support".into(),
                        telegram: "new".into(),
                        color: Default::default(),
                    })
                    .await
            })
        };

        // 等新建完成并进入重新拉取
        while backend.list_calls() == fetches {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(service.reorder(3, 1).await.unwrap(), ReorderOutcome::Persisted);

        gate.notify_one();
        create.await.unwrap().unwrap();

        // 旧快照被丢弃后再次拉取，新联系人和新顺序都在
        assert_eq!(ids(&service.contacts()), vec![3, 1, 2, 4]);
        assert_eq!(service.contacts().len(), backend.server_len());
    }
}
