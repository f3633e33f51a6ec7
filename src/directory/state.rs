//! 本地列表状态（带版本号）
//!
//! 每次本地修改都会让 generation 加一。拉取快照前先记下当时的 generation，
//! 回来时如果已经有更新的本地修改（比如新的乐观排序），这份快照就作废。

use std::sync::{Mutex, MutexGuard};

struct Inner<T> {
    items: Vec<T>,
    generation: u64,
}

pub struct ListState<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Clone> Default for ListState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ListState<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: Vec::new(),
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // 锁内不会 panic，中毒时直接沿用内部数据
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// 在同一把锁内读取并修改列表；闭包返回 `None` 表示不修改
    ///
    /// 修改成功时返回闭包的结果和新的 generation。
    pub fn mutate<R>(&self, f: impl FnOnce(&[T]) -> Option<(Vec<T>, R)>) -> Option<(R, u64)> {
        let mut inner = self.lock();
        let (items, result) = f(&inner.items)?;
        inner.items = items;
        inner.generation += 1;
        Some((result, inner.generation))
    }

    /// 仅当 generation 仍等于 `seen` 时才用服务器快照整体替换
    pub fn replace_if_current(&self, items: Vec<T>, seen: u64) -> bool {
        let mut inner = self.lock();
        if inner.generation != seen {
            return false;
        }
        inner.items = items;
        inner.generation += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_applied_when_nothing_changed_meanwhile() {
        let state: ListState<u32> = ListState::new();
        let seen = state.generation();
        assert!(state.replace_if_current(vec![1, 2, 3], seen));
        assert_eq!(state.snapshot(), vec![1, 2, 3]);
        assert_eq!(state.generation(), seen + 1);
    }

    #[test]
    fn stale_snapshot_does_not_clobber_newer_local_state() {
        let state: ListState<u32> = ListState::new();
        assert!(state.replace_if_current(vec![1, 2, 3], 0));

        // 拉取开始
        let seen = state.generation();
        // 拉取途中发生了一次乐观修改
        state.mutate(|items| {
            let mut next = items.to_vec();
            next.reverse();
            Some((next, ()))
        });
        // 旧快照回来了
        assert!(!state.replace_if_current(vec![9], seen));
        assert_eq!(state.snapshot(), vec![3, 2, 1]);
    }

    #[test]
    fn declined_mutation_keeps_generation() {
        let state: ListState<u32> = ListState::new();
        let before = state.generation();
        let out = state.mutate(|_| None::<(Vec<u32>, ())>);
        assert!(out.is_none());
        assert_eq!(state.generation(), before);
    }
}
