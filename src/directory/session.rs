//! 会话上下文
//!
//! token 持久化在本地 SQLite（key 固定为 `session_token`），内存中保存当前 token 与用户。
//! 所有需要鉴权的 API 都显式持有 `Arc<SessionContext>`，而不是去读全局存储。

use crate::directory::auth::Principal;
use crate::directory::error::Result;
use crate::directory::types::SESSION_HEADER;
use sqlx::{Pool, Row, Sqlite};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// 跨重启保持不变的存储键
pub const SESSION_TOKEN_KEY: &str = "session_token";

/// 本地 key/value 存储（基于 sqlx）
#[derive(Clone)]
pub struct SessionStore {
    db: Pool<Sqlite>,
}

impl SessionStore {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 打开（必要时创建）本地数据库并执行迁移
    pub async fn open(db_url: &str) -> anyhow::Result<Self> {
        let db = crate::directory::db::create_sqlite_pool_with_migration(db_url).await?;
        Ok(Self::new(db))
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM local_session WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO local_session (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.db)
        .await?;
        debug!("[Session/DB] 写入 {}", key);
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM local_session WHERE key = ?")
            .bind(key)
            .execute(&self.db)
            .await?;
        debug!("[Session/DB] 删除 {}", key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct ActiveSession {
    token: String,
    principal: Principal,
}

pub struct SessionContext {
    store: SessionStore,
    current: RwLock<Option<ActiveSession>>,
}

impl SessionContext {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            current: RwLock::new(None),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<ActiveSession>> {
        self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<ActiveSession>> {
        self.current.write().unwrap_or_else(|e| e.into_inner())
    }

    /// 启动时读取上次持久化的 token（尚未校验，不会进入内存会话）
    pub async fn stored_token(&self) -> Result<Option<String>> {
        self.store.get(SESSION_TOKEN_KEY).await
    }

    /// 登录成功：持久化 token 并建立内存会话
    pub async fn establish(&self, token: String, principal: Principal) -> Result<()> {
        self.store.put(SESSION_TOKEN_KEY, &token).await?;
        info!(
            "[Session] ✅ 会话建立: {} ({})",
            principal.username,
            principal.role.as_str()
        );
        *self.write() = Some(ActiveSession { token, principal });
        Ok(())
    }

    /// 已持久化的 token 校验通过后装入内存
    pub fn adopt(&self, token: String, principal: Principal) {
        info!("[Session] 恢复会话: {}", principal.username);
        *self.write() = Some(ActiveSession { token, principal });
    }

    /// 登出或 token 校验失败：清理内存和本地存储
    pub async fn clear(&self) -> Result<()> {
        *self.write() = None;
        self.store.remove(SESSION_TOKEN_KEY).await?;
        info!("[Session] 会话已清除");
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.token.clone())
    }

    pub fn principal(&self) -> Option<Principal> {
        self.read().as_ref().map(|s| s.principal.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// 有 token 时附加 `X-Session-Token` 请求头
    pub fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token() {
            Some(token) => builder.header(SESSION_HEADER, token),
            None => builder,
        }
    }
}
