//! 单元测试共用的内存实现与辅助函数

use crate::directory::auth::{
    AuthBackend, AuthState, LoginRequest, LoginResponse, PasswordChange, Principal, Role,
};
use crate::directory::contact::{Contact, ContactBackend, ContactColor, ContactInput, OrderEntry};
use crate::directory::editor::{Editor, EditorBackend, EditorInput};
use crate::directory::error::{DirectoryError, Result};
use crate::directory::listener::DirectoryListener;
use crate::directory::news::{NewsBackend, NewsInput, NewsItem};
use crate::directory::session::{SessionContext, SessionStore};
use crate::directory::types::{EntityKind, Notice};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use tokio::sync::Notify;

static INIT_LOGGER: Once = Once::new();

pub fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::EnvFilter;

        // 当前 crate 打开 debug，压掉 sqlx 和 HTTP 客户端的噪音
        let filter_layer = EnvFilter::new(
            "info,contact_directory_sdk=debug,sqlx=warn,hyper_util::client=info,reqwest=info",
        );

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .with_test_writer();

        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    });
}

pub fn contact(id: i64, order_index: i64) -> Contact {
    Contact {
        id,
        name: format!("Contact {}", id),
        role: "Manager".to_string(),
        telegram: format!("contact{}", id),
        color: ContactColor::default(),
        created_by: None,
        order_index,
    }
}

pub fn superadmin() -> Principal {
    Principal {
        id: 1,
        username: "root".to_string(),
        role: Role::Superadmin,
    }
}

pub fn editor(id: i64) -> Principal {
    Principal {
        id,
        username: format!("editor{}", id),
        role: Role::Editor,
    }
}

pub async fn memory_store() -> SessionStore {
    SessionStore::open("sqlite::memory:")
        .await
        .expect("in-memory session store")
}

/// 内存会话；传入用户时直接视为已登录（不落盘）
pub async fn session_as(principal: Option<Principal>) -> Arc<SessionContext> {
    let session = SessionContext::new(memory_store().await);
    if let Some(principal) = principal {
        session.adopt("test-token-0001".to_string(), principal);
    }
    Arc::new(session)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn rejected(status: u16, message: &str) -> DirectoryError {
    DirectoryError::Rejected {
        status,
        message: message.to_string(),
    }
}

// ---------------------------------------------------------------------------
// 联系人
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ContactServer {
    contacts: Vec<Contact>,
    next_id: i64,
    saved_orders: Vec<Vec<OrderEntry>>,
    fail_orders: bool,
    reject_writes: Option<String>,
    gate: Option<Arc<Notify>>,
}

impl ContactServer {
    fn sorted(&self) -> Vec<Contact> {
        let mut contacts = self.contacts.clone();
        contacts.sort_by_key(|c| (c.order_index, c.id));
        contacts
    }

    fn check_writable(&self) -> Result<()> {
        match &self.reject_writes {
            Some(message) => Err(rejected(401, message)),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct FakeContactBackend {
    server: Mutex<ContactServer>,
    list_calls: AtomicUsize,
}

impl FakeContactBackend {
    pub fn with(contacts: Vec<Contact>) -> Self {
        let next_id = contacts.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        Self {
            server: Mutex::new(ContactServer {
                contacts,
                next_id,
                ..ContactServer::default()
            }),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// 成功保存过的位置表
    pub fn saved_orders(&self) -> Vec<Vec<OrderEntry>> {
        lock(&self.server).saved_orders.clone()
    }

    pub fn server_len(&self) -> usize {
        lock(&self.server).contacts.len()
    }

    /// 直接改写服务器数据（模拟别的客户端）
    pub fn set_server(&self, contacts: Vec<Contact>) {
        lock(&self.server).contacts = contacts;
    }

    pub fn fail_orders(&self, fail: bool) {
        lock(&self.server).fail_orders = fail;
    }

    pub fn reject_writes(&self, message: &str) {
        lock(&self.server).reject_writes = Some(message.to_string());
    }

    /// 下一次列表请求先取快照，然后挂起直到返回的 `Notify` 被唤醒
    pub fn hold_lists(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.server).gate = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl ContactBackend for FakeContactBackend {
    async fn list_contacts(&self) -> Result<Vec<Contact>> {
        let (snapshot, gate) = {
            let mut server = lock(&self.server);
            (server.sorted(), server.gate.take())
        };
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(snapshot)
    }

    async fn create_contact(&self, input: &ContactInput) -> Result<()> {
        let mut server = lock(&self.server);
        server.check_writable()?;
        let id = server.next_id;
        server.next_id += 1;
        let order_index = server.contacts.len() as i64;
        server.contacts.push(Contact {
            id,
            name: input.name.clone(),
            role: input.role.clone(),
            telegram: input.telegram.clone(),
            color: input.color,
            created_by: None,
            order_index,
        });
        Ok(())
    }

    async fn update_contact(&self, id: i64, input: &ContactInput) -> Result<()> {
        let mut server = lock(&self.server);
        server.check_writable()?;
        let contact = server
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| rejected(404, "contact not found"))?;
        contact.name = input.name.clone();
        contact.role = input.role.clone();
        contact.telegram = input.telegram.clone();
        contact.color = input.color;
        Ok(())
    }

    async fn delete_contact(&self, id: i64) -> Result<()> {
        let mut server = lock(&self.server);
        server.check_writable()?;
        server.contacts.retain(|c| c.id != id);
        Ok(())
    }

    async fn save_order(&self, orders: &[OrderEntry]) -> Result<()> {
        let mut server = lock(&self.server);
        server.check_writable()?;
        if server.fail_orders {
            return Err(rejected(500, "database unavailable"));
        }
        for entry in orders {
            if let Some(contact) = server.contacts.iter_mut().find(|c| c.id == entry.id) {
                contact.order_index = entry.order_index;
            }
        }
        server.saved_orders.push(orders.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 新闻
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeNewsBackend {
    news: Mutex<Vec<NewsItem>>,
    next_id: AtomicUsize,
}

#[async_trait]
impl NewsBackend for FakeNewsBackend {
    async fn list_news(&self) -> Result<Vec<NewsItem>> {
        let mut news = lock(&self.news).clone();
        news.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(news)
    }

    async fn create_news(&self, input: &NewsInput) -> Result<()> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        lock(&self.news).push(NewsItem {
            id,
            title: input.title.clone(),
            description: input.description.clone(),
            date: input.date.clone(),
        });
        Ok(())
    }

    async fn update_news(&self, id: i64, input: &NewsInput) -> Result<()> {
        let mut news = lock(&self.news);
        let item = news
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| rejected(404, "news not found"))?;
        item.title = input.title.clone();
        item.description = input.description.clone();
        item.date = input.date.clone();
        Ok(())
    }

    async fn delete_news(&self, id: i64) -> Result<()> {
        lock(&self.news).retain(|n| n.id != id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 编辑账号
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeEditorBackend {
    editors: Mutex<Vec<Editor>>,
    calls: AtomicUsize,
}

impl FakeEditorBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EditorBackend for FakeEditorBackend {
    async fn list_editors(&self) -> Result<Vec<Editor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.editors).clone())
    }

    async fn create_editor(&self, input: &EditorInput) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut editors = lock(&self.editors);
        if editors.iter().any(|e| e.username == input.username) {
            return Err(rejected(400, "user already exists"));
        }
        let id = editors.iter().map(|e| e.id).max().unwrap_or(1) + 1;
        editors.push(Editor {
            id,
            username: input.username.clone(),
            created_at: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn delete_editor(&self, id: i64) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.editors).retain(|e| e.id != id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 登录
// ---------------------------------------------------------------------------

pub struct FakeAuthBackend {
    username: Option<String>,
    password: Mutex<String>,
    principal: Principal,
    tokens: Mutex<HashSet<String>>,
    offline: AtomicBool,
    principal_lookups: AtomicUsize,
    password_changes: AtomicUsize,
}

impl FakeAuthBackend {
    /// 用户名 + 密码登录，响应中带完整用户信息
    pub fn new(username: &str, password: &str, principal: Principal) -> Self {
        Self::build(Some(username.to_string()), password, principal)
    }

    /// 只有共享密码，响应只含 token 和角色
    pub fn password_only(password: &str, principal: Principal) -> Self {
        Self::build(None, password, principal)
    }

    fn build(username: Option<String>, password: &str, principal: Principal) -> Self {
        Self {
            username,
            password: Mutex::new(password.to_string()),
            principal,
            tokens: Mutex::new(HashSet::new()),
            offline: AtomicBool::new(false),
            principal_lookups: AtomicUsize::new(0),
            password_changes: AtomicUsize::new(0),
        }
    }

    pub fn accept_token(&self, token: &str) {
        lock(&self.tokens).insert(token.to_string());
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn principal_lookups(&self) -> usize {
        self.principal_lookups.load(Ordering::SeqCst)
    }

    pub fn password_changes(&self) -> usize {
        self.password_changes.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DirectoryError::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for FakeAuthBackend {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.ensure_online()?;
        let password_ok = *lock(&self.password) == request.password;
        if request.username != self.username || !password_ok {
            return Err(rejected(401, "invalid credentials"));
        }

        let token = format!("token-{}", uuid::Uuid::new_v4());
        lock(&self.tokens).insert(token.clone());
        let with_identity = self.username.is_some();
        Ok(LoginResponse {
            token,
            role: self.principal.role,
            id: with_identity.then_some(self.principal.id),
            username: with_identity.then(|| self.principal.username.clone()),
        })
    }

    async fn current_principal(&self, token: &str) -> Result<Principal> {
        self.principal_lookups.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        if lock(&self.tokens).contains(token) {
            Ok(self.principal.clone())
        } else {
            Err(rejected(401, "session expired"))
        }
    }

    async fn change_password(&self, token: &str, change: &PasswordChange) -> Result<()> {
        self.ensure_online()?;
        self.password_changes.fetch_add(1, Ordering::SeqCst);
        if !lock(&self.tokens).contains(token) {
            return Err(rejected(401, "session expired"));
        }
        let mut password = lock(&self.password);
        if *password != change.old_password {
            return Err(rejected(400, "current password is incorrect"));
        }
        *password = change.new_password.clone();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 监听器
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingListener {
    changed: Mutex<Vec<EntityKind>>,
    notices: Mutex<Vec<Notice>>,
    states: Mutex<Vec<AuthState>>,
}

impl RecordingListener {
    pub fn changed(&self) -> Vec<EntityKind> {
        lock(&self.changed).clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }

    pub fn states(&self) -> Vec<AuthState> {
        lock(&self.states).clone()
    }
}

#[async_trait]
impl DirectoryListener for RecordingListener {
    async fn on_data_changed(&self, kind: EntityKind) {
        lock(&self.changed).push(kind);
    }

    async fn on_notice(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }

    async fn on_auth_state_changed(&self, state: AuthState) {
        lock(&self.states).push(state);
    }
}
