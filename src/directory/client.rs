//! 目录客户端
//!
//! 把会话、各实体服务和表单提交串起来，对外提供页面级别的操作。

use crate::directory::auth::{
    can_manage_editors, AuthApi, AuthBackend, AuthService, AuthState, Credentials, Principal,
};
use crate::directory::contact::{
    Contact, ContactApi, ContactBackend, ContactService, DragEnd, ReorderOutcome,
};
use crate::directory::editor::{Editor, EditorApi, EditorBackend, EditorService};
use crate::directory::error::{DirectoryError, Result};
use crate::directory::forms::{ContactDraft, Draft, EditorDraft, Form, NewsDraft, PasswordChangeDraft};
use crate::directory::listener::{DirectoryListener, EmptyDirectoryListener, Notifier};
use crate::directory::news::{NewsApi, NewsBackend, NewsItem, NewsService};
use crate::directory::session::{SessionContext, SessionStore};
use crate::directory::view::{self, AdminPanel, PublicPage};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub contacts_url: String,
    pub news_url: String,
    pub editors_url: String,
    pub auth_url: String,
    pub change_password_url: String,
    /// 会话 token 使用的本地 SQLite 数据库 URL
    ///
    /// 例如：`sqlite://directory_session.db?mode=rwc`
    pub session_db_url: String,
}

impl ClientConfig {
    /// 按默认路径从服务根地址派生各接口地址
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            contacts_url: format!("{}/contacts", base),
            news_url: format!("{}/news", base),
            editors_url: format!("{}/editors", base),
            auth_url: format!("{}/auth", base),
            change_password_url: format!("{}/change-password", base),
            session_db_url: "sqlite://directory_session.db?mode=rwc".to_string(),
        }
    }

    pub fn with_session_db(mut self, db_url: impl Into<String>) -> Self {
        self.session_db_url = db_url.into();
        self
    }
}

/// 各实体的后端实现；默认是 HTTP，测试里换成内存实现
pub struct Backends {
    pub contacts: Arc<dyn ContactBackend>,
    pub news: Arc<dyn NewsBackend>,
    pub editors: Arc<dyn EditorBackend>,
    pub auth: Arc<dyn AuthBackend>,
}

impl Backends {
    pub fn http(config: &ClientConfig, client: reqwest::Client, session: Arc<SessionContext>) -> Self {
        Self {
            contacts: Arc::new(ContactApi::new(
                client.clone(),
                config.contacts_url.clone(),
                session.clone(),
            )),
            news: Arc::new(NewsApi::new(
                client.clone(),
                config.news_url.clone(),
                session.clone(),
            )),
            editors: Arc::new(EditorApi::new(
                client.clone(),
                config.editors_url.clone(),
                session,
            )),
            auth: Arc::new(AuthApi::new(
                client,
                config.auth_url.clone(),
                config.change_password_url.clone(),
            )),
        }
    }
}

pub struct DirectoryClient {
    session: Arc<SessionContext>,
    auth: AuthService,
    contacts: ContactService,
    news: NewsService,
    editors: EditorService,
    notifier: Notifier,
}

impl DirectoryClient {
    /// 打开本地会话库并创建基于 HTTP 的客户端（不发任何请求）
    pub async fn connect(config: ClientConfig) -> anyhow::Result<Self> {
        Self::with_listener(config, Arc::new(EmptyDirectoryListener)).await
    }

    pub async fn with_listener(
        config: ClientConfig,
        listener: Arc<dyn DirectoryListener>,
    ) -> anyhow::Result<Self> {
        let store = SessionStore::open(&config.session_db_url)
            .await
            .context("打开本地会话库失败")?;
        let session = Arc::new(SessionContext::new(store));
        let http = reqwest::Client::builder()
            .build()
            .context("创建 HTTP 客户端失败")?;
        let backends = Backends::http(&config, http, session.clone());
        info!("[Client] 客户端已创建，联系人接口: {}", config.contacts_url);
        Ok(Self::with_backends(session, backends, listener))
    }

    pub fn with_backends(
        session: Arc<SessionContext>,
        backends: Backends,
        listener: Arc<dyn DirectoryListener>,
    ) -> Self {
        Self {
            auth: AuthService::new(backends.auth, session.clone(), listener.clone()),
            contacts: ContactService::new(backends.contacts, session.clone(), listener.clone()),
            news: NewsService::new(backends.news, listener.clone()),
            editors: EditorService::new(backends.editors, session.clone(), listener.clone()),
            notifier: Notifier::new(listener),
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth.state()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.auth.principal()
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.contacts.contacts()
    }

    pub fn news(&self) -> Vec<NewsItem> {
        self.news.news()
    }

    pub fn editors(&self) -> Vec<Editor> {
        self.editors.editors()
    }

    /// 启动：恢复上次会话，然后加载公开页面
    pub async fn start(&self) -> Result<()> {
        if let Some(principal) = self.auth.restore().await? {
            info!("[Client] 已恢复登录: {}", principal.username);
        }
        self.load_page().await
    }

    /// 并发拉取联系人和新闻；两边互不影响，返回第一个错误
    pub async fn load_page(&self) -> Result<()> {
        let (contacts, news) = tokio::join!(self.contacts.refresh(), self.news.refresh());
        let mut first_error = None;
        for result in [contacts, news] {
            if let Err(err) = result {
                warn!("[Client] 页面数据加载失败: {}", err);
                self.notifier.failure(&err).await;
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Principal> {
        self.auth.login(credentials).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.auth.logout().await
    }

    pub async fn change_password(&self, form: &mut Form<PasswordChangeDraft>) -> Result<()> {
        let change = self.validated(form).await?;
        self.auth.change_password(&change).await?;
        form.clear();
        Ok(())
    }

    /// 进入后台：刷新页面数据，超级管理员额外加载编辑列表
    pub async fn open_admin(&self) -> Result<AdminPanel> {
        let principal = self.require_principal()?;
        self.load_page().await?;
        if can_manage_editors(&principal) {
            self.editors.refresh().await?;
        }
        Ok(self.panel_for(&principal))
    }

    pub fn public_page(&self) -> PublicPage {
        view::public_page(&self.contacts.contacts(), &self.news.news())
    }

    /// 按当前本地状态组装后台面板；未登录时为 `None`
    pub fn admin_panel(&self) -> Option<AdminPanel> {
        self.principal().map(|p| self.panel_for(&p))
    }

    fn panel_for(&self, principal: &Principal) -> AdminPanel {
        view::admin_panel(
            principal,
            &self.contacts.contacts(),
            &self.news.news(),
            &self.editors.usernames(),
        )
    }

    fn require_principal(&self) -> Result<Principal> {
        self.principal()
            .ok_or_else(|| DirectoryError::Forbidden("sign in first".to_string()))
    }

    /// 本地校验；失败时发出提示并保留草稿
    async fn validated<D: Draft>(&self, form: &Form<D>) -> Result<D::Output> {
        match form.validate() {
            Ok(output) => Ok(output),
            Err(err) => {
                warn!("[Client] 表单校验失败: {}", err);
                self.notifier.failure(&err).await;
                Err(err)
            }
        }
    }

    /// 提交联系人表单（有 id 为修改，否则新建），成功后关闭表单
    pub async fn submit_contact(&self, form: &mut Form<ContactDraft>) -> Result<()> {
        let submission = self.validated(form).await?;
        self.contacts.save(&submission).await?;
        form.clear();
        Ok(())
    }

    pub async fn delete_contact(&self, id: i64) -> Result<()> {
        self.contacts.delete(id).await
    }

    pub async fn reorder_contact(&self, source_id: i64, target_id: i64) -> Result<ReorderOutcome> {
        self.contacts.reorder(source_id, target_id).await
    }

    pub async fn handle_drag_end(&self, event: DragEnd) -> Result<ReorderOutcome> {
        self.contacts.handle_drag_end(event).await
    }

    pub async fn submit_news(&self, form: &mut Form<NewsDraft>) -> Result<()> {
        let submission = self.validated(form).await?;
        self.news.save(&submission).await?;
        form.clear();
        Ok(())
    }

    pub async fn delete_news(&self, id: i64) -> Result<()> {
        self.news.delete(id).await
    }

    pub async fn submit_editor(&self, form: &mut Form<EditorDraft>) -> Result<()> {
        let input = self.validated(form).await?;
        self.editors.create(&input).await?;
        form.clear();
        Ok(())
    }

    pub async fn delete_editor(&self, id: i64) -> Result<()> {
        self.editors.delete(id).await
    }
}
