//! 联系人目录 CLI 客户端
//!
//! 非交互式：每次调用执行一个子命令。会话 token 保存在本地 SQLite，
//! 因此 `login` 之后的后台命令可以直接使用。

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use contact_directory_sdk::directory::types::{EntityKind, Notice, NoticeLevel};
use contact_directory_sdk::directory::view::{AdminPanel, PublicPage};
use contact_directory_sdk::{
    AuthState, ClientConfig, ContactColor, ContactDraft, Credentials, DirectoryClient,
    DirectoryListener, EditorDraft, Form, NewsDraft, PasswordChangeDraft, ReorderOutcome,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 联系人目录 CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "directory-cli")]
#[command(about = "联系人目录 CLI - 浏览公开页面并管理联系人、新闻和编辑账号", long_about = None)]
struct Args {
    /// 服务根地址
    #[arg(long, default_value = "http://localhost:3000/api")]
    base_url: String,

    /// 本地会话库
    #[arg(long, default_value = "sqlite://directory_session.db?mode=rwc")]
    session_db: String,

    /// 日志级别（RUST_LOG 优先）
    #[arg(long, default_value = "info,contact_directory_sdk=info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 显示公开页面（联系人卡片和新闻）
    Show,
    /// 登录；不带用户名时使用共享密码登录
    Login {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        password: String,
    },
    Logout,
    /// 显示当前登录用户
    Whoami,
    #[command(subcommand)]
    Contact(ContactCommand),
    #[command(subcommand)]
    News(NewsCommand),
    #[command(subcommand)]
    Editor(EditorCommand),
    /// 修改当前账号密码
    Passwd {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Subcommand, Debug)]
enum ContactCommand {
    /// 后台联系人列表（编辑只看到自己创建的）
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        telegram: String,
        #[arg(long, value_enum, default_value_t = ColorArg::PurplePink)]
        color: ColorArg,
    },
    Edit {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        telegram: Option<String>,
        #[arg(long, value_enum)]
        color: Option<ColorArg>,
    },
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// 把 source 拖到 target 的位置
    Move {
        #[arg(long)]
        source: i64,
        #[arg(long)]
        target: i64,
    },
}

#[derive(Subcommand, Debug)]
enum NewsCommand {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        date: String,
    },
    Edit {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum EditorCommand {
    List,
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ColorArg {
    PurplePink,
    BlueCyan,
    Violet,
    Green,
    OrangeRed,
    Pink,
}

impl From<ColorArg> for ContactColor {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::PurplePink => ContactColor::PurplePink,
            ColorArg::BlueCyan => ContactColor::BlueCyan,
            ColorArg::Violet => ContactColor::VioletPurple,
            ColorArg::Green => ContactColor::GreenEmerald,
            ColorArg::OrangeRed => ContactColor::OrangeRed,
            ColorArg::Pink => ContactColor::PinkRose,
        }
    }
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("directory-cli.log")
        .context("无法创建日志文件 directory-cli.log")?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 文件不需要颜色
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();
    Ok(())
}

/// 把客户端事件打到日志里
struct CliListener;

#[async_trait::async_trait]
impl DirectoryListener for CliListener {
    async fn on_data_changed(&self, kind: EntityKind) {
        info!("[CLI] 🔄 数据已变更: {:?}", kind);
    }

    async fn on_notice(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!("[CLI] ✅ {}", notice.message),
            NoticeLevel::Error => error!("[CLI] ❌ {}", notice.message),
        }
    }

    async fn on_auth_state_changed(&self, state: AuthState) {
        match state {
            AuthState::Anonymous => info!("[CLI] 🔓 未登录"),
            AuthState::Authenticating => info!("[CLI] 🔐 正在登录..."),
            AuthState::Authenticated(p) => {
                info!("[CLI] 👤 已登录: {} ({})", p.username, p.role.as_str())
            }
        }
    }
}

fn print_public_page(page: &PublicPage) {
    info!("[CLI] 📋 联系人（共 {} 个）:", page.contacts.len());
    for card in &page.contacts {
        info!(
            "[CLI]   [{}] {} | {} | {} | {}",
            card.initial,
            card.name,
            card.role,
            card.telegram_url,
            card.color.label()
        );
    }
    info!("[CLI] 📰 新闻（共 {} 条）:", page.news.len());
    for card in &page.news {
        info!("[CLI]   #{} {} ({}) - {}", card.id, card.title, card.date, card.description);
    }
}

fn print_admin_contacts(panel: &AdminPanel) {
    info!(
        "[CLI] 📋 后台联系人（共 {} 个，标签页: {:?}）:",
        panel.contacts.len(),
        panel.tabs
    );
    for row in &panel.contacts {
        info!(
            "[CLI]   #{} {} | {} | @{}{}{}",
            row.card.id,
            row.card.name,
            row.card.role,
            row.card
                .telegram_url
                .trim_start_matches("https://t.me/"),
            if row.draggable { " | ↕" } else { "" },
            row.editor_name
                .as_deref()
                .map(|name| format!(" | 创建者: {}", name))
                .unwrap_or_default()
        );
    }
}

async fn run(client: &DirectoryClient, command: Command) -> Result<()> {
    match command {
        Command::Show => print_public_page(&client.public_page()),
        Command::Login { username, password } => {
            let credentials = match username {
                Some(username) => Credentials::UserPassword { username, password },
                None => Credentials::Password(password),
            };
            client.login(&credentials).await?;
        }
        Command::Logout => client.logout().await?,
        Command::Whoami => match client.principal() {
            Some(p) => info!("[CLI] 👤 {} (id={}, {})", p.username, p.id, p.role.as_str()),
            None => info!("[CLI] 🔓 未登录"),
        },
        Command::Contact(cmd) => run_contact(client, cmd).await?,
        Command::News(cmd) => run_news(client, cmd).await?,
        Command::Editor(cmd) => run_editor(client, cmd).await?,
        Command::Passwd { old, new, confirm } => {
            let mut form = Form::new();
            form.edit(PasswordChangeDraft { old, new, confirm });
            client.change_password(&mut form).await?;
        }
    }
    Ok(())
}

async fn run_contact(client: &DirectoryClient, command: ContactCommand) -> Result<()> {
    let panel = client.open_admin().await?;
    match command {
        ContactCommand::List => print_admin_contacts(&panel),
        ContactCommand::Add {
            name,
            role,
            telegram,
            color,
        } => {
            let mut form = Form::new();
            form.edit(ContactDraft {
                id: None,
                name,
                role,
                telegram,
                color: color.into(),
            });
            client.submit_contact(&mut form).await?;
        }
        ContactCommand::Edit {
            id,
            name,
            role,
            telegram,
            color,
        } => {
            // 只允许编辑后台面板里可见的联系人
            let visible = panel.contacts.iter().any(|row| row.card.id == id);
            let Some(contact) = client.contacts().into_iter().find(|c| visible && c.id == id)
            else {
                bail!("联系人不存在或无权编辑: {}", id);
            };
            let mut draft = ContactDraft::from(&contact);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(role) = role {
                draft.role = role;
            }
            if let Some(telegram) = telegram {
                draft.telegram = telegram;
            }
            if let Some(color) = color {
                draft.color = color.into();
            }
            let mut form = Form::new();
            form.edit(draft);
            client.submit_contact(&mut form).await?;
        }
        ContactCommand::Delete { id } => client.delete_contact(id).await?,
        ContactCommand::Move { source, target } => {
            match client.reorder_contact(source, target).await? {
                ReorderOutcome::Persisted => info!("[CLI] ✅ 新顺序已保存"),
                ReorderOutcome::Unchanged => info!("[CLI] 顺序未变化"),
                ReorderOutcome::Reverted => warn!("[CLI] 保存失败，已恢复服务器上的顺序"),
            }
            if let Some(panel) = client.admin_panel() {
                print_admin_contacts(&panel);
            }
        }
    }
    Ok(())
}

async fn run_news(client: &DirectoryClient, command: NewsCommand) -> Result<()> {
    client.open_admin().await?;
    match command {
        NewsCommand::Add {
            title,
            description,
            date,
        } => {
            let mut form = Form::new();
            form.edit(NewsDraft {
                id: None,
                title,
                description,
                date,
            });
            client.submit_news(&mut form).await?;
        }
        NewsCommand::Edit {
            id,
            title,
            description,
            date,
        } => {
            let Some(item) = client.news().into_iter().find(|n| n.id == id) else {
                bail!("新闻不存在: {}", id);
            };
            let mut draft = NewsDraft::from(&item);
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(description) = description {
                draft.description = description;
            }
            if let Some(date) = date {
                draft.date = date;
            }
            let mut form = Form::new();
            form.edit(draft);
            client.submit_news(&mut form).await?;
        }
        NewsCommand::Delete { id } => client.delete_news(id).await?,
    }
    Ok(())
}

async fn run_editor(client: &DirectoryClient, command: EditorCommand) -> Result<()> {
    client.open_admin().await?;
    match command {
        EditorCommand::List => {
            let editors = client.editors();
            info!("[CLI] 👥 编辑账号（共 {} 个）:", editors.len());
            for editor in editors {
                info!(
                    "[CLI]   #{} {} | 创建于 {}",
                    editor.id,
                    editor.username,
                    editor.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        EditorCommand::Add { username, password } => {
            let mut form = Form::new();
            form.edit(EditorDraft { username, password });
            client.submit_editor(&mut form).await?;
        }
        EditorCommand::Delete { id } => client.delete_editor(id).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level)?;

    info!("[CLI] 🚀 联系人目录 CLI");
    info!("[CLI] 🌐 服务地址: {}", args.base_url);

    let config = ClientConfig::new(&args.base_url).with_session_db(args.session_db.clone());
    let client = DirectoryClient::with_listener(config, Arc::new(CliListener))
        .await
        .context("初始化客户端失败")?;

    // 页面数据加载失败不影响 login / logout 等命令
    if let Err(e) = client.start().await {
        warn!("[CLI] 启动加载未完成: {}", e);
    }

    run(&client, args.command).await
}
