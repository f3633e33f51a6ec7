pub mod auth;
pub mod client;
pub mod contact;
pub mod db;
pub mod editor;
pub mod error;
pub mod forms;
pub mod listener;
pub mod news;
pub mod session;
pub mod state;
pub mod types;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

// 重新导出会话相关类型
pub use session::{SessionContext, SessionStore, SESSION_TOKEN_KEY};
pub use types::{EntityKind, Notice, NoticeLevel};
