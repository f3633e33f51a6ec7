//! 编辑账号管理模块（仅超级管理员）

pub mod api;
pub mod models;
pub mod service;

pub use api::{EditorApi, EditorBackend};
pub use models::{Editor, EditorInput};
pub use service::EditorService;
