pub mod directory;

// 重新导出常用类型，方便外部使用
pub use directory::{
    auth::{AuthState, Credentials, Principal, Role},
    client::{ClientConfig, DirectoryClient},
    contact::{Contact, ContactColor, ReorderOutcome},
    error::{DirectoryError, Result},
    forms::{ContactDraft, EditorDraft, Form, NewsDraft, PasswordChangeDraft},
    listener::{DirectoryListener, EmptyDirectoryListener},
};
