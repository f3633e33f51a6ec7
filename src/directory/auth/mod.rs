pub mod api;
pub mod models;
pub mod service;

pub use api::{AuthApi, AuthBackend};
pub use models::{
    can_manage_editors, can_reorder, can_see_all_contacts, visible_contacts, AuthState,
    Credentials, LoginRequest, LoginResponse, PasswordChange, Principal, Role,
};
pub use service::AuthService;
