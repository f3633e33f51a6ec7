//! 登录相关模型与权限判断

use crate::directory::contact::Contact;
use crate::directory::error::{DirectoryError, Result};
use serde::{Deserialize, Serialize};

/// 运营账号角色（封闭枚举，代替散落各处的字符串比较）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Editor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Editor => "editor",
        }
    }
}

/// 当前会话对应的用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// 只有超级管理员可以拖拽排序
pub fn can_reorder(principal: &Principal) -> bool {
    principal.role == Role::Superadmin
}

/// 超级管理员看到全部联系人，编辑只看到自己创建的
pub fn can_see_all_contacts(principal: &Principal) -> bool {
    principal.role == Role::Superadmin
}

pub fn can_manage_editors(principal: &Principal) -> bool {
    principal.role == Role::Superadmin
}

/// 按权限过滤后台可见的联系人，保持原有顺序
pub fn visible_contacts(principal: &Principal, contacts: &[Contact]) -> Vec<Contact> {
    if can_see_all_contacts(principal) {
        return contacts.to_vec();
    }
    contacts
        .iter()
        .filter(|c| c.created_by == Some(principal.id))
        .cloned()
        .collect()
}

/// 登录凭据：早期版本只有一个共享密码，后来改成用户名 + 密码
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Password(String),
    UserPassword { username: String, password: String },
}

impl Credentials {
    pub fn validate(&self) -> Result<()> {
        match self {
            Credentials::Password(password) if password.trim().is_empty() => {
                Err(DirectoryError::validation("enter password"))
            }
            Credentials::UserPassword { username, password }
                if username.trim().is_empty() || password.is_empty() =>
            {
                Err(DirectoryError::validation("enter login and password"))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn to_request(&self) -> LoginRequest {
        match self {
            Credentials::Password(password) => LoginRequest {
                username: None,
                password: password.clone(),
            },
            Credentials::UserPassword { username, password } => LoginRequest {
                username: Some(username.trim().to_string()),
                password: password.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password: String,
}

/// 登录响应：部分版本还会带上用户 id 和用户名
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
}

impl LoginResponse {
    /// 响应本身足以构造用户信息时直接返回
    pub fn principal(&self) -> Option<Principal> {
        match (self.id, &self.username) {
            (Some(id), Some(username)) => Some(Principal {
                id,
                username: username.clone(),
                role: self.role,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

/// 登录状态机
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated(Principal),
}

impl AuthState {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            AuthState::Authenticated(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}
