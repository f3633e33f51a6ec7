//! SDK 统一错误类型
//!
//! 对应四类失败：本地校验、服务器拒绝、网络故障、本地存储故障。
//! 所有错误都不会让进程退出，调用方通过监听器拿到提示文案。

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DirectoryError>;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// 发请求之前就被拦下的表单错误
    #[error("{0}")]
    Validation(String),

    /// 服务器返回了非 2xx 状态码，message 取自响应体的 `error` 字段
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// 本地权限检查未通过（不会发出任何请求）
    #[error("{0}")]
    Forbidden(String),

    #[error("connection error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("session store error: {0}")]
    Storage(String),
}

impl DirectoryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// 401 / 403：会话缺失、过期或权限不足
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Rejected { status, .. } if *status == 401 || *status == 403)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// 面向用户展示的提示文案
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Forbidden(msg) => msg.clone(),
            Self::Rejected { message, .. } => message.clone(),
            Self::Network(_) => "connection error".to_string(),
            Self::Decode(_) => "unexpected server response".to_string(),
            Self::Storage(_) => "local session storage is unavailable".to_string(),
        }
    }
}

impl From<reqwest::Error> for DirectoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
