use crate::directory::error::{DirectoryError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// 附带会话 token 的请求头
pub const SESSION_HEADER: &str = "X-Session-Token";

/// 每个请求携带的追踪 ID，便于和服务端日志对照
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// 非 2xx 响应体：`{ "error": "..." }`
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// 数据变更通知涉及的实体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Contacts,
    News,
    Editors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// 面向用户的一次性提示（原来页面里的 toast）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub(crate) fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

struct RawBody {
    bytes: Vec<u8>,
    text: String,
}

/// 读取响应 body 并按状态码分流：非 2xx 转成 `Rejected`
async fn read_body(response: reqwest::Response, operation_name: &str) -> Result<RawBody> {
    let status = response.status();
    let body_bytes = response.bytes().await?;
    let body_str = String::from_utf8_lossy(&body_bytes).into_owned();
    debug!("[HTTP] {} 响应 Body: {}", operation_name, body_str);

    if !status.is_success() {
        error!(
            "[HTTP] {} 请求失败，HTTP状态: {}, 响应: {}",
            operation_name, status, body_str
        );
        let message = serde_json::from_slice::<ErrorBody>(&body_bytes)
            .ok()
            .and_then(|body| body.error)
            .filter(|msg| !msg.trim().is_empty())
            .unwrap_or_else(|| format!("request failed with HTTP {}", status.as_u16()));
        return Err(DirectoryError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    info!("[HTTP] {} 请求成功，HTTP状态: {}", operation_name, status);
    Ok(RawBody {
        bytes: body_bytes.to_vec(),
        text: body_str,
    })
}

/// 通用 HTTP 响应处理：成功时把 body 反序列化为 `T`
pub async fn handle_http_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation_name: &str,
) -> Result<T> {
    let body = read_body(response, operation_name).await?;
    serde_json::from_slice(&body.bytes).map_err(|e| {
        error!(
            "[HTTP] {} 反序列化失败: {:?}\n原始响应: {}",
            operation_name, e, body.text
        );
        DirectoryError::Decode(e.to_string())
    })
}

/// 只关心状态码的写操作（POST/PUT/DELETE/PATCH），body 内容被忽略
pub async fn handle_empty_response(response: reqwest::Response, operation_name: &str) -> Result<()> {
    read_body(response, operation_name).await.map(|_| ())
}
