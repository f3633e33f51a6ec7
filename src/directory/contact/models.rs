//! 联系人模型定义

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 联系人卡片的渐变色（固定的几种取值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContactColor {
    #[default]
    PurplePink,
    BlueCyan,
    VioletPurple,
    GreenEmerald,
    OrangeRed,
    PinkRose,
}

impl ContactColor {
    pub const ALL: [ContactColor; 6] = [
        ContactColor::PurplePink,
        ContactColor::BlueCyan,
        ContactColor::VioletPurple,
        ContactColor::GreenEmerald,
        ContactColor::OrangeRed,
        ContactColor::PinkRose,
    ];

    /// 服务器存储的渐变 token
    pub fn token(&self) -> &'static str {
        match self {
            ContactColor::PurplePink => "from-purple-500 to-pink-500",
            ContactColor::BlueCyan => "from-blue-500 to-cyan-500",
            ContactColor::VioletPurple => "from-violet-500 to-purple-500",
            ContactColor::GreenEmerald => "from-green-500 to-emerald-500",
            ContactColor::OrangeRed => "from-orange-500 to-red-500",
            ContactColor::PinkRose => "from-pink-500 to-rose-500",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContactColor::PurplePink => "Purple-pink",
            ContactColor::BlueCyan => "Blue-cyan",
            ContactColor::VioletPurple => "Violet",
            ContactColor::GreenEmerald => "Green",
            ContactColor::OrangeRed => "Orange-red",
            ContactColor::PinkRose => "Pink",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.token() == token.trim())
    }
}

impl Serialize for ContactColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

impl<'de> Deserialize<'de> for ContactColor {
    /// 未知或缺失的 token 退回默认色，不让一条脏数据拖垮整个列表
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .and_then(ContactColor::from_token)
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub role: String,
    /// Telegram 用户名，不带 @
    pub telegram: String,
    #[serde(default)]
    pub color: ContactColor,
    /// 创建该联系人的编辑 id
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub order_index: i64,
}

/// 新建 / 修改联系人的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactInput {
    pub name: String,
    pub role: String,
    pub telegram: String,
    pub color: ContactColor,
}

/// 批量排序中的一项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub id: i64,
    pub order_index: i64,
}

/// `PATCH` 请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub orders: Vec<OrderEntry>,
}
