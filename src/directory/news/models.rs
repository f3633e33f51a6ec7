//! 新闻模型定义

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// 展示用的日期文本，不做解析
    pub date: String,
}

/// 新建 / 修改新闻的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsInput {
    pub title: String,
    pub description: String,
    pub date: String,
}
