//! 新闻模块

pub mod api;
pub mod models;
pub mod service;

pub use api::{NewsApi, NewsBackend};
pub use models::{NewsInput, NewsItem};
pub use service::NewsService;
