//! 联系人模块
//!
//! 联系人列表的拉取、增删改以及拖拽排序

pub mod api;
pub mod models;
pub mod reorder;
pub mod service;

// 重新导出主要类型和函数
pub use api::{ContactApi, ContactBackend};
pub use models::{Contact, ContactColor, ContactInput, OrderEntry, ReorderRequest};
pub use reorder::{move_contact, position_map, DragEnd, ReorderOutcome};
pub use service::ContactService;
