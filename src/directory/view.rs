//! 页面视图组装
//!
//! 纯函数：输入当前列表与用户，输出可直接渲染的卡片数据。

use crate::directory::auth::{can_manage_editors, can_reorder, visible_contacts, Principal};
use crate::directory::contact::{Contact, ContactColor};
use crate::directory::news::NewsItem;
use serde::Serialize;
use std::collections::HashMap;

const TELEGRAM_BASE: &str = "https://t.me/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactCard {
    pub id: i64,
    pub name: String,
    pub role: String,
    /// 头像上显示的首字母
    pub initial: String,
    pub telegram_url: String,
    pub color: ContactColor,
}

impl From<&Contact> for ContactCard {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id,
            name: contact.name.clone(),
            role: contact.role.clone(),
            initial: initial_of(&contact.name),
            telegram_url: telegram_url(&contact.telegram),
            color: contact.color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsCard {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub date: String,
    /// 借用联系人的配色轮流装饰新闻卡片
    pub accent: Option<ContactColor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicPage {
    pub contacts: Vec<ContactCard>,
    pub news: Vec<NewsCard>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminTab {
    Contacts,
    News,
    Editors,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminContactRow {
    pub card: ContactCard,
    pub draggable: bool,
    /// 创建者用户名（仅超级管理员可见，且编辑列表里能查到时才有）
    pub editor_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminPanel {
    pub tabs: Vec<AdminTab>,
    pub contacts: Vec<AdminContactRow>,
    pub news: Vec<NewsItem>,
}

pub fn initial_of(name: &str) -> String {
    name.trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

pub fn telegram_url(handle: &str) -> String {
    format!("{}{}", TELEGRAM_BASE, handle.trim().trim_start_matches('@'))
}

pub fn news_cards(news: &[NewsItem], contacts: &[Contact]) -> Vec<NewsCard> {
    news.iter()
        .enumerate()
        .map(|(index, item)| NewsCard {
            id: item.id,
            title: item.title.clone(),
            description: item.description.clone(),
            date: item.date.clone(),
            accent: if contacts.is_empty() {
                None
            } else {
                Some(contacts[index % contacts.len()].color)
            },
        })
        .collect()
}

pub fn public_page(contacts: &[Contact], news: &[NewsItem]) -> PublicPage {
    PublicPage {
        contacts: contacts.iter().map(ContactCard::from).collect(),
        news: news_cards(news, contacts),
    }
}

pub fn admin_tabs(principal: &Principal) -> Vec<AdminTab> {
    let mut tabs = vec![AdminTab::Contacts, AdminTab::News];
    if can_manage_editors(principal) {
        tabs.push(AdminTab::Editors);
    }
    tabs
}

pub fn admin_panel(
    principal: &Principal,
    contacts: &[Contact],
    news: &[NewsItem],
    editor_names: &HashMap<i64, String>,
) -> AdminPanel {
    let draggable = can_reorder(principal);
    let annotate = can_manage_editors(principal);
    let rows = visible_contacts(principal, contacts)
        .iter()
        .map(|contact| AdminContactRow {
            card: ContactCard::from(contact),
            draggable,
            editor_name: contact
                .created_by
                .filter(|_| annotate)
                .and_then(|id| editor_names.get(&id).cloned()),
        })
        .collect();

    AdminPanel {
        tabs: admin_tabs(principal),
        contacts: rows,
        news: news.to_vec(),
    }
}
