//! 后台表单草稿与本地校验
//!
//! 校验失败不会发请求，也不会改动任何列表状态。

use crate::directory::auth::PasswordChange;
use crate::directory::contact::{Contact, ContactColor, ContactInput};
use crate::directory::editor::EditorInput;
use crate::directory::error::{DirectoryError, Result};
use crate::directory::news::{NewsInput, NewsItem};

/// 可校验的表单草稿
pub trait Draft: Clone + Default {
    type Output;

    fn validate(&self) -> Result<Self::Output>;
}

/// 一个表单：要么关闭，要么持有一份草稿
///
/// 只有提交成功才清空；提交失败时草稿保留，方便用户修改后重试。
#[derive(Debug, Clone, Default)]
pub struct Form<D> {
    draft: Option<D>,
}

impl<D: Draft> Form<D> {
    pub fn new() -> Self {
        Self { draft: None }
    }

    /// 打开一份空白草稿（新建）
    pub fn open(&mut self) -> &mut D {
        self.draft.insert(D::default())
    }

    /// 用已有数据预填草稿（编辑）
    pub fn edit(&mut self, draft: D) -> &mut D {
        self.draft.insert(draft)
    }

    pub fn cancel(&mut self) {
        self.draft = None;
    }

    pub fn draft(&self) -> Option<&D> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut D> {
        self.draft.as_mut()
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn validate(&self) -> Result<D::Output> {
        match &self.draft {
            Some(draft) => draft.validate(),
            None => Err(DirectoryError::validation("form is not open")),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.draft = None;
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// 去掉首尾空白和开头的 `@`
pub fn normalize_telegram(handle: &str) -> String {
    let trimmed = handle.trim();
    trimmed.strip_prefix('@').unwrap_or(trimmed).trim().to_string()
}

/// 校验通过的联系人表单；`id` 有值表示更新
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub id: Option<i64>,
    pub input: ContactInput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub id: Option<i64>,
    pub name: String,
    pub role: String,
    pub telegram: String,
    pub color: ContactColor,
}

impl ContactDraft {
    pub fn new() -> Self {
        Self::default()
    }
}

impl From<&Contact> for ContactDraft {
    fn from(contact: &Contact) -> Self {
        Self {
            id: Some(contact.id),
            name: contact.name.clone(),
            role: contact.role.clone(),
            telegram: contact.telegram.clone(),
            color: contact.color,
        }
    }
}

impl Draft for ContactDraft {
    type Output = ContactSubmission;

    fn validate(&self) -> Result<ContactSubmission> {
        let telegram = normalize_telegram(&self.telegram);
        if blank(&self.name) || blank(&self.role) || telegram.is_empty() {
            return Err(DirectoryError::validation("fill all contact fields"));
        }
        Ok(ContactSubmission {
            id: self.id,
            input: ContactInput {
                name: self.name.trim().to_string(),
                role: self.role.trim().to_string(),
                telegram,
                color: self.color,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsSubmission {
    pub id: Option<i64>,
    pub input: NewsInput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsDraft {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub date: String,
}

impl From<&NewsItem> for NewsDraft {
    fn from(item: &NewsItem) -> Self {
        Self {
            id: Some(item.id),
            title: item.title.clone(),
            description: item.description.clone(),
            date: item.date.clone(),
        }
    }
}

impl Draft for NewsDraft {
    type Output = NewsSubmission;

    fn validate(&self) -> Result<NewsSubmission> {
        if blank(&self.title) || blank(&self.description) || blank(&self.date) {
            return Err(DirectoryError::validation("fill all news fields"));
        }
        Ok(NewsSubmission {
            id: self.id,
            input: NewsInput {
                title: self.title.trim().to_string(),
                description: self.description.trim().to_string(),
                date: self.date.trim().to_string(),
            },
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorDraft {
    pub username: String,
    pub password: String,
}

impl Draft for EditorDraft {
    type Output = EditorInput;

    fn validate(&self) -> Result<EditorInput> {
        if blank(&self.username) || blank(&self.password) {
            return Err(DirectoryError::validation(
                "username and password are required",
            ));
        }
        Ok(EditorInput {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

/// 新密码的最小长度（字符数）
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordChangeDraft {
    pub old: String,
    pub new: String,
    pub confirm: String,
}

impl Draft for PasswordChangeDraft {
    type Output = PasswordChange;

    fn validate(&self) -> Result<PasswordChange> {
        if blank(&self.old) || blank(&self.new) || blank(&self.confirm) {
            return Err(DirectoryError::validation("fill all password fields"));
        }
        if self.new != self.confirm {
            return Err(DirectoryError::validation("passwords do not match"));
        }
        if self.new.chars().count() < MIN_PASSWORD_LEN {
            return Err(DirectoryError::validation(
                "new password must be at least 6 characters",
            ));
        }
        Ok(PasswordChange {
            old_password: self.old.clone(),
            new_password: self.new.clone(),
        })
    }
}
