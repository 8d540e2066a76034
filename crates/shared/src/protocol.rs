use serde::{Deserialize, Serialize};

use crate::domain::{CommentView, Post};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeColor {
    Red,
}

/// Transient notification shown by the client after a rejected form action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMessage {
    pub title: String,
    pub message: String,
    pub color: NoticeColor,
}

impl ActionMessage {
    pub fn red(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            color: NoticeColor::Red,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub message: ActionMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedPost {
    pub post: Post,
    pub comments: Vec<CommentView>,
}

/// Form body posted to `/posts/:post_id`.
///
/// Every field is optional on the wire; `action` selects which of the others
/// are read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionForm {
    pub action: Option<String>,
    pub id: Option<String>,
    pub password: Option<String>,
    pub comment_id: Option<String>,
    pub comment_content: Option<String>,
    pub comment_writer: Option<String>,
    pub comment_password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPostForm {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub board_id: Option<String>,
    pub password: Option<String>,
}
