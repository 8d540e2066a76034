use std::str::FromStr;

use shared::{
    domain::{CommentId, PostId},
    protocol::ActionForm,
};
use thiserror::Error;

/// Discriminator carried in the `action` form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTag {
    DeletePost,
    CreateComment,
    UpdateComment,
    DeleteComment,
}

impl ActionTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionTag::DeletePost => "0",
            ActionTag::CreateComment => "1",
            ActionTag::UpdateComment => "2",
            ActionTag::DeleteComment => "3",
        }
    }
}

impl FromStr for ActionTag {
    type Err = InvalidAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(ActionTag::DeletePost),
            "1" => Ok(ActionTag::CreateComment),
            "2" => Ok(ActionTag::UpdateComment),
            "3" => Ok(ActionTag::DeleteComment),
            other => Err(InvalidAction::UnknownTag(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidAction {
    #[error("missing action tag")]
    MissingTag,
    #[error("unknown action tag '{0}'")]
    UnknownTag(String),
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("field '{0}' is not a valid id")]
    InvalidId(&'static str),
}

/// A form submission against a post page, reduced to the fields its action
/// actually reads.
///
/// Passwords stay `Option` where a missing value is a failed comparison
/// rather than a malformed request. `DeletePost::id` is optional too: the
/// admin password is compared before the id is looked at.
#[derive(Clone, PartialEq, Eq)]
pub enum PostAction {
    DeletePost {
        id: Option<PostId>,
        password: Option<String>,
    },
    CreateComment {
        writer: String,
        content: String,
        password: String,
    },
    UpdateComment {
        comment_id: CommentId,
        content: String,
        password: Option<String>,
    },
    DeleteComment {
        comment_id: CommentId,
        password: Option<String>,
    },
}

impl PostAction {
    pub fn tag(&self) -> ActionTag {
        match self {
            PostAction::DeletePost { .. } => ActionTag::DeletePost,
            PostAction::CreateComment { .. } => ActionTag::CreateComment,
            PostAction::UpdateComment { .. } => ActionTag::UpdateComment,
            PostAction::DeleteComment { .. } => ActionTag::DeleteComment,
        }
    }
}

// Passwords are left out on purpose.
impl std::fmt::Debug for PostAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostAction::DeletePost { id, .. } => {
                f.debug_struct("DeletePost").field("id", id).finish_non_exhaustive()
            }
            PostAction::CreateComment { writer, .. } => f
                .debug_struct("CreateComment")
                .field("writer", writer)
                .finish_non_exhaustive(),
            PostAction::UpdateComment { comment_id, .. } => f
                .debug_struct("UpdateComment")
                .field("comment_id", comment_id)
                .finish_non_exhaustive(),
            PostAction::DeleteComment { comment_id, .. } => f
                .debug_struct("DeleteComment")
                .field("comment_id", comment_id)
                .finish_non_exhaustive(),
        }
    }
}

impl TryFrom<ActionForm> for PostAction {
    type Error = InvalidAction;

    fn try_from(form: ActionForm) -> Result<Self, Self::Error> {
        let tag = present(form.action)
            .ok_or(InvalidAction::MissingTag)?
            .parse::<ActionTag>()?;

        match tag {
            ActionTag::DeletePost => Ok(PostAction::DeletePost {
                id: present(form.id).and_then(|raw| raw.trim().parse::<i64>().ok().map(PostId)),
                password: present(form.password),
            }),
            ActionTag::CreateComment => Ok(PostAction::CreateComment {
                writer: required(form.comment_writer, "commentWriter")?,
                content: required(form.comment_content, "commentContent")?,
                password: required(form.comment_password, "commentPassword")?,
            }),
            ActionTag::UpdateComment => Ok(PostAction::UpdateComment {
                comment_id: CommentId(required_id(form.comment_id, "commentId")?),
                content: required(form.comment_content, "commentContent")?,
                password: present(form.comment_password),
            }),
            ActionTag::DeleteComment => Ok(PostAction::DeleteComment {
                comment_id: CommentId(required_id(form.comment_id, "commentId")?),
                password: present(form.comment_password),
            }),
        }
    }
}

/// Empty form values are treated the same as absent ones.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &'static str) -> Result<String, InvalidAction> {
    present(value).ok_or(InvalidAction::MissingField(field))
}

fn required_id(value: Option<String>, field: &'static str) -> Result<i64, InvalidAction> {
    let raw = required(value, field)?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| InvalidAction::InvalidId(field))
}

#[cfg(test)]
#[path = "tests/action_tests.rs"]
mod tests;
