use shared::{
    domain::{Board, BoardId, Post, PostId, PostTitle},
    error::{ApiError, ErrorCode},
    protocol::{ActionForm, ActionMessage, LoadedPost, NewPostForm, UpdatePostForm},
};
use storage::{BoardStore, Storage};
use tracing::{debug, error, info};

mod action;
mod dispatcher;

pub use action::{ActionTag, InvalidAction, PostAction};
pub use dispatcher::ActionDispatcher;

use action::present;

pub const HOME_ROUTE: &str = "/";

pub fn post_route(post_id: PostId) -> String {
    format!("/posts/{}", post_id.0)
}

/// Shared password that authorizes post deletion/update and overrides comment
/// passwords.
///
/// An empty secret never matches anything.
#[derive(Clone, Default)]
pub struct AdminSecret(String);

impl AdminSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_configured(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn matches(&self, submitted: Option<&str>) -> bool {
        self.is_configured() && submitted == Some(self.0.as_str())
    }
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminSecret(<redacted>)")
    }
}

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub admin_secret: AdminSecret,
}

impl ApiContext {
    pub fn dispatcher(&self) -> ActionDispatcher<'_> {
        ActionDispatcher::new(&self.storage, &self.admin_secret)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderOutcome {
    Found(LoadedPost),
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Redirect(String),
    Message(ActionMessage),
}

pub fn password_mismatch(title: &str) -> ActionMessage {
    ActionMessage::red(title, "비밀번호가 일치하지 않습니다.")
}

pub fn unknown_failure() -> ActionMessage {
    ActionMessage::red("처리 실패", "알 수 없는 오류가 발생했습니다.")
}

pub async fn load_post(ctx: &ApiContext, raw_post_id: &str) -> Result<LoaderOutcome, ApiError> {
    load_post_from(&ctx.storage, raw_post_id).await
}

/// Fetches a post and its comments for rendering, redirecting home when the
/// id is malformed or no row matches.
pub async fn load_post_from(
    store: &dyn BoardStore,
    raw_post_id: &str,
) -> Result<LoaderOutcome, ApiError> {
    let Ok(post_id) = raw_post_id.trim().parse::<i64>().map(PostId) else {
        debug!(raw_post_id, "post id is not numeric; redirecting home");
        return Ok(LoaderOutcome::Redirect(HOME_ROUTE.to_string()));
    };

    let Some(post) = store.get_post(post_id).await.map_err(internal)? else {
        debug!(%post_id, "post not found; redirecting home");
        return Ok(LoaderOutcome::Redirect(HOME_ROUTE.to_string()));
    };
    let comments = store
        .list_comment_views_for_post(post_id)
        .await
        .map_err(internal)?;

    Ok(LoaderOutcome::Found(LoadedPost { post, comments }))
}

pub async fn dispatch_action(
    ctx: &ApiContext,
    raw_post_id: &str,
    form: ActionForm,
) -> ActionOutcome {
    ctx.dispatcher().dispatch_form(raw_post_id, form).await
}

pub async fn list_boards(ctx: &ApiContext) -> Result<Vec<Board>, ApiError> {
    ctx.storage.list_boards().await.map_err(internal)
}

pub async fn list_board_posts(ctx: &ApiContext, board_id: BoardId) -> Result<Vec<Post>, ApiError> {
    ctx.storage
        .list_posts_for_board(board_id)
        .await
        .map_err(internal)
}

pub async fn list_board_titles(
    ctx: &ApiContext,
    board_id: BoardId,
) -> Result<Vec<PostTitle>, ApiError> {
    ctx.storage
        .list_post_titles_for_board(board_id)
        .await
        .map_err(internal)
}

pub async fn create_post(
    ctx: &ApiContext,
    board_id: BoardId,
    form: NewPostForm,
) -> Result<PostId, ApiError> {
    if !ctx.storage.board_exists(board_id).await.map_err(internal)? {
        return Err(ApiError::new(ErrorCode::NotFound, "board not found"));
    }

    let title = present(form.title);
    let content = present(form.content);
    let post_id = ctx
        .storage
        .create_post(title.as_deref(), content.as_deref(), board_id)
        .await
        .map_err(internal)?;
    info!(%post_id, %board_id, "post created");
    Ok(post_id)
}

/// Replaces a post's title, content and board. Requires the administrative
/// secret, like post deletion.
pub async fn update_post(
    ctx: &ApiContext,
    raw_post_id: &str,
    form: UpdatePostForm,
) -> ActionOutcome {
    if !ctx.admin_secret.matches(form.password.as_deref()) {
        return ActionOutcome::Message(password_mismatch("수정 실패"));
    }

    let Ok(post_id) = raw_post_id.trim().parse::<i64>().map(PostId) else {
        return ActionOutcome::Message(unknown_failure());
    };
    let Some(board_id) = present(form.board_id)
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .map(BoardId)
    else {
        return ActionOutcome::Message(unknown_failure());
    };

    let title = present(form.title);
    let content = present(form.content);
    match ctx
        .storage
        .update_post(post_id, title.as_deref(), content.as_deref(), board_id)
        .await
    {
        Ok(0) => {
            debug!(%post_id, "post update matched no rows");
            ActionOutcome::Message(unknown_failure())
        }
        Ok(_) => {
            info!(%post_id, %board_id, "post updated");
            ActionOutcome::Redirect(post_route(post_id))
        }
        Err(err) => {
            error!(%post_id, error = %err, "post update failed");
            ActionOutcome::Message(unknown_failure())
        }
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
