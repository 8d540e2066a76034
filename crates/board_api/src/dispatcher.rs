use shared::{
    domain::{CommentId, PostId},
    protocol::ActionForm,
};
use storage::BoardStore;
use tracing::{debug, error, info, warn};

use crate::{
    password_mismatch, post_route, unknown_failure, ActionOutcome, AdminSecret, PostAction,
    HOME_ROUTE,
};

/// Applies form actions submitted against a single post page.
///
/// Password checks run before the mutation but are not atomic with it: two
/// concurrent requests against the same comment race, last write wins.
pub struct ActionDispatcher<'a> {
    store: &'a dyn BoardStore,
    admin_secret: &'a AdminSecret,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(store: &'a dyn BoardStore, admin_secret: &'a AdminSecret) -> Self {
        Self {
            store,
            admin_secret,
        }
    }

    /// Parses the raw path id and form, then dispatches. Anything malformed
    /// ends in the generic failure message.
    pub async fn dispatch_form(&self, raw_post_id: &str, form: ActionForm) -> ActionOutcome {
        let Ok(post_id) = raw_post_id.trim().parse::<i64>().map(PostId) else {
            debug!(raw_post_id, "post id is not numeric");
            return ActionOutcome::Message(unknown_failure());
        };

        match PostAction::try_from(form) {
            Ok(action) => self.dispatch(post_id, action).await,
            Err(reason) => {
                debug!(%post_id, %reason, "rejected post action");
                ActionOutcome::Message(unknown_failure())
            }
        }
    }

    pub async fn dispatch(&self, post_id: PostId, action: PostAction) -> ActionOutcome {
        let tag = action.tag();
        let result = match action {
            PostAction::DeletePost { id, password } => {
                self.delete_post(post_id, id, password.as_deref()).await
            }
            PostAction::CreateComment {
                writer,
                content,
                password,
            } => {
                self.create_comment(post_id, &writer, &content, &password)
                    .await
            }
            PostAction::UpdateComment {
                comment_id,
                content,
                password,
            } => {
                self.update_comment(post_id, comment_id, &content, password.as_deref())
                    .await
            }
            PostAction::DeleteComment {
                comment_id,
                password,
            } => {
                self.delete_comment(post_id, comment_id, password.as_deref())
                    .await
            }
        };

        result.unwrap_or_else(|err| {
            error!(%post_id, action = tag.as_str(), error = %err, "post action failed");
            ActionOutcome::Message(unknown_failure())
        })
    }

    async fn delete_post(
        &self,
        post_id: PostId,
        form_id: Option<PostId>,
        password: Option<&str>,
    ) -> anyhow::Result<ActionOutcome> {
        if !self.admin_secret.matches(password) {
            warn!(%post_id, "post delete rejected: wrong admin password");
            return Ok(ActionOutcome::Message(password_mismatch("삭제 실패")));
        }
        if form_id != Some(post_id) {
            debug!(%post_id, ?form_id, "post delete form is missing or targets another post");
            return Ok(ActionOutcome::Message(unknown_failure()));
        }

        let deleted = self.store.delete_post(post_id).await?;
        info!(%post_id, deleted, "post deleted");
        Ok(ActionOutcome::Redirect(HOME_ROUTE.to_string()))
    }

    async fn create_comment(
        &self,
        post_id: PostId,
        writer: &str,
        content: &str,
        password: &str,
    ) -> anyhow::Result<ActionOutcome> {
        let comment_id = self
            .store
            .create_comment(post_id, writer, content, password)
            .await?;
        info!(%post_id, %comment_id, "comment created");
        Ok(ActionOutcome::Redirect(post_route(post_id)))
    }

    async fn update_comment(
        &self,
        post_id: PostId,
        comment_id: CommentId,
        content: &str,
        password: Option<&str>,
    ) -> anyhow::Result<ActionOutcome> {
        let Some(stored) = self.store.comment_password(comment_id).await? else {
            debug!(%post_id, %comment_id, "comment not found for update");
            return Ok(ActionOutcome::Message(unknown_failure()));
        };
        if password != Some(stored.as_str()) {
            warn!(%post_id, %comment_id, "comment update rejected: wrong password");
            return Ok(ActionOutcome::Message(password_mismatch("수정 실패")));
        }

        self.store.update_comment(comment_id, content).await?;
        info!(%post_id, %comment_id, "comment updated");
        Ok(ActionOutcome::Redirect(post_route(post_id)))
    }

    async fn delete_comment(
        &self,
        post_id: PostId,
        comment_id: CommentId,
        password: Option<&str>,
    ) -> anyhow::Result<ActionOutcome> {
        let Some(stored) = self.store.comment_password(comment_id).await? else {
            debug!(%post_id, %comment_id, "comment not found for delete");
            return Ok(ActionOutcome::Message(unknown_failure()));
        };
        if password != Some(stored.as_str()) && !self.admin_secret.matches(password) {
            warn!(%post_id, %comment_id, "comment delete rejected: wrong password");
            return Ok(ActionOutcome::Message(password_mismatch("삭제 실패")));
        }

        self.store.delete_comment(comment_id).await?;
        info!(%post_id, %comment_id, "comment deleted");
        Ok(ActionOutcome::Redirect(post_route(post_id)))
    }
}
