/// Comment service - comments attached to published posts
use std::sync::Arc;

use crate::db::BlogStore;
use crate::error::{AppError, Result};
use crate::middleware::{require_modify, require_published_parent, Action, Principal, Resource};
use crate::models::requests::{CreateCommentRequest, UpdateCommentRequest};
use crate::models::{Comment, CommentView, NewComment};
use crate::validators::check;

pub struct CommentService {
    store: Arc<dyn BlogStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Comment on a published post as the caller
    pub async fn create(
        &self,
        principal: &Principal,
        req: CreateCommentRequest,
    ) -> Result<CommentView> {
        check(&req)?;

        let post = self.store.find_post(req.post_id).await?;
        require_published_parent(post.as_ref())?;

        let comment = self
            .store
            .create_comment(NewComment {
                content: req.content,
                post_id: req.post_id,
                author_id: principal.id,
            })
            .await?;

        tracing::info!(
            comment_id = comment.comment.id,
            post_id = req.post_id,
            author_id = principal.id,
            "comment created"
        );
        Ok(comment)
    }

    /// Comments on a published post, newest first
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentView>> {
        let post = self.store.find_post(post_id).await?;
        require_published_parent(post.as_ref())?;

        self.store.list_comments_for_post(post_id).await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        comment_id: i64,
        req: UpdateCommentRequest,
    ) -> Result<CommentView> {
        check(&req)?;

        let existing = self.find_existing(comment_id).await?;
        require_modify(principal, existing.author_id, Resource::Comment, Action::Update)?;

        let comment = self
            .store
            .update_comment(comment_id, &req.content)
            .await?
            .ok_or_else(comment_not_found)?;

        tracing::info!(comment_id, user_id = principal.id, "comment updated");
        Ok(comment)
    }

    pub async fn delete(&self, principal: &Principal, comment_id: i64) -> Result<()> {
        let existing = self.find_existing(comment_id).await?;
        require_modify(principal, existing.author_id, Resource::Comment, Action::Delete)?;

        if !self.store.delete_comment(comment_id).await? {
            return Err(comment_not_found());
        }

        tracing::info!(comment_id, user_id = principal.id, "comment deleted");
        Ok(())
    }

    async fn find_existing(&self, comment_id: i64) -> Result<Comment> {
        self.store
            .find_comment(comment_id)
            .await?
            .ok_or_else(comment_not_found)
    }
}

fn comment_not_found() -> AppError {
    AppError::NotFound("Comment not found".to_string())
}
