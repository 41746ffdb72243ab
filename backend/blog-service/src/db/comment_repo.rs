use async_trait::async_trait;
use sqlx::PgPool;

use super::{constraint_error, CommentRepository, PgStore};
use crate::error::Result;
use crate::models::{AuthorName, Comment, CommentView, NewComment};

#[derive(sqlx::FromRow)]
struct CommentViewRow {
    #[sqlx(flatten)]
    comment: Comment,
    author_name: String,
}

impl From<CommentViewRow> for CommentView {
    fn from(row: CommentViewRow) -> Self {
        CommentView {
            comment: row.comment,
            author: AuthorName {
                name: row.author_name,
            },
        }
    }
}

/// Create a new comment on a post
///
/// Fails with not found when the post (or author) is gone by insert time.
pub async fn create_comment(pool: &PgPool, new_comment: &NewComment) -> Result<CommentView> {
    let row = sqlx::query_as::<_, CommentViewRow>(
        r#"
        WITH inserted AS (
            INSERT INTO comments (content, post_id, author_id)
            VALUES ($1, $2, $3)
            RETURNING id, content, post_id, author_id, created_at, updated_at
        )
        SELECT i.id, i.content, i.post_id, i.author_id, i.created_at, i.updated_at,
               u.name AS author_name
        FROM inserted i
        JOIN users u ON u.id = i.author_id
        "#,
    )
    .bind(&new_comment.content)
    .bind(new_comment.post_id)
    .bind(new_comment.author_id)
    .fetch_one(pool)
    .await
    .map_err(|e| constraint_error(e, "Comment already exists", "Post not found"))?;

    Ok(row.into())
}

/// Get a single comment by ID
pub async fn find_comment(pool: &PgPool, id: i64) -> Result<Option<Comment>> {
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, content, post_id, author_id, created_at, updated_at
        FROM comments
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(comment)
}

/// Get all comments for a post with author names, newest first
pub async fn list_comments_for_post(pool: &PgPool, post_id: i64) -> Result<Vec<CommentView>> {
    let rows = sqlx::query_as::<_, CommentViewRow>(
        r#"
        SELECT c.id, c.content, c.post_id, c.author_id, c.created_at, c.updated_at,
               u.name AS author_name
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.post_id = $1
        ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CommentView::from).collect())
}

/// Update comment content
pub async fn update_comment(pool: &PgPool, id: i64, content: &str) -> Result<Option<CommentView>> {
    let row = sqlx::query_as::<_, CommentViewRow>(
        r#"
        WITH updated AS (
            UPDATE comments
            SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, content, post_id, author_id, created_at, updated_at
        )
        SELECT d.id, d.content, d.post_id, d.author_id, d.created_at, d.updated_at,
               u.name AS author_name
        FROM updated d
        JOIN users u ON u.id = d.author_id
        "#,
    )
    .bind(id)
    .bind(content)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(CommentView::from))
}

pub async fn delete_comment(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn create_comment(&self, new_comment: NewComment) -> Result<CommentView> {
        create_comment(self.pool(), &new_comment).await
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>> {
        find_comment(self.pool(), id).await
    }

    async fn list_comments_for_post(&self, post_id: i64) -> Result<Vec<CommentView>> {
        list_comments_for_post(self.pool(), post_id).await
    }

    async fn update_comment(&self, id: i64, content: &str) -> Result<Option<CommentView>> {
        update_comment(self.pool(), id, content).await
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        delete_comment(self.pool(), id).await
    }
}
