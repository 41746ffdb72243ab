use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::comment_repo::list_comments_for_post;
use super::{constraint_error, page_offset, PgStore, PostFilter, PostRepository};
use crate::error::Result;
use crate::models::{
    AuthorName, CommentCount, NewPost, Post, PostChanges, PostDetail, PostSummary,
};

const POST_COLUMNS: &str = "id, title, content, published, author_id, created_at, updated_at";

/// Post joined with its author name and comment count
const SUMMARY_SELECT: &str = r#"
    SELECT p.id, p.title, p.content, p.published, p.author_id, p.created_at, p.updated_at,
           u.name AS author_name,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

#[derive(sqlx::FromRow)]
struct PostSummaryRow {
    #[sqlx(flatten)]
    post: Post,
    author_name: String,
    comment_count: i64,
}

impl From<PostSummaryRow> for PostSummary {
    fn from(row: PostSummaryRow) -> Self {
        PostSummary {
            post: row.post,
            author: AuthorName {
                name: row.author_name,
            },
            count: CommentCount {
                comments: row.comment_count,
            },
        }
    }
}

/// Create a post; a missing author is reported as not found
pub async fn create_post(pool: &PgPool, new_post: &NewPost) -> Result<Post> {
    let post = sqlx::query_as::<_, Post>(&format!(
        r#"
        INSERT INTO posts (title, content, published, author_id)
        VALUES ($1, $2, $3, $4)
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(&new_post.title)
    .bind(&new_post.content)
    .bind(new_post.published)
    .bind(new_post.author_id)
    .fetch_one(pool)
    .await
    .map_err(|e| constraint_error(e, "Post already exists", "User not found"))?;

    Ok(post)
}

/// Find a post by ID
pub async fn find_post(pool: &PgPool, id: i64) -> Result<Option<Post>> {
    let post = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(post)
}

/// Post with author name and every comment, newest first
pub async fn find_post_detail(pool: &PgPool, id: i64) -> Result<Option<PostDetail>> {
    let row = sqlx::query_as::<_, PostSummaryRow>(&format!("{SUMMARY_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let comments = list_comments_for_post(pool, id).await?;

    Ok(Some(PostDetail {
        post: row.post,
        author: AuthorName {
            name: row.author_name,
        },
        comments,
    }))
}

/// All posts (or only published ones), newest first
pub async fn list_posts(pool: &PgPool, filter: PostFilter) -> Result<Vec<PostSummary>> {
    let rows = sqlx::query_as::<_, PostSummaryRow>(&format!(
        r#"
        {SUMMARY_SELECT}
        WHERE ($1 = FALSE OR p.published = TRUE)
        ORDER BY p.created_at DESC, p.id DESC
        "#
    ))
    .bind(filter == PostFilter::Published)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PostSummary::from).collect())
}

pub async fn list_published_page(
    pool: &PgPool,
    page: i64,
    page_size: i64,
) -> Result<Vec<PostSummary>> {
    let rows = sqlx::query_as::<_, PostSummaryRow>(&format!(
        r#"
        {SUMMARY_SELECT}
        WHERE p.published = TRUE
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $1 OFFSET $2
        "#
    ))
    .bind(page_size)
    .bind(page_offset(page, page_size))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PostSummary::from).collect())
}

pub async fn count_published(pool: &PgPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM posts WHERE published = TRUE")
        .fetch_one(pool)
        .await?;

    Ok(row.get::<i64, _>("count"))
}

/// Apply a partial update; absent fields keep their stored value
pub async fn update_post(pool: &PgPool, id: i64, changes: &PostChanges) -> Result<Option<Post>> {
    let post = sqlx::query_as::<_, Post>(&format!(
        r#"
        UPDATE posts
        SET title = COALESCE($2, title),
            content = COALESCE($3, content),
            published = COALESCE($4, published),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.title.as_deref())
    .bind(changes.content.as_deref())
    .bind(changes.published)
    .fetch_optional(pool)
    .await?;

    Ok(post)
}

/// Delete a post; comments go with it (ON DELETE CASCADE)
pub async fn delete_post(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl PostRepository for PgStore {
    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        create_post(self.pool(), &new_post).await
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>> {
        find_post(self.pool(), id).await
    }

    async fn find_post_detail(&self, id: i64) -> Result<Option<PostDetail>> {
        find_post_detail(self.pool(), id).await
    }

    async fn list_posts(&self, filter: PostFilter) -> Result<Vec<PostSummary>> {
        list_posts(self.pool(), filter).await
    }

    async fn list_published_page(&self, page: i64, page_size: i64) -> Result<Vec<PostSummary>> {
        list_published_page(self.pool(), page, page_size).await
    }

    async fn count_published(&self) -> Result<i64> {
        count_published(self.pool()).await
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>> {
        update_post(self.pool(), id, &changes).await
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        delete_post(self.pool(), id).await
    }
}
