/// Store layer for blog-service
///
/// Repositories are async traits so handlers and services can run against
/// PostgreSQL (`PgStore`) or the in-process `MemoryStore` without change.
/// Both enforce the same integrity rules: unique email, a post's author and a
/// comment's post must exist, and deleting a post removes its comments.
use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentView, NewComment, NewPost, NewUser, Post, PostChanges, PostDetail,
    PostSummary, Role, User, UserChanges, UserProfile,
};

pub mod comment_repo;
pub mod memory;
pub mod post_repo;
pub mod user_repo;

pub use memory::MemoryStore;

use sqlx::PgPool;

/// Embedded schema migrations
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Which posts a listing includes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Published,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert an account with the default role; duplicate email is a conflict
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// True when `email` belongs to an account other than `user_id`
    async fn email_taken_by_other(&self, email: &str, user_id: i64) -> Result<bool>;

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>>;

    async fn set_user_role(&self, id: i64, role: Role) -> Result<Option<User>>;

    /// Account with its posts and the number of comments it has written
    async fn user_profile(&self, id: i64) -> Result<Option<UserProfile>>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Fails with not-found when the author does not exist
    async fn create_post(&self, new_post: NewPost) -> Result<Post>;

    async fn find_post(&self, id: i64) -> Result<Option<Post>>;

    /// Post with author name and comments, newest first
    async fn find_post_detail(&self, id: i64) -> Result<Option<PostDetail>>;

    /// Newest first
    async fn list_posts(&self, filter: PostFilter) -> Result<Vec<PostSummary>>;

    /// One page of published posts, newest first; `page` starts at 1
    async fn list_published_page(&self, page: i64, page_size: i64) -> Result<Vec<PostSummary>>;

    async fn count_published(&self) -> Result<i64>;

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>>;

    /// Removes the post and its comments; false when nothing was deleted
    async fn delete_post(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Fails with not-found when the post or author does not exist
    async fn create_comment(&self, new_comment: NewComment) -> Result<CommentView>;

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>>;

    /// Newest first
    async fn list_comments_for_post(&self, post_id: i64) -> Result<Vec<CommentView>>;

    async fn update_comment(&self, id: i64, content: &str) -> Result<Option<CommentView>>;

    async fn delete_comment(&self, id: i64) -> Result<bool>;
}

/// Everything the service layer needs from storage
#[async_trait]
pub trait BlogStore: UserRepository + PostRepository + CommentRepository {
    /// Readiness probe
    async fn ping(&self) -> Result<()>;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {}", e)))
    }
}

#[async_trait]
impl BlogStore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Offset for a 1-based page
pub(crate) fn page_offset(page: i64, page_size: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(page_size)
}

/// Translate constraint violations into client-facing errors
pub(crate) fn constraint_error(err: sqlx::Error, on_unique: &str, on_foreign_key: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => return AppError::Conflict(on_unique.to_string()),
            Some("23503") => return AppError::NotFound(on_foreign_key.to_string()),
            _ => {}
        }
    }
    AppError::from(err)
}
