/// Post service - handles post creation, retrieval, and management
use std::sync::Arc;

use crate::db::{BlogStore, PostFilter};
use crate::error::{AppError, Result};
use crate::middleware::{
    is_visible, require_admin, require_modify, visible_or_not_found, Action, Principal, Resource,
};
use crate::models::requests::{CreatePostRequest, PageQuery, UpdatePostRequest};
use crate::models::{BlogHomePage, NewPost, Post, PostChanges, PostDetail, PostSummary};
use crate::validators::check;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Resolved `page` / `pageSize` for the blog home listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
}

impl Pagination {
    /// Missing, non-numeric, or non-positive values fall back to defaults
    pub fn from_query(query: &PageQuery) -> Self {
        Self {
            page: parse_positive(query.page.as_deref()).unwrap_or(1),
            page_size: parse_positive(query.page_size.as_deref())
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
        }
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.page_size - 1) / self.page_size
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v >= 1)
}

pub struct PostService {
    store: Arc<dyn BlogStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Public, paginated listing of published posts
    pub async fn blog_home(&self, query: &PageQuery) -> Result<BlogHomePage> {
        let pagination = Pagination::from_query(query);

        let posts = self
            .store
            .list_published_page(pagination.page, pagination.page_size)
            .await?;
        let total_posts = self.store.count_published().await?;

        Ok(BlogHomePage {
            posts,
            current_page: pagination.page,
            page_size: pagination.page_size,
            total_posts,
            total_pages: pagination.total_pages(total_posts),
        })
    }

    /// Create a post owned by the caller (admins only)
    pub async fn create(&self, principal: &Principal, req: CreatePostRequest) -> Result<Post> {
        require_admin(principal, Resource::Post, Action::Create)?;
        check(&req)?;

        let post = self
            .store
            .create_post(NewPost {
                title: req.title,
                content: req.content,
                published: req.published,
                author_id: principal.id,
            })
            .await?;

        tracing::info!(post_id = post.id, author_id = principal.id, "post created");
        Ok(post)
    }

    /// Every post the caller may see: all of them for admins, published
    /// posts plus the caller's own drafts for everyone else
    pub async fn list_all(&self, principal: &Principal) -> Result<Vec<PostSummary>> {
        let posts = self.store.list_posts(PostFilter::All).await?;
        Ok(posts
            .into_iter()
            .filter(|summary| is_visible(&summary.post, Some(principal)))
            .collect())
    }

    pub async fn list_published(&self) -> Result<Vec<PostSummary>> {
        self.store.list_posts(PostFilter::Published).await
    }

    /// Post with comments; drafts are reported missing to callers who cannot modify them
    pub async fn get(&self, post_id: i64, principal: Option<&Principal>) -> Result<PostDetail> {
        let detail = self
            .store
            .find_post_detail(post_id)
            .await?
            .ok_or_else(post_not_found)?;

        visible_or_not_found(&detail.post, principal)?;
        Ok(detail)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        post_id: i64,
        req: UpdatePostRequest,
    ) -> Result<Post> {
        check(&req)?;

        let existing = self.find_existing(post_id).await?;
        require_modify(principal, existing.author_id, Resource::Post, Action::Update)?;

        let post = self
            .store
            .update_post(
                post_id,
                PostChanges {
                    title: req.title,
                    content: req.content,
                    published: req.published,
                },
            )
            .await?
            .ok_or_else(post_not_found)?;

        tracing::info!(post_id, user_id = principal.id, "post updated");
        Ok(post)
    }

    pub async fn delete(&self, principal: &Principal, post_id: i64) -> Result<()> {
        let existing = self.find_existing(post_id).await?;
        require_modify(principal, existing.author_id, Resource::Post, Action::Delete)?;

        if !self.store.delete_post(post_id).await? {
            return Err(post_not_found());
        }

        tracing::info!(post_id, user_id = principal.id, "post deleted");
        Ok(())
    }

    async fn find_existing(&self, post_id: i64) -> Result<Post> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(post_not_found)
    }
}

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}
