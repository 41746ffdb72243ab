/// In-process store
///
/// Holds all tables behind one `RwLock`; each operation is a single critical
/// section, matching the row-level atomicity the SQL store gives a single
/// statement. Used by the integration tests and `STORAGE_BACKEND=memory`.
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{
    page_offset, BlogStore, CommentRepository, PostFilter, PostRepository, UserRepository,
};
use crate::error::{AppError, Result};
use crate::models::{
    AuthorName, Comment, CommentCount, CommentView, NewComment, NewPost, NewUser, Post,
    PostChanges, PostDetail, PostSummary, ProfilePost, PublicUser, Role, User, UserChanges,
    UserProfile,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    last_user_id: i64,
    last_post_id: i64,
    last_comment_id: i64,
}

impl Tables {
    fn author_name(&self, author_id: i64) -> AuthorName {
        AuthorName {
            name: self
                .users
                .get(&author_id)
                .map(|u| u.name.clone())
                .unwrap_or_default(),
        }
    }

    fn comment_view(&self, comment: &Comment) -> CommentView {
        CommentView {
            comment: comment.clone(),
            author: self.author_name(comment.author_id),
        }
    }

    fn summary(&self, post: &Post) -> PostSummary {
        let comments = self
            .comments
            .values()
            .filter(|c| c.post_id == post.id)
            .count() as i64;

        PostSummary {
            post: post.clone(),
            author: self.author_name(post.author_id),
            count: CommentCount { comments },
        }
    }

    /// Posts matching `filter`, newest first
    fn posts_newest_first(&self, filter: PostFilter) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .values()
            .filter(|p| filter == PostFilter::All || p.published)
            .collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        posts
    }

    fn comments_newest_first(&self, post_id: i64) -> Vec<CommentView> {
        let mut comments: Vec<&Comment> = self
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        comments.into_iter().map(|c| self.comment_view(c)).collect()
    }

    fn email_in_use(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.email_in_use(&new_user.email, None) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        tables.last_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.last_user_id,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: Role::default(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn email_taken_by_other(&self, email: &str, user_id: i64) -> Result<bool> {
        Ok(self.tables.read().await.email_in_use(email, Some(user_id)))
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = changes.email.as_deref() {
            if tables.email_in_use(email, Some(id)) {
                return Err(AppError::Conflict("Email is already in use".to_string()));
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_user_role(&self, id: i64, role: Role) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.role = role;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn user_profile(&self, id: i64) -> Result<Option<UserProfile>> {
        let tables = self.tables.read().await;
        let Some(user) = tables.users.get(&id) else {
            return Ok(None);
        };

        let posts = tables
            .posts_newest_first(PostFilter::All)
            .into_iter()
            .filter(|p| p.author_id == id)
            .map(|p| ProfilePost {
                id: p.id,
                title: p.title.clone(),
                published: p.published,
                created_at: p.created_at,
            })
            .collect();
        let comments = tables
            .comments
            .values()
            .filter(|c| c.author_id == id)
            .count() as i64;

        Ok(Some(UserProfile {
            user: PublicUser::from(user),
            posts,
            count: CommentCount { comments },
        }))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&new_post.author_id) {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tables.last_post_id += 1;
        let now = Utc::now();
        let post = Post {
            id: tables.last_post_id,
            title: new_post.title,
            content: new_post.content,
            published: new_post.published,
            author_id: new_post.author_id,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn find_post_detail(&self, id: i64) -> Result<Option<PostDetail>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).map(|post| PostDetail {
            post: post.clone(),
            author: tables.author_name(post.author_id),
            comments: tables.comments_newest_first(id),
        }))
    }

    async fn list_posts(&self, filter: PostFilter) -> Result<Vec<PostSummary>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts_newest_first(filter)
            .into_iter()
            .map(|p| tables.summary(p))
            .collect())
    }

    async fn list_published_page(&self, page: i64, page_size: i64) -> Result<Vec<PostSummary>> {
        let tables = self.tables.read().await;
        let skip = usize::try_from(page_offset(page, page_size)).unwrap_or(usize::MAX);
        let take = usize::try_from(page_size).unwrap_or(0);

        Ok(tables
            .posts_newest_first(PostFilter::Published)
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|p| tables.summary(p))
            .collect())
    }

    async fn count_published(&self) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.posts.values().filter(|p| p.published).count() as i64)
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(published) = changes.published {
            post.published = published;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&id).is_none() {
            return Ok(false);
        }
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create_comment(&self, new_comment: NewComment) -> Result<CommentView> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&new_comment.post_id) {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        if !tables.users.contains_key(&new_comment.author_id) {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tables.last_comment_id += 1;
        let now = Utc::now();
        let comment = Comment {
            id: tables.last_comment_id,
            content: new_comment.content,
            post_id: new_comment.post_id,
            author_id: new_comment.author_id,
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(tables.comment_view(&comment))
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn list_comments_for_post(&self, post_id: i64) -> Result<Vec<CommentView>> {
        Ok(self.tables.read().await.comments_newest_first(post_id))
    }

    async fn update_comment(&self, id: i64, content: &str) -> Result<Option<CommentView>> {
        let mut tables = self.tables.write().await;
        let Some(comment) = tables.comments.get_mut(&id) else {
            return Ok(None);
        };
        comment.content = content.to_string();
        comment.updated_at = Utc::now();
        let comment = comment.clone();
        Ok(Some(tables.comment_view(&comment)))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        Ok(self.tables.write().await.comments.remove(&id).is_some())
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
