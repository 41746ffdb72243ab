/// Data models for blog-service
///
/// This module defines structures for:
/// - User: accounts with a closed `Role`
/// - Post: authored articles with a publication flag
/// - Comment: short replies attached to a post
///
/// Row types map 1:1 onto the SQL schema; the `*View` types are the JSON
/// shapes served to the reader and admin applications (camelCase keys,
/// embedded author names and comment counts).
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod requests;

// ============================================
// Roles
// ============================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "MEMBER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MEMBER" | "USER" => Ok(Role::Member),
            "ADMIN" => Ok(Role::Admin),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ParseRoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================
// Rows
// ============================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub post_id: i64,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================
// Store inputs
// ============================================

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial account update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub published: bool,
    pub author_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub post_id: i64,
    pub author_id: i64,
}

// ============================================
// Views
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorName {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CommentCount {
    pub comments: i64,
}

/// Post as it appears in listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorName,
    #[serde(rename = "_count")]
    pub count: CommentCount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: AuthorName,
}

/// Single post with its comments, newest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorName,
    pub comments: Vec<CommentView>,
}

/// Account fields safe to return to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePost {
    pub id: i64,
    pub title: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: PublicUser,
    pub posts: Vec<ProfilePost>,
    #[serde(rename = "_count")]
    pub count: CommentCount,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogHomePage {
    pub posts: Vec<PostSummary>,
    pub current_page: i64,
    pub page_size: i64,
    pub total_posts: i64,
    pub total_pages: i64,
}
