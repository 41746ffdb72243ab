/// Request payloads accepted by the HTTP surface
///
/// Shape rules live on the types (`validator` derive); password composition
/// rules are checked separately in `crate::validators`.
use serde::Deserialize;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,

    #[validate(length(min = 10, message = "Content must be at least 10 characters"))]
    pub content: String,

    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 10, message = "Content must be at least 10 characters"))]
    pub content: Option<String>,

    pub published: Option<bool>,
}

pub const COMMENT_MAX_LENGTH: usize = 500;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    pub post_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Comment bodies carry one message per bound, so they are checked by hand
fn check_comment_content(content: &str, errors: &mut ValidationErrors) {
    let len = content.chars().count();
    if len == 0 {
        errors.add("content", rule("length", "Comment cannot be empty"));
    } else if len > COMMENT_MAX_LENGTH {
        errors.add("content", rule("length", "Comment is too long"));
    }
}

impl Validate for CreateCommentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_comment_content(&self.content, &mut errors);
        if self.post_id < 1 {
            errors.add("postId", rule("range", "Post id must be a positive integer"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Validate for UpdateCommentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_comment_content(&self.content, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// `?page=&pageSize=` for the blog home listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}
