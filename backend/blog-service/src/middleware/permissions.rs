/// Authorization module for blog-service
///
/// Every ownership and visibility decision for posts and comments goes
/// through this module. A principal may modify a resource when it owns it
/// or holds the admin role; a post is visible when it is published or the
/// caller may modify it.
use crate::error::{AppError, Result};
use crate::metrics::access::record_authorization_denial;
use crate::models::{Post, Role};

use super::Principal;

/// Result type for permission checks
pub type PermissionResult = Result<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Post,
    Comment,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Post => "post",
            Resource::Comment => "comment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

pub fn is_admin(principal: &Principal) -> bool {
    principal.role == Role::Admin
}

/// Owner or admin
pub fn can_modify(principal: &Principal, owner_id: i64) -> bool {
    principal.id == owner_id || is_admin(principal)
}

/// Published posts are public; drafts only to those who may modify them
pub fn is_visible(post: &Post, principal: Option<&Principal>) -> bool {
    post.published || principal.is_some_and(|p| can_modify(p, post.author_id))
}

/// 403 unless the principal owns the resource or is an admin
pub fn require_modify(
    principal: &Principal,
    owner_id: i64,
    resource: Resource,
    action: Action,
) -> PermissionResult {
    if can_modify(principal, owner_id) {
        return Ok(());
    }

    record_authorization_denial(resource.as_str(), action.as_str());
    tracing::info!(
        user_id = principal.id,
        owner_id,
        resource = resource.as_str(),
        action = action.as_str(),
        "authorization denied"
    );
    Err(AppError::Forbidden(format!(
        "Not authorized to {} this {}",
        action.as_str(),
        resource.as_str()
    )))
}

/// 403 unless the principal is an admin
pub fn require_admin(principal: &Principal, resource: Resource, action: Action) -> PermissionResult {
    if is_admin(principal) {
        return Ok(());
    }

    record_authorization_denial(resource.as_str(), action.as_str());
    tracing::info!(
        user_id = principal.id,
        resource = resource.as_str(),
        action = action.as_str(),
        "admin-only action refused"
    );
    Err(AppError::Forbidden("Forbidden: Admins only".to_string()))
}

/// Hide drafts behind the same 404 as a missing post
pub fn visible_or_not_found(post: &Post, principal: Option<&Principal>) -> PermissionResult {
    if is_visible(post, principal) {
        Ok(())
    } else {
        Err(AppError::NotFound("Post not found".to_string()))
    }
}

/// Comments are only listed or accepted under a published post
pub fn require_published_parent(post: Option<&Post>) -> PermissionResult {
    match post {
        Some(post) if post.published => Ok(()),
        _ => Err(AppError::NotFound(
            "Post not found or not published".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::access::AUTHORIZATION_DENIALS_TOTAL;
    use chrono::Utc;

    fn principal(id: i64, role: Role) -> Principal {
        Principal {
            id,
            name: format!("user{}", id),
            email: format!("user{}@example.com", id),
            role,
        }
    }

    fn post(author_id: i64, published: bool) -> Post {
        let now = Utc::now();
        Post {
            id: 1,
            title: "Hi There".into(),
            content: "1234567890".into(),
            published,
            author_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_can_modify_owner_non_owner_admin() {
        let owner = principal(1, Role::Member);
        let stranger = principal(2, Role::Member);
        let admin = principal(3, Role::Admin);

        assert!(can_modify(&owner, 1));
        assert!(!can_modify(&stranger, 1));
        assert!(can_modify(&admin, 1));
    }

    #[test]
    fn test_require_modify_is_forbidden_for_stranger() {
        let stranger = principal(2, Role::Member);
        let err = require_modify(&stranger, 1, Resource::Post, Action::Update).unwrap_err();
        match err {
            AppError::Forbidden(msg) => assert_eq!(msg, "Not authorized to update this post"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(require_modify(&principal(1, Role::Member), 1, Resource::Comment, Action::Delete).is_ok());
    }

    fn denials(resource: Resource, action: Action) -> u64 {
        AUTHORIZATION_DENIALS_TOTAL
            .with_label_values(&[resource.as_str(), action.as_str()])
            .get()
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&principal(1, Role::Admin), Resource::Post, Action::Create).is_ok());
        assert!(matches!(
            require_admin(&principal(1, Role::Member), Resource::Post, Action::Create),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_require_admin_labels_denial_with_caller_resource() {
        let before_comment = denials(Resource::Comment, Action::Delete);

        let err = require_admin(&principal(4, Role::Member), Resource::Comment, Action::Delete)
            .unwrap_err();
        match err {
            AppError::Forbidden(msg) => assert_eq!(msg, "Forbidden: Admins only"),
            other => panic!("unexpected error: {:?}", other),
        }

        assert_eq!(denials(Resource::Comment, Action::Delete), before_comment + 1);
    }

    #[test]
    fn test_draft_visibility() {
        let draft = post(1, false);
        assert!(!is_visible(&draft, None));
        assert!(!is_visible(&draft, Some(&principal(2, Role::Member))));
        assert!(is_visible(&draft, Some(&principal(1, Role::Member))));
        assert!(is_visible(&draft, Some(&principal(9, Role::Admin))));

        assert!(is_visible(&post(1, true), None));
    }

    #[test]
    fn test_visible_or_not_found_hides_drafts() {
        let err = visible_or_not_found(&post(1, false), None).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(visible_or_not_found(&post(1, true), None).is_ok());
    }

    #[test]
    fn test_comments_need_published_parent() {
        assert!(require_published_parent(Some(&post(1, true))).is_ok());
        assert!(require_published_parent(Some(&post(1, false))).is_err());
        assert!(require_published_parent(None).is_err());
    }
}
