/// End-to-end tests for the blog API
///
/// Each test builds the full route table over a fresh in-memory store and
/// drives it through `actix_web::test`.
mod common;

use actix_web::test;
use blog_service::models::Role;
use blog_service::services::UserService;
use chrono::{Duration, Utc};
use common::*;
use serde_json::json;

#[actix_web::test]
async fn test_register_login_and_profile_flow() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;

    let (status, body) = post(
        &app,
        "/api/users/register",
        json!({"name": "Lukas", "email": "Lukas@Example.com", "password": "Password123"}),
        None,
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["name"], "Lukas");
    assert_eq!(body["email"], "lukas@example.com");
    assert_eq!(body["role"], "MEMBER");
    assert!(body["token"].as_str().is_some());
    let user_id = body["id"].as_i64().unwrap();
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());

    let (status, body) = post(
        &app,
        "/api/users/login",
        json!({"email": "lukas@example.com", "password": "Password123"}),
        None,
    )
    .await;
    assert_eq!(status, 200);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, profile) = get(&app, "/api/users/profile", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(profile["id"], user_id);
    assert_eq!(profile["name"], "Lukas");
    assert_eq!(profile["posts"], json!([]));
    assert_eq!(profile["_count"]["comments"], 0);

    let (status, updated) = put(
        &app,
        "/api/users/profile",
        json!({"name": "Lukas Updated"}),
        Some(&token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(updated["id"], user_id);
    assert_eq!(updated["name"], "Lukas Updated");
    assert_eq!(updated["email"], "lukas@example.com");

    let (status, body) = post(&app, "/api/users/logout", json!({}), Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Successfully logged out");
}

#[actix_web::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    register(&app, "Lukas", "lukas@example.com").await;

    let (status, body) = post(
        &app,
        "/api/users/login",
        json!({"email": "lukas@example.com", "password": "WrongPassword1"}),
        None,
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = post(
        &app,
        "/api/users/login",
        json!({"email": "nobody@example.com", "password": "Password123"}),
        None,
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Invalid credentials");
}

#[actix_web::test]
async fn test_duplicate_email_is_rejected() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    register(&app, "Lukas", "lukas@example.com").await;

    let (status, body) = post(
        &app,
        "/api/users/register",
        json!({"name": "Other", "email": "LUKAS@example.com", "password": "Password123"}),
        None,
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "User already exists");
}

#[actix_web::test]
async fn test_register_validation_reports_field_details() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;

    let (status, body) = post(
        &app,
        "/api/users/register",
        json!({"name": "L", "email": "not-an-email", "password": "weak"}),
        None,
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Validation failed");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/users/register")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().is_some());
}

#[actix_web::test]
async fn test_authentication_failures_are_distinguished() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    let (user_id, _) = register(&app, "Lukas", "lukas@example.com").await;

    let (status, body) = get(&app, "/api/users/profile", None).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "No token, authorization denied");

    let (status, body) = get(&app, "/api/users/profile", Some("not-a-jwt")).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Invalid token");

    let expired = test_keys()
        .issue_at(user_id, Utc::now() - Duration::days(31))
        .unwrap();
    let (status, body) = get(&app, "/api/users/profile", Some(&expired)).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Token expired");

    let orphan = test_keys().issue(9_999).unwrap();
    let (status, body) = get(&app, "/api/users/profile", Some(&orphan)).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "User not found");
}

#[actix_web::test]
async fn test_only_admins_create_posts() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    let (_, member) = register(&app, "Member", "member@example.com").await;

    let (status, body) = post(
        &app,
        "/api/posts",
        json!({"title": "Hi There", "content": "1234567890", "published": true}),
        Some(&member),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "Forbidden: Admins only");

    let (status, _) = post(
        &app,
        "/api/posts",
        json!({"title": "Hi There", "content": "1234567890"}),
        None,
    )
    .await;
    assert_eq!(status, 401);
}

#[actix_web::test]
async fn test_create_then_get_post() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    let (admin_id, admin) = register_admin(&ctx, &app, "Admin", "admin@example.com").await;

    let (status, created) = post(
        &app,
        "/api/posts",
        json!({"title": "Hi There", "content": "1234567890", "published": true}),
        Some(&admin),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(created["authorId"], admin_id);
    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = get(&app, &format!("/api/posts/{}", id), None).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["title"], "Hi There");
    assert_eq!(fetched["content"], "1234567890");
    assert_eq!(fetched["author"]["name"], "Admin");
    assert_eq!(fetched["comments"], json!([]));
}

#[actix_web::test]
async fn test_post_validation_errors() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    let (_, admin) = register_admin(&ctx, &app, "Admin", "admin@example.com").await;

    let (status, body) = post(
        &app,
        "/api/posts",
        json!({"title": "Hi", "content": "short"}),
        Some(&admin),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_post_ownership_rules() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    let (_, owner) = register_admin(&ctx, &app, "Owner", "owner@example.com").await;
    let (_, other) = register(&app, "Other", "other@example.com").await;
    let id = create_post(&app, &owner, "Hi There", true).await;
    let uri = format!("/api/posts/{}", id);

    let (status, body) = put(&app, &uri, json!({"title": "Hijacked"}), Some(&other)).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "Not authorized to update this post");

    let (status, body) = put(&app, &uri, json!({"title": "Hi Again"}), Some(&owner)).await;
    assert_eq!(status, 200);
    assert_eq!(body["title"], "Hi Again");
    assert_eq!(body["content"], "1234567890");

    let (status, body) = delete(&app, &uri, Some(&other)).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "Not authorized to delete this post");

    let (status, _) = delete(&app, &uri, Some(&owner)).await;
    assert_eq!(status, 204);

    let (status, body) = get(&app, &uri, None).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Post not found");

    let (status, _) = delete(&app, &uri, Some(&owner)).await;
    assert_eq!(status, 404);
}

#[actix_web::test]
async fn test_admin_may_modify_any_post() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    let (_, first) = register_admin(&ctx, &app, "First", "first@example.com").await;
    let (_, second) = register_admin(&ctx, &app, "Second", "second@example.com").await;
    let id = create_post(&app, &first, "Hi There", false).await;

    let (status, body) = put(
        &app,
        &format!("/api/posts/{}", id),
        json!({"published": true}),
        Some(&second),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["published"], true);
}

#[actix_web::test]
async fn test_drafts_hidden_from_anonymous_and_other_members() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    let (_, owner) = register_admin(&ctx, &app, "Owner", "owner@example.com").await;
    let (_, member) = register(&app, "Member", "member@example.com").await;
    let draft = create_post(&app, &owner, "Secret draft", false).await;
    let public = create_post(&app, &owner, "Public post", true).await;
    let uri = format!("/api/posts/{}", draft);

    let (status, _) = get(&app, &uri, None).await;
    assert_eq!(status, 404);
    let (status, _) = get(&app, &uri, Some(&member)).await;
    assert_eq!(status, 404);
    let (status, body) = get(&app, &uri, Some(&owner)).await;
    assert_eq!(status, 200);
    assert_eq!(body["published"], false);

    let (status, body) = get(&app, "/api/posts/published", None).await;
    assert_eq!(status, 200);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![public]);

    let (status, body) = get(&app, "/api/posts/all", Some(&member)).await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = get(&app, "/api/posts/all", Some(&owner)).await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = get(&app, "/api/posts/all", None).await;
    assert_eq!(status, 401);
}

#[actix_web::test]
async fn test_blog_home_pagination() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    let (_, admin) = register_admin(&ctx, &app, "Admin", "admin@example.com").await;
    for i in 0..5 {
        create_post(&app, &admin, &format!("Post number {}", i), true).await;
    }
    create_post(&app, &admin, "Draft post", false).await;

    let (status, body) = get(&app, "/api/posts?page=2&pageSize=2", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["currentPage"], 2);
    assert_eq!(body["pageSize"], 2);
    assert_eq!(body["totalPosts"], 5);
    assert_eq!(body["totalPages"], 3);

    let titles: Vec<&str> = body["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Post number 2", "Post number 1"]);

    let (status, body) = get(&app, "/api/posts?page=abc&pageSize=0", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["pageSize"], 10);
    assert_eq!(body["posts"].as_array().unwrap().len(), 5);
}

#[actix_web::test]
async fn test_comment_lifecycle_and_ownership() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    let (_, admin) = register_admin(&ctx, &app, "Admin", "admin@example.com").await;
    let (_, author) = register(&app, "Author", "author@example.com").await;
    let (_, other) = register(&app, "Other", "other@example.com").await;
    let post_id = create_post(&app, &admin, "Hi There", true).await;

    let (status, comment) = post(
        &app,
        "/api/comments",
        json!({"content": "Nice post", "postId": post_id}),
        Some(&author),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(comment["author"]["name"], "Author");
    let comment_uri = format!("/api/comments/{}", comment["id"].as_i64().unwrap());

    let (status, body) = put(&app, &comment_uri, json!({"content": "Edited"}), Some(&other)).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "Not authorized to update this comment");

    let (status, body) = put(&app, &comment_uri, json!({"content": "Edited"}), Some(&author)).await;
    assert_eq!(status, 200);
    assert_eq!(body["content"], "Edited");

    let (status, body) = get(&app, &format!("/api/comments/post/{}", post_id), None).await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, detail) = get(&app, &format!("/api/posts/{}", post_id), None).await;
    assert_eq!(status, 200);
    assert_eq!(detail["comments"][0]["content"], "Edited");

    let (status, _) = delete(&app, &comment_uri, Some(&other)).await;
    assert_eq!(status, 403);

    // admins moderate any comment
    let (status, _) = delete(&app, &comment_uri, Some(&admin)).await;
    assert_eq!(status, 204);

    let (status, body) = delete(&app, &comment_uri, Some(&author)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Comment not found");
}

#[actix_web::test]
async fn test_comment_length_limits() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    let (_, admin) = register_admin(&ctx, &app, "Admin", "admin@example.com").await;
    let post_id = create_post(&app, &admin, "Hi There", true).await;

    let (status, _) = post(
        &app,
        "/api/comments",
        json!({"content": "a".repeat(500), "postId": post_id}),
        Some(&admin),
    )
    .await;
    assert_eq!(status, 201);

    let (status, body) = post(
        &app,
        "/api/comments",
        json!({"content": "a".repeat(501), "postId": post_id}),
        Some(&admin),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["details"][0]["message"], "Comment is too long");

    let (status, body) = post(
        &app,
        "/api/comments",
        json!({"content": "", "postId": post_id}),
        Some(&admin),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["details"][0]["message"], "Comment cannot be empty");
}

#[actix_web::test]
async fn test_comments_require_published_parent() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    let (_, admin) = register_admin(&ctx, &app, "Admin", "admin@example.com").await;
    let post_id = create_post(&app, &admin, "Hi There", true).await;
    let list_uri = format!("/api/comments/post/{}", post_id);

    let (status, _) = post(
        &app,
        "/api/comments",
        json!({"content": "First", "postId": post_id}),
        Some(&admin),
    )
    .await;
    assert_eq!(status, 201);

    let (status, _) = put(
        &app,
        &format!("/api/posts/{}", post_id),
        json!({"published": false}),
        Some(&admin),
    )
    .await;
    assert_eq!(status, 200);

    let (status, body) = get(&app, &list_uri, None).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Post not found or not published");

    let (status, _) = post(
        &app,
        "/api/comments",
        json!({"content": "Second", "postId": post_id}),
        Some(&admin),
    )
    .await;
    assert_eq!(status, 404);

    let (status, _) = get(&app, "/api/comments/post/424242", None).await;
    assert_eq!(status, 404);
}

#[actix_web::test]
async fn test_deleting_post_removes_its_comments() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    let (_, admin) = register_admin(&ctx, &app, "Admin", "admin@example.com").await;
    let post_id = create_post(&app, &admin, "Hi There", true).await;

    let (_, comment) = post(
        &app,
        "/api/comments",
        json!({"content": "Soon gone", "postId": post_id}),
        Some(&admin),
    )
    .await;
    let comment_id = comment["id"].as_i64().unwrap();

    let (status, _) = delete(&app, &format!("/api/posts/{}", post_id), Some(&admin)).await;
    assert_eq!(status, 204);

    let (status, _) = put(
        &app,
        &format!("/api/comments/{}", comment_id),
        json!({"content": "Still here?"}),
        Some(&admin),
    )
    .await;
    assert_eq!(status, 404);
}

#[actix_web::test]
async fn test_non_numeric_id_is_bad_request() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;

    let (status, body) = get(&app, "/api/posts/abc", None).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Invalid ID");
}

#[actix_web::test]
async fn test_unknown_route_returns_not_found() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;

    let (status, body) = get(&app, "/api/does-not-exist", None).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "Not Found"}));

    let (status, _) = get(&app, "/nowhere", None).await;
    assert_eq!(status, 404);
}

#[actix_web::test]
async fn test_health_endpoints() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;

    let (status, _) = get(&app, "/api/health", None).await;
    assert_eq!(status, 200);
    let (status, _) = get(&app, "/api/health/ready", None).await;
    assert_eq!(status, 200);
    let (status, _) = get(&app, "/api/health/live", None).await;
    assert_eq!(status, 200);
}

#[actix_web::test]
async fn test_promoted_member_may_create_posts() {
    let ctx = test_context();
    let app = setup_test_app(&ctx).await;
    let (member_id, token) = register(&app, "Lukas", "lukas@example.com").await;
    let body = json!({"title": "Hi There", "content": "1234567890", "published": true});

    let (status, _) = post(&app, "/api/posts", body.clone(), Some(&token)).await;
    assert_eq!(status, 403);

    let promoted = UserService::new(ctx.state.store.clone(), ctx.state.keys.clone())
        .promote_to_admin(member_id)
        .await
        .unwrap();
    assert_eq!(promoted.role, Role::Admin);

    let (status, created) = post(&app, "/api/posts", body, Some(&token)).await;
    assert_eq!(status, 201);
    assert_eq!(created["authorId"], member_id);

    let (status, profile) = get(&app, "/api/users/profile", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(profile["role"], "ADMIN");
}
