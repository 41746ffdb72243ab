/// HTTP handlers for blog endpoints
///
/// This module contains handlers for:
/// - Users: registration, login, profile, logout
/// - Posts: blog home, listings, CRUD
/// - Comments: per-post listing and CRUD
/// - Health: liveness and readiness probes
///
/// Everything is mounted under `/api` behind `JwtAuthMiddleware`.
pub mod comments;
pub mod health;
pub mod posts;
pub mod users;

use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::middleware::JwtAuthMiddleware;

/// Register every route plus the JSON/path error handlers and the 404 fallback
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(err.to_string()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|_err, _req| {
        AppError::BadRequest("Invalid ID".to_string()).into()
    }))
    .service(
        web::scope("/api")
            .wrap(JwtAuthMiddleware)
            .service(
                web::scope("/health")
                    .route("", web::get().to(health::health_summary))
                    .route("/ready", web::get().to(health::readiness))
                    .route("/live", web::get().to(health::liveness)),
            )
            .service(
                web::scope("/users")
                    .route("/register", web::post().to(users::register))
                    .route("/login", web::post().to(users::login))
                    .route("/logout", web::post().to(users::logout))
                    .service(
                        web::resource("/profile")
                            .route(web::get().to(users::get_profile))
                            .route(web::put().to(users::update_profile)),
                    ),
            )
            .service(
                web::scope("/posts")
                    .service(
                        web::resource("")
                            .route(web::get().to(posts::blog_home))
                            .route(web::post().to(posts::create_post)),
                    )
                    .route("/all", web::get().to(posts::get_all_posts))
                    .route("/published", web::get().to(posts::get_published_posts))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(posts::get_post))
                            .route(web::put().to(posts::update_post))
                            .route(web::delete().to(posts::delete_post)),
                    ),
            )
            .service(
                web::scope("/comments")
                    .route("", web::post().to(comments::create_comment))
                    .route("/post/{post_id}", web::get().to(comments::get_comments_by_post))
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(comments::update_comment))
                            .route(web::delete().to(comments::delete_comment)),
                    ),
            ),
    )
    .default_service(web::to(not_found));
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({"error": "Not Found"}))
}
