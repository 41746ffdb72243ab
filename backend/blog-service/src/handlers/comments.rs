/// Comment handlers - HTTP endpoints for comment operations
use actix_web::{web, HttpResponse};

use crate::app_state::AppState;
use crate::error::Result;
use crate::middleware::Principal;
use crate::models::requests::{CreateCommentRequest, UpdateCommentRequest};
use crate::services::CommentService;

fn service(state: &AppState) -> CommentService {
    CommentService::new(state.store.clone())
}

pub async fn create_comment(
    state: web::Data<AppState>,
    principal: Principal,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let comment = service(&state).create(&principal, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(comment))
}

/// Comments for a published post, newest first
pub async fn get_comments_by_post(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let comments = service(&state).list_for_post(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(comments))
}

pub async fn update_comment(
    state: web::Data<AppState>,
    principal: Principal,
    comment_id: web::Path<i64>,
    req: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse> {
    let comment = service(&state)
        .update(&principal, comment_id.into_inner(), req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn delete_comment(
    state: web::Data<AppState>,
    principal: Principal,
    comment_id: web::Path<i64>,
) -> Result<HttpResponse> {
    service(&state)
        .delete(&principal, comment_id.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
