/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpResponse};

use crate::app_state::AppState;
use crate::error::Result;
use crate::middleware::{MaybePrincipal, Principal};
use crate::models::requests::{CreatePostRequest, PageQuery, UpdatePostRequest};
use crate::services::PostService;

fn service(state: &AppState) -> PostService {
    PostService::new(state.store.clone())
}

/// Blog home: paginated published posts
pub async fn blog_home(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = service(&state).blog_home(&query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Every post visible to the caller
pub async fn get_all_posts(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse> {
    let posts = service(&state).list_all(&principal).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn get_published_posts(state: web::Data<AppState>) -> Result<HttpResponse> {
    let posts = service(&state).list_published().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Get a post by ID, with its comments
pub async fn get_post(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = service(&state)
        .get(post_id.into_inner(), principal.principal())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn create_post(
    state: web::Data<AppState>,
    principal: Principal,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let post = service(&state).create(&principal, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(post))
}

pub async fn update_post(
    state: web::Data<AppState>,
    principal: Principal,
    post_id: web::Path<i64>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    let post = service(&state)
        .update(&principal, post_id.into_inner(), req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    state: web::Data<AppState>,
    principal: Principal,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    service(&state)
        .delete(&principal, post_id.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
