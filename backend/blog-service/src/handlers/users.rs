/// Account handlers - registration, login, and the caller's profile
use actix_web::{web, HttpResponse};

use crate::app_state::AppState;
use crate::error::Result;
use crate::middleware::Principal;
use crate::models::requests::{LoginRequest, RegisterRequest, UpdateProfileRequest};
use crate::services::UserService;

fn service(state: &AppState) -> UserService {
    UserService::new(state.store.clone(), state.keys.clone())
}

/// Register a new account
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let auth = service(&state).register(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(auth))
}

pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let auth = service(&state).login(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(auth))
}

pub async fn get_profile(state: web::Data<AppState>, principal: Principal) -> Result<HttpResponse> {
    let profile = service(&state).profile(&principal).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn update_profile(
    state: web::Data<AppState>,
    principal: Principal,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    let user = service(&state)
        .update_profile(&principal, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn logout(state: web::Data<AppState>, principal: Principal) -> Result<HttpResponse> {
    service(&state).logout(&principal);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Successfully logged out"
    })))
}
