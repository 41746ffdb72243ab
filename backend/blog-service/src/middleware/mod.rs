/// HTTP middleware utilities for blog-service
///
/// Provides bearer-token authentication, the `Principal` extractors built on
/// it, and request metrics. The auth middleware never rejects a request by
/// itself: it records either the authenticated principal or the reason
/// authentication failed, and each handler decides (through its extractor)
/// whether a principal is required.
pub mod permissions;

pub use permissions::*;

use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderValue, AUTHORIZATION};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use serde::Serialize;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

use crate::app_state::AppState;
use crate::error::{AppError, AuthFailure};
use crate::metrics::{access::record_auth_failure, http::observe_request};
use crate::models::{Role, User};

// =====================================================================
// JWT Authentication
// =====================================================================

/// The authenticated caller, loaded from the store on every request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Optional caller for public routes; a rejected token counts as anonymous
#[derive(Debug, Clone)]
pub struct MaybePrincipal(pub Option<Principal>);

impl MaybePrincipal {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

/// Actix middleware that resolves a Bearer token into a `Principal`.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let header = req.headers().get(AUTHORIZATION).cloned();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            if let Some(header) = header {
                let state = state.ok_or_else(|| {
                    AppError::Internal("application state not configured".to_string())
                })?;

                match authenticate(&state, &header).await {
                    Ok(principal) => {
                        req.extensions_mut().insert(principal);
                    }
                    Err(AppError::Unauthorized(failure)) => {
                        record_auth_failure(failure.reason());
                        tracing::debug!(reason = failure.reason(), "bearer token rejected");
                        req.extensions_mut().insert(failure);
                    }
                    Err(other) => return Err(other.into()),
                }
            }

            service.call(req).await
        })
    }
}

/// Verify the token and load its account
async fn authenticate(state: &AppState, header: &HeaderValue) -> Result<Principal, AppError> {
    let raw = header.to_str().map_err(|_| AuthFailure::InvalidToken)?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return Err(AuthFailure::MissingToken.into());
    }

    let claims = state.keys.verify(token).map_err(AuthFailure::from)?;
    let user_id = claims.subject_id().map_err(AuthFailure::from)?;

    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or(AuthFailure::UserNotFound)?;

    Ok(Principal::from(&user))
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let extensions = req.extensions();
        let result = match extensions.get::<Principal>() {
            Some(principal) => Ok(principal.clone()),
            // failures stored by the middleware were already counted there
            None => match extensions.get::<AuthFailure>() {
                Some(failure) => Err((*failure).into()),
                None => {
                    record_auth_failure(AuthFailure::MissingToken.reason());
                    Err(AuthFailure::MissingToken.into())
                }
            },
        };
        ready(result)
    }
}

impl FromRequest for MaybePrincipal {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(MaybePrincipal(
            req.extensions().get::<Principal>().cloned(),
        )))
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed();

            let (route, status) = match &res {
                Ok(resp) => (
                    resp.request()
                        .match_pattern()
                        .unwrap_or_else(|| "unmatched".to_string()),
                    resp.status().as_u16(),
                ),
                Err(err) => (
                    "unmatched".to_string(),
                    err.as_response_error().status_code().as_u16(),
                ),
            };

            observe_request(&method, &route, status, elapsed.as_secs_f64());
            tracing::debug!(%method, %route, status, elapsed_ms = elapsed.as_millis() as u64, "request completed");
            res
        })
    }
}
