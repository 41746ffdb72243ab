/// Shared fixtures for blog-service integration tests
///
/// Every test gets a fresh in-memory store, so tests are independent and need
/// no database.
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use blog_service::db::{MemoryStore, UserRepository};
use blog_service::models::Role;
use blog_service::{handlers, AppState};
use chrono::Duration;
use crypto_core::JwtKeys;
use serde_json::{json, Value};
use std::sync::Arc;

pub const TEST_SECRET: &[u8] = b"blog-service-integration-test-secret-0123456789";
pub const PASSWORD: &str = "Password123";

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

pub fn test_keys() -> JwtKeys {
    JwtKeys::from_secret(TEST_SECRET, Duration::days(30))
}

pub fn test_context() -> TestContext {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), test_keys());
    TestContext { store, state }
}

pub async fn setup_test_app(
    ctx: &TestContext,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(ctx.state.clone()))
            .configure(handlers::configure),
    )
    .await
}

/// Send a request and decode the JSON body (`Value::Null` for empty bodies)
pub async fn send<S>(app: &S, req: actix_http::Request) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

pub fn with_token(req: test::TestRequest, token: Option<&str>) -> test::TestRequest {
    match token {
        Some(token) => req.insert_header(("Authorization", format!("Bearer {}", token))),
        None => req,
    }
}

pub async fn get<S>(app: &S, uri: &str, token: Option<&str>) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = with_token(test::TestRequest::get().uri(uri), token).to_request();
    send(app, req).await
}

pub async fn post<S>(app: &S, uri: &str, body: Value, token: Option<&str>) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = with_token(test::TestRequest::post().uri(uri).set_json(body), token).to_request();
    send(app, req).await
}

pub async fn put<S>(app: &S, uri: &str, body: Value, token: Option<&str>) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = with_token(test::TestRequest::put().uri(uri).set_json(body), token).to_request();
    send(app, req).await
}

pub async fn delete<S>(app: &S, uri: &str, token: Option<&str>) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = with_token(test::TestRequest::delete().uri(uri), token).to_request();
    send(app, req).await
}

/// Register an account and return `(id, token)`
pub async fn register<S>(app: &S, name: &str, email: &str) -> (i64, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, body) = post(
        app,
        "/api/users/register",
        json!({"name": name, "email": email, "password": PASSWORD}),
        None,
    )
    .await;
    assert_eq!(status, 201, "register failed: {}", body);

    let id = body["id"].as_i64().expect("id in register response");
    let token = body["token"]
        .as_str()
        .expect("token in register response")
        .to_string();
    (id, token)
}

/// Register an account and grant it the admin role out-of-band
pub async fn register_admin<S>(ctx: &TestContext, app: &S, name: &str, email: &str) -> (i64, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (id, token) = register(app, name, email).await;
    ctx.store
        .set_user_role(id, Role::Admin)
        .await
        .expect("store available")
        .expect("user exists");
    (id, token)
}

/// Create a post as `token` and return its id
pub async fn create_post<S>(app: &S, token: &str, title: &str, published: bool) -> i64
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, body) = post(
        app,
        "/api/posts",
        json!({"title": title, "content": "1234567890", "published": published}),
        Some(token),
    )
    .await;
    assert_eq!(status, 201, "create post failed: {}", body);
    body["id"].as_i64().expect("id in post response")
}
