/// Blog Service Library
///
/// REST API for a multi-tenant blog: accounts, posts, and comments, gated by
/// ownership and role checks.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `models`: rows, request payloads, and response views
/// - `services`: Business logic layer (validate, authorize, persist)
/// - `db`: Store traits with PostgreSQL and in-memory implementations
/// - `middleware`: Bearer-token authentication, permissions, request metrics
/// - `validators`: Field-level input validation
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;
pub mod validators;

pub use app_state::AppState;
pub use config::Config;
pub use error::{AppError, Result};
