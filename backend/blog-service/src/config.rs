/// Configuration management for Blog Service
///
/// This module handles loading and managing configuration from environment
/// variables (optionally seeded from a `.env` file by `main`).
use serde::{Deserialize, Serialize};
use std::fmt;

/// Secret used outside production when `JWT_SECRET` is unset
const DEV_JWT_SECRET: &str = "blog-service-development-secret-do-not-use";

const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Token signing configuration
    pub auth: AuthConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        is_production(&self.env)
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; a single `*` allows any origin
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

/// Where accounts, posts and comments live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// In-process store; contents are lost on restart
    Memory,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

/// Token signing configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_days", &self.token_ttl_days)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = is_production(&app_env);

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("BLOG_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("BLOG_SERVICE_PORT")
                    .or_else(|_| std::env::var("PORT"))
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(3000),
            },
            cors: {
                let mut allowed_origins = split_list(
                    &std::env::var("CORS_ALLOWED_ORIGINS")
                        .unwrap_or_else(|_| "http://localhost:5173,http://localhost:5174".into()),
                );

                if let Ok(client_url) = std::env::var("CLIENT_URL") {
                    let client_url = client_url.trim().to_string();
                    if !client_url.is_empty() && !allowed_origins.contains(&client_url) {
                        allowed_origins.push(client_url);
                    }
                }

                let cors = CorsConfig { allowed_origins };
                if production && cors.allows_any() {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }
                cors
            },
            database: DatabaseConfig {
                backend: match std::env::var("STORAGE_BACKEND") {
                    Ok(value) => parse_backend(&value)?,
                    Err(_) => StorageBackend::Postgres,
                },
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgres://localhost/blog".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
                run_migrations: parse_bool_or_default("RUN_MIGRATIONS", true)?,
            },
            auth: AuthConfig {
                jwt_secret: match std::env::var("JWT_SECRET") {
                    Ok(secret) if production && secret.len() < MIN_PRODUCTION_SECRET_LEN => {
                        return Err(format!(
                            "JWT_SECRET must be at least {} bytes in production",
                            MIN_PRODUCTION_SECRET_LEN
                        ))
                    }
                    Ok(secret) => secret,
                    Err(_) if production => {
                        return Err("JWT_SECRET must be set in production".to_string())
                    }
                    Err(_) => DEV_JWT_SECRET.to_string(),
                },
                token_ttl_days: std::env::var("JWT_TTL_DAYS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|days: &i64| *days > 0)
                    .unwrap_or(crypto_core::jwt::DEFAULT_TOKEN_TTL_DAYS),
            },
        })
    }
}

fn is_production(env: &str) -> bool {
    env.eq_ignore_ascii_case("production") || env.eq_ignore_ascii_case("prod")
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_backend(value: &str) -> Result<StorageBackend, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
        "memory" => Ok(StorageBackend::Memory),
        other => Err(format!(
            "STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'",
            other
        )),
    }
}

fn parse_bool_or_default(key: &str, default: bool) -> Result<bool, String> {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(format!("Failed to parse {}='{}' as a boolean", key, val)),
        },
        Err(_) => Ok(default),
    }
}
