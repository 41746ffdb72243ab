//! Database connection pool management
//!
//! Provides PostgreSQL pool creation and configuration for the blog services

mod metrics;

use metrics::update_pool_metrics;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

const METRICS_REFRESH: Duration = Duration::from_secs(30);

/// Database connection pool configuration
#[derive(Clone)]
pub struct DbConfig {
    /// Service name for metrics labeling
    pub service_name: String,
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Upper bound for opening the pool and for the startup `SELECT 1`
    pub connect_timeout_secs: u64,
    /// Connection acquisition timeout (get connection from pool)
    pub acquire_timeout_secs: u64,
    /// Connection idle timeout
    pub idle_timeout_secs: u64,
    /// Connection maximum lifetime
    pub max_lifetime_secs: u64,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("service_name", &self.service_name)
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            service_name: String::from("unknown"),
            database_url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl DbConfig {
    /// Build a config for `service_name` pointing at `database_url`,
    /// letting `DB_*` environment variables override the tuning knobs
    pub fn new(service_name: &str, database_url: &str, max_connections: u32) -> Self {
        let defaults = Self::default();

        Self {
            service_name: service_name.to_string(),
            database_url: database_url.to_string(),
            max_connections: env_or("DB_MAX_CONNECTIONS", max_connections),
            min_connections: env_or("DB_MIN_CONNECTIONS", defaults.min_connections),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", defaults.connect_timeout_secs),
            acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", defaults.acquire_timeout_secs),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        }
    }

    /// Log the effective pool settings (the URL is never logged)
    pub fn log_config(&self) {
        info!(
            service = %self.service_name,
            max = self.max_connections,
            min = self.min_connections,
            connect_timeout_secs = self.connect_timeout_secs,
            acquire_timeout_secs = self.acquire_timeout_secs,
            idle_timeout_secs = self.idle_timeout_secs,
            max_lifetime_secs = self.max_lifetime_secs,
            "database pool configuration"
        );
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections.min(self.max_connections))
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
            .test_before_acquire(true)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Connect, verify with a round trip, then keep the pool gauges fresh
pub async fn create_pool(config: DbConfig) -> Result<PgPool, sqlx::Error> {
    debug!(service = %config.service_name, "creating database pool");

    let pool = open(&config).await?;
    verify(&pool, &config).await?;

    info!(service = %config.service_name, "database pool ready");
    spawn_pool_monitor(pool.clone(), config.service_name.clone());

    Ok(pool)
}

async fn open(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    let connect = config.pool_options().connect(&config.database_url);

    match tokio::time::timeout(config.connect_timeout(), connect).await {
        Ok(result) => result,
        Err(_) => {
            error!(
                service = %config.service_name,
                timeout_secs = config.connect_timeout_secs,
                "database connection timed out"
            );
            Err(sqlx::Error::PoolTimedOut)
        }
    }
}

async fn verify(pool: &PgPool, config: &DbConfig) -> Result<(), sqlx::Error> {
    let query = sqlx::query("SELECT 1").execute(pool);

    match tokio::time::timeout(config.connect_timeout(), query).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => {
            error!(service = %config.service_name, error = %e, "database verification failed");
            Err(e)
        }
        Err(_) => {
            error!(
                service = %config.service_name,
                timeout_secs = config.connect_timeout_secs,
                "database verification timed out"
            );
            Err(sqlx::Error::PoolTimedOut)
        }
    }
}

fn spawn_pool_monitor(pool: PgPool, service: String) {
    update_pool_metrics(&pool, &service);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(METRICS_REFRESH);
        loop {
            interval.tick().await;
            if pool.is_closed() {
                debug!(service = %service, "pool closed; stopping gauge refresh");
                break;
            }
            update_pool_metrics(&pool, &service);
        }
    });
}
