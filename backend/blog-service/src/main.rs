use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, bail, Context, Result};
use blog_service::config::{Config, StorageBackend};
use blog_service::db::{BlogStore, MemoryStore, PgStore};
use blog_service::services::UserService;
use blog_service::{handlers, middleware, AppState};
use crypto_core::JwtKeys;
use db_pool::{create_pool, DbConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", err);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_healthcheck() -> Result<()> {
    let port = std::env::var("BLOG_SERVICE_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://127.0.0.1:{}/api/health", port);

    let resp = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .context("healthcheck request failed")?;
    if !resp.status().is_success() {
        bail!("healthcheck HTTP status: {}", resp.status());
    }
    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn BlogStore>> {
    match config.database.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let db_cfg = DbConfig::new(
                "blog-service",
                &config.database.url,
                config.database.max_connections,
            );
            db_cfg.log_config();

            let pool = create_pool(db_cfg)
                .await
                .context("Failed to create database pool")?;
            let store = PgStore::new(pool);

            if config.database.run_migrations {
                store
                    .run_migrations()
                    .await
                    .context("Failed to run database migrations")?;
                tracing::info!("Database migrations applied");
            }

            Ok(Arc::new(store))
        }
    }
}

fn build_cors(config: &Config) -> Cors {
    let mut cors = Cors::default();
    if config.cors.allows_any() {
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.cors.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
        cors = cors.supports_credentials();
    }

    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(3600)
}

/// Blog Service
///
/// REST API behind the admin and reader applications.
///
/// # Routes
///
/// - `/api/users/*` - register, login, profile, logout
/// - `/api/posts/*` - blog home, listings, CRUD
/// - `/api/comments/*` - per-post listing and CRUD
/// - `/api/health/*` - liveness and readiness
/// - `/metrics` - Prometheus
///
/// # Subcommands
///
/// - `healthcheck` - probe the running server (container healthchecks)
/// - `promote-admin <user-id>` - grant the admin role to an account
#[actix_web::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let command = args.next();

    if command.as_deref() == Some("healthcheck") {
        return run_healthcheck().await;
    }

    dotenvy::dotenv().ok();
    init_tracing();

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        tracing::error!("Configuration loading failed: {}", e);
        anyhow!("Failed to load configuration: {}", e)
    })?;

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let store = build_store(&config).await?;
    let keys = JwtKeys::from_secret(
        config.auth.jwt_secret.as_bytes(),
        chrono::Duration::days(config.auth.token_ttl_days),
    );

    if command.as_deref() == Some("promote-admin") {
        let user_id: i64 = args
            .next()
            .and_then(|v| v.parse().ok())
            .context("usage: blog-service promote-admin <user-id>")?;

        let user = UserService::new(store, keys)
            .promote_to_admin(user_id)
            .await
            .with_context(|| format!("Failed to promote user {}", user_id))?;
        println!("{} ({}) is now {}", user.name, user.email, user.role);
        return Ok(());
    }

    let state = web::Data::new(AppState::new(store, keys));
    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let http_config = config.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(build_cors(&http_config))
            .wrap(middleware::MetricsMiddleware)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(blog_service::metrics::serve_metrics))
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Ok(())) => tracing::info!("HTTP server stopped"),
                Ok(Err(e)) => {
                    tracing::error!("HTTP server error: {}", e);
                    return Err(e.into());
                }
                Err(e) => {
                    tracing::error!("HTTP server task failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    tracing::info!("Blog-service shutting down");
    Ok(())
}
