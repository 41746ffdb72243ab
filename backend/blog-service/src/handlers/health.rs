/// Health endpoints for load balancers and container probes
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;

use crate::app_state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    store: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    latency_ms: u64,
    timestamp: String,
}

pub async fn health_summary(state: web::Data<AppState>) -> HttpResponse {
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "blog-service"
            }))
        }
    }
}

pub async fn readiness(state: web::Data<AppState>) -> HttpResponse {
    let start = Instant::now();
    let result = state.store.ping().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let response = match result {
        Ok(()) => ReadinessResponse {
            ready: true,
            store: ComponentStatus::Healthy,
            message: None,
            latency_ms,
            timestamp: Utc::now().to_rfc3339(),
        },
        Err(e) => ReadinessResponse {
            ready: false,
            store: ComponentStatus::Unhealthy,
            message: Some(e.to_string()),
            latency_ms,
            timestamp: Utc::now().to_rfc3339(),
        },
    };

    if response.ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
