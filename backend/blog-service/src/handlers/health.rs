/// Health endpoints for load balancers and container health checks
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

use crate::state::AppState;

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

pub async fn health_summary(state: web::Data<AppState>) -> HttpResponse {
    match state.repo.health_check().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("Storage check failed: {}", e),
            "service": "blog-service"
        })),
    }
}

pub async fn readiness_summary(state: web::Data<AppState>) -> HttpResponse {
    let mut checks = HashMap::new();
    let mut ready = true;

    let start = Instant::now();
    let storage_result = state.repo.health_check().await;
    let storage_latency = Some(start.elapsed().as_millis() as u64);
    let storage_check = match storage_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: format!("{:?} storage reachable", state.config.database.backend),
            latency_ms: storage_latency,
        },
        Err(e) => {
            ready = false;
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("Storage check failed: {}", e),
                latency_ms: storage_latency,
            }
        }
    };
    checks.insert("storage".to_string(), storage_check);

    let start = Instant::now();
    let cache_result = state.cache.health_check().await;
    let cache_latency = Some(start.elapsed().as_millis() as u64);
    let cache_check = match cache_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: format!("{} page cache reachable", state.cache.backend_name()),
            latency_ms: cache_latency,
        },
        Err(e) => {
            ready = false;
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("Page cache check failed: {}", e),
                latency_ms: cache_latency,
            }
        }
    };
    checks.insert("cache".to_string(), cache_check);

    let status = if ready {
        ComponentStatus::Healthy
    } else {
        ComponentStatus::Unhealthy
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
