//! Prometheus metrics for blog-service.
//!
//! Collectors are process-global (`lazy_static`) and exposed by
//! `serve_metrics` on `/metrics`.

use actix_web::HttpResponse;
use prometheus::{Encoder, TextEncoder};

pub mod cache;
pub mod content;
pub mod http;

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
