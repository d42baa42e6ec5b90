/// Static pages and the fallback route
use actix_web::{web, HttpRequest, HttpResponse};

use super::Layout;
use crate::error::{AppError, Result};
use crate::middleware::Viewer;
use crate::state::AppState;

pub async fn about_author(state: web::Data<AppState>, viewer: Viewer) -> Result<HttpResponse> {
    state
        .templates
        .render_html("about/author.html", &Layout::for_viewer(&state, &viewer))
}

pub async fn about_tech(state: web::Data<AppState>, viewer: Viewer) -> Result<HttpResponse> {
    state
        .templates
        .render_html("about/tech.html", &Layout::for_viewer(&state, &viewer))
}

/// Default service; the 404 page itself is rendered by the error handlers.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse> {
    Err(AppError::NotFound(format!("no route for {}", req.path())))
}
