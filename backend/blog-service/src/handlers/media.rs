/// Uploaded media
use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::media::content_type_for;
use crate::state::AppState;

pub async fn serve_media(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let bytes = state.media.read(&path).await?;
    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&path))
        .body(bytes))
}
