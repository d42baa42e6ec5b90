/// Comment handlers
use actix_web::{web, HttpResponse};
use tracing::debug;

use super::redirect;
use crate::error::Result;
use crate::forms::{CommentForm, Validated};
use crate::metrics::content::FORM_REJECTIONS_TOTAL;
use crate::middleware::RequireLogin;
use crate::routes::urls;
use crate::services::{CommentService, PostService};
use crate::state::AppState;

/// Add a comment and return to the post. An empty comment is dropped and the
/// visitor lands on the post page all the same.
pub async fn add_comment(
    state: web::Data<AppState>,
    RequireLogin(user): RequireLogin,
    path: web::Path<(String, i64)>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let (_, post) = PostService::new(state.repo.clone(), state.per_page())
        .post_by_author(&username, post_id)
        .await?;

    let mut form = form.into_inner();
    match form.clean() {
        Validated::Valid(text) => {
            CommentService::new(state.repo.clone())
                .add_comment(user.id, post.id, text)
                .await?;
        }
        Validated::Invalid(errors) => {
            FORM_REJECTIONS_TOTAL.with_label_values(&["comment"]).inc();
            debug!(post_id, user_id = user.id, ?errors, "Rejected comment");
        }
    }

    Ok(redirect(&urls::post(&username, post_id)))
}
