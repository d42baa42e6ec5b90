/// HTTP request handlers
///
/// HTML views render tera templates; `admin` and `health` answer JSON.
pub mod admin;
pub mod comments;
pub mod health;
pub mod media;
pub mod pages;
pub mod posts;
pub mod profile;

use actix_web::{http::header, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::middleware::{AuthUser, Viewer};
use crate::state::AppState;

pub use admin::{admin_comments, admin_create_group, admin_follows, admin_groups, admin_posts};
pub use comments::add_comment;
pub use health::{health_summary, liveness_check, readiness_summary};
pub use media::serve_media;
pub use pages::{about_author, about_tech, not_found};
pub use posts::{edit_post_form, group_posts, index, new_post_form, post_view, create_post, update_post};
pub use profile::{follow_index, profile, profile_follow, profile_unfollow};

/// `?page=` as typed by the visitor; parsed leniently by the paginator.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Values every page template can rely on.
#[derive(Debug, Serialize)]
pub struct Layout<'a> {
    pub viewer: Option<&'a AuthUser>,
    pub media_url: &'a str,
    pub login_url: &'a str,
}

impl<'a> Layout<'a> {
    pub fn new(state: &'a AppState, viewer: Option<&'a AuthUser>) -> Self {
        Self {
            viewer,
            media_url: &state.config.media.url,
            login_url: &state.config.session.login_url,
        }
    }

    pub fn for_viewer(state: &'a AppState, viewer: &'a Viewer) -> Self {
        Self::new(state, viewer.0.as_ref())
    }
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Path plus query string of the request.
pub fn full_path(req: &HttpRequest) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string())
}
