//! URL dispatch table, URL builders and the HTML error pages.

use actix_web::dev::ServiceResponse;
use actix_web::http::header::{HeaderValue, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{web, HttpMessage};
use serde::Serialize;
use tracing::error;

use crate::config::Config;
use crate::handlers::{self, Layout};
use crate::metrics::serve_metrics;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::templates::HTML_CONTENT_TYPE;

/// Headroom for the non-file parts of a multipart post form.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;
const URLENCODED_FORM_LIMIT: usize = 256 * 1024;

/// Register every route. Fixed prefixes come before the `/{username}/...`
/// catch-alls, which are matched in registration order.
pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    cfg.app_data(web::PayloadConfig::new(
        config.media.max_upload_bytes + FORM_OVERHEAD_BYTES,
    ))
    .app_data(web::FormConfig::default().limit(URLENCODED_FORM_LIMIT))
    .route("/api/v1/health", web::get().to(handlers::health_summary))
    .route("/api/v1/health/ready", web::get().to(handlers::readiness_summary))
    .route("/api/v1/health/live", web::get().to(handlers::liveness_check))
    .route("/metrics", web::get().to(serve_metrics))
    .service(
        web::scope("/api/v1/admin")
            .route("/posts", web::get().to(handlers::admin_posts))
            .service(
                web::resource("/groups")
                    .route(web::get().to(handlers::admin_groups))
                    .route(web::post().to(handlers::admin_create_group)),
            )
            .route("/follows", web::get().to(handlers::admin_follows))
            .route("/comments", web::get().to(handlers::admin_comments)),
    )
    .route(
        &format!("{}{{path:.+}}", config.media.url),
        web::get().to(handlers::serve_media),
    )
    .service(
        web::resource("/")
            .name("index")
            .route(web::get().to(handlers::index)),
    )
    .service(
        web::resource("/group/{slug}/")
            .name("group")
            .route(web::get().to(handlers::group_posts)),
    )
    .service(
        web::resource("/new/")
            .name("new_post")
            .route(web::get().to(handlers::new_post_form))
            .route(web::post().to(handlers::create_post)),
    )
    .service(
        web::resource("/follow/")
            .name("follow_index")
            .route(web::get().to(handlers::follow_index)),
    )
    .service(
        web::resource("/about/author/")
            .name("about_author")
            .route(web::get().to(handlers::about_author)),
    )
    .service(
        web::resource("/about/tech/")
            .name("about_tech")
            .route(web::get().to(handlers::about_tech)),
    )
    .service(
        web::resource("/{username}/")
            .name("profile")
            .route(web::get().to(handlers::profile)),
    )
    .service(
        web::resource("/{username}/follow/")
            .name("profile_follow")
            .route(web::post().to(handlers::profile_follow)),
    )
    .service(
        web::resource("/{username}/unfollow/")
            .name("profile_unfollow")
            .route(web::post().to(handlers::profile_unfollow)),
    )
    .service(
        web::resource("/{username}/{post_id:\\d+}/")
            .name("post")
            .route(web::get().to(handlers::post_view)),
    )
    .service(
        web::resource("/{username}/{post_id:\\d+}/edit/")
            .name("post_edit")
            .route(web::get().to(handlers::edit_post_form))
            .route(web::post().to(handlers::update_post)),
    )
    .service(
        web::resource("/{username}/{post_id:\\d+}/comment/")
            .name("add_comment")
            .route(web::post().to(handlers::add_comment)),
    );
}

/// Renders `misc/404.html` and `misc/500.html` for HTML routes. JSON routes
/// keep their JSON error bodies.
pub fn error_handlers<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new()
        .handler(StatusCode::NOT_FOUND, render_not_found)
        .handler(StatusCode::INTERNAL_SERVER_ERROR, render_server_error)
}

fn render_not_found<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    render_status_page(res, "misc/404.html")
}

fn render_server_error<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    render_status_page(res, "misc/500.html")
}

#[derive(Serialize)]
struct StatusPageContext<'a> {
    #[serde(flatten)]
    layout: Layout<'a>,
    path: &'a str,
}

fn is_html_route(path: &str) -> bool {
    !(path.starts_with("/api/") || path == "/metrics")
}

fn render_status_page<B>(
    res: ServiceResponse<B>,
    template: &str,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let already_html = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    if already_html || !is_html_route(res.request().path()) {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let rendered = {
        let req = res.request();
        req.app_data::<web::Data<AppState>>().map(|state| {
            let viewer = req.extensions().get::<AuthUser>().cloned();
            let context = StatusPageContext {
                layout: Layout::new(state, viewer.as_ref()),
                path: req.path(),
            };
            state.templates.render(template, &context)
        })
    };

    match rendered {
        Some(Ok(body)) => {
            let (req, res) = res.into_parts();
            let mut res = res.set_body(body);
            res.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
            let res = ServiceResponse::new(req, res)
                .map_into_boxed_body()
                .map_into_right_body();
            Ok(ErrorHandlerResponse::Response(res))
        }
        Some(Err(err)) => {
            error!(%template, "failed to render status page: {}", err);
            Ok(ErrorHandlerResponse::Response(res.map_into_left_body()))
        }
        None => Ok(ErrorHandlerResponse::Response(res.map_into_left_body())),
    }
}

/// Builders for the URLs of the HTML views.
pub mod urls {
    pub fn index() -> String {
        "/".to_string()
    }

    pub fn group(slug: &str) -> String {
        format!("/group/{}/", slug)
    }

    pub fn new_post() -> String {
        "/new/".to_string()
    }

    pub fn follow_index() -> String {
        "/follow/".to_string()
    }

    pub fn profile(username: &str) -> String {
        format!("/{}/", username)
    }

    pub fn profile_follow(username: &str) -> String {
        format!("/{}/follow/", username)
    }

    pub fn profile_unfollow(username: &str) -> String {
        format!("/{}/unfollow/", username)
    }

    pub fn post(username: &str, post_id: i64) -> String {
        format!("/{}/{}/", username, post_id)
    }

    pub fn post_edit(username: &str, post_id: i64) -> String {
        format!("/{}/{}/edit/", username, post_id)
    }

    pub fn add_comment(username: &str, post_id: i64) -> String {
        format!("/{}/{}/comment/", username, post_id)
    }

    pub fn about_author() -> String {
        "/about/author/".to_string()
    }

    pub fn about_tech() -> String {
        "/about/tech/".to_string()
    }

    /// `login_url?next=<path>`; slashes in `next` stay readable.
    pub fn login_redirect(login_url: &str, next: &str) -> String {
        let next = urlencoding::encode(next).replace("%2F", "/");
        format!("{}?next={}", login_url, next)
    }

}
