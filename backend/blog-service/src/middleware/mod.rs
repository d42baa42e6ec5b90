/// HTTP middleware and request extractors for blog-service
///
/// - `session`: verifies the session token and records the caller
/// - `metrics`: per-route request counters and latency
/// - `permissions`: ownership and staff checks
///
/// Handlers ask for the caller through `Viewer` (anyone), `RequireLogin`
/// (redirects guests to the login page) or `StaffUser` (admin only).
pub mod metrics;
pub mod permissions;
pub mod session;

pub use metrics::MetricsMiddleware;
pub use permissions::*;
pub use session::{SessionClaims, SessionKeys, SessionMiddleware};

use actix_web::{dev::Payload, web, FromRequest, HttpMessage, HttpRequest};
use serde::Serialize;
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::routes::urls;
use crate::state::AppState;

/// Authenticated caller, stored in request extensions by `SessionMiddleware`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
}

/// The caller, if any.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<AuthUser>);

impl Viewer {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl FromRequest for Viewer {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Viewer(req.extensions().get::<AuthUser>().cloned())))
    }
}

/// A signed-in caller; guests are redirected to the login page with `next`
/// pointing back at the requested path.
#[derive(Debug, Clone)]
pub struct RequireLogin(pub AuthUser);

impl FromRequest for RequireLogin {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthUser>().cloned();
        ready(match user {
            Some(user) => Ok(RequireLogin(user)),
            None => {
                let login_url = req
                    .app_data::<web::Data<AppState>>()
                    .map(|state| state.config.session.login_url.clone())
                    .unwrap_or_else(|| crate::config::Config::default().session.login_url);
                let next = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or_else(|| req.path());
                Err(AppError::LoginRequired(urls::login_redirect(&login_url, next)))
            }
        })
    }
}

/// A signed-in staff member.
#[derive(Debug, Clone)]
pub struct StaffUser(pub AuthUser);

impl FromRequest for StaffUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthUser>().cloned();
        ready(match user {
            Some(user) => check_staff(&user).map(|()| StaffUser(user)),
            None => Err(AppError::Unauthorized(
                "Authentication required".to_string(),
            )),
        })
    }
}
