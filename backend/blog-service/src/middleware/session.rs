//! Session authentication.
//!
//! Accounts and logins belong to the external auth subsystem; it hands the
//! browser a signed HS256 token in the session cookie (API clients may send
//! it as a Bearer token instead). This middleware only verifies the token and
//! records the caller in the request extensions, mirroring the account into
//! the local `users` table first.

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{http::header, web, Error, HttpMessage};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

use super::AuthUser;
use crate::error::AppError;
use crate::models::User;
use crate::services::AccountService;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Signing material shared by token issuance and verification.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl_secs,
        }
    }

    /// Sign a session token for `user`.
    pub fn issue(&self, user: &User, is_staff: bool) -> crate::error::Result<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_staff,
            iat: now,
            exp: now + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> crate::error::Result<AuthUser> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid session token: {}", e)))?;
        let id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthorized("Invalid user ID".to_string()))?;

        Ok(AuthUser {
            id,
            username: data.claims.username,
            first_name: data.claims.first_name,
            last_name: data.claims.last_name,
            is_staff: data.claims.is_staff,
        })
    }
}

/// Resolves the caller from the session cookie or `Authorization: Bearer`.
/// Requests without a valid token continue anonymously.
pub struct SessionMiddleware {
    keys: Arc<SessionKeys>,
    cookie_name: Rc<str>,
}

impl SessionMiddleware {
    pub fn new(keys: Arc<SessionKeys>, cookie_name: &str) -> Self {
        Self {
            keys,
            cookie_name: Rc::from(cookie_name),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddlewareService<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            service: Rc::new(service),
            keys: self.keys.clone(),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
    keys: Arc<SessionKeys>,
    cookie_name: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .cookie(&self.cookie_name)
            .map(|c| c.value().to_string())
            .or_else(|| {
                req.headers()
                    .get(header::AUTHORIZATION)
                    .and_then(|h| h.to_str().ok())
                    .and_then(|h| h.strip_prefix("Bearer "))
                    .map(str::to_string)
            });

        let mut caller = None;
        if let Some(token) = token {
            match self.keys.verify(&token) {
                Ok(user) => {
                    req.extensions_mut().insert(user.clone());
                    caller = Some(user);
                }
                Err(err) => debug!(path = %req.path(), "ignoring session token: {}", err),
            }
        }

        let repo = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.repo.clone());
        let service = self.service.clone();
        Box::pin(async move {
            if let (Some(caller), Some(repo)) = (caller, repo) {
                if let Err(err) = AccountService::new(repo).sync(&caller).await {
                    warn!(user_id = caller.id, "failed to mirror session account: {}", err);
                }
            }
            service.call(req).await
        })
    }
}
