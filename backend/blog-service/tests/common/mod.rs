//! Shared harness for the HTTP integration tests.
//!
//! Builds the same `App` as `main` on top of the in-memory repository, a
//! local page cache and a throwaway media root.
#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use blog_service::cache::PageCache;
use blog_service::db::{BlogRepository, MemoryRepository};
use blog_service::models::{Group, NewGroup, NewPost, NewUser, Post, User};
use blog_service::{handlers, middleware, routes, AppState, Config};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub const PAGE_TTL_SECS: u64 = 20;

pub struct TestApp {
    pub state: web::Data<AppState>,
    next_user_id: AtomicI64,
    _media_root: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_cache_ttl(PAGE_TTL_SECS)
    }

    pub fn with_cache_ttl(ttl_secs: u64) -> Self {
        let media_root = tempfile::tempdir().expect("create media root");
        let mut config = Config::default();
        config.media.root = media_root.path().to_path_buf();
        config.session.secret = "integration-test-secret".to_string();
        config.cache.index_ttl_secs = ttl_secs;

        let repo: Arc<dyn BlogRepository> = Arc::new(MemoryRepository::new());
        let state =
            AppState::new(config, repo, PageCache::local(ttl_secs)).expect("build app state");

        Self {
            state: web::Data::new(state),
            next_user_id: AtomicI64::new(100),
            _media_root: media_root,
        }
    }

    pub fn repo(&self) -> &dyn BlogRepository {
        self.state.repo.as_ref()
    }

    pub async fn service(
        &self,
    ) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
    {
        let state = self.state.clone();
        let config = state.config.clone();
        test::init_service(
            App::new()
                .app_data(state.clone())
                .wrap(routes::error_handlers())
                .wrap(middleware::SessionMiddleware::new(
                    state.sessions.clone(),
                    &config.session.cookie_name,
                ))
                .wrap(middleware::MetricsMiddleware)
                .configure(|cfg| routes::configure(cfg, &config))
                .default_service(web::to(handlers::not_found)),
        )
        .await
    }

    /// An account already mirrored into the local `users` table.
    pub async fn user(&self, username: &str) -> User {
        self.repo()
            .ensure_user(NewUser {
                id: self.next_user_id.fetch_add(1, Ordering::SeqCst),
                username: username.to_string(),
                ..Default::default()
            })
            .await
            .expect("create user")
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.repo()
            .create_group(NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: format!("About {}", title),
            })
            .await
            .expect("create group")
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.repo()
            .create_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .expect("create post")
    }

    /// Session cookie for `user`, as the auth subsystem would set it.
    pub fn login(&self, user: &User) -> Cookie<'static> {
        self.cookie_for(user, false)
    }

    pub fn login_staff(&self, user: &User) -> Cookie<'static> {
        self.cookie_for(user, true)
    }

    fn cookie_for(&self, user: &User, is_staff: bool) -> Cookie<'static> {
        let token = self
            .state
            .sessions
            .issue(user, is_staff)
            .expect("issue session token");
        Cookie::new(self.state.config.session.cookie_name.clone(), token)
    }
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_text<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8_lossy(&bytes).into_owned()
}

/// A minimal `multipart/form-data` body.
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "----blogtestboundary7MA4YWxkTrZu0gW".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (self.content_type(), self.body)
    }
}

/// A valid 2x1 PNG.
pub fn small_png() -> Vec<u8> {
    let mut bytes = std::io::Cursor::new(Vec::new());
    image::DynamicImage::new_rgb8(2, 1)
        .write_to(&mut bytes, image::ImageOutputFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}
