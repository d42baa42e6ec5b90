/// Blog Service Library
///
/// A small blogging platform: authors publish text posts (optionally with an
/// image) into groups, readers comment and follow authors, and a paginated
/// feed collects posts from followed authors.
///
/// # Modules
///
/// - `handlers`: HTML views, admin JSON endpoints, health checks, media
/// - `routes`: URL dispatch, URL builders and the 404/500 pages
/// - `services`: Business logic over the repository
/// - `db`: `BlogRepository` with PostgreSQL and in-memory implementations
/// - `models`: Users, groups, posts, comments and follows
/// - `forms`: Form binding and field-level validation
/// - `pagination`: Page-number pagination
/// - `cache`: Whole-page cache with a fixed TTL
/// - `media`: Image upload validation and storage
/// - `templates`: Tera wrapper
/// - `middleware`: Session authentication, extractors and request metrics
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;
pub mod state;
pub mod templates;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
