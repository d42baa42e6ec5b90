/// Configuration management for Blog Service
///
/// Everything is read from environment variables (a `.env` file is loaded by
/// the binary before `Config::from_env` runs).
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Development-only session secret; refused when `APP_ENV=production`.
pub const DEV_SESSION_SECRET: &str = "yatube-development-session-secret";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Page cache configuration
    pub cache: CacheConfig,
    /// Session / authentication configuration
    pub session: SessionConfig,
    /// Pagination settings
    pub pagination: PaginationConfig,
    /// Uploaded media configuration
    pub media: MediaConfig,
    /// Template directory
    pub templates: TemplateConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Number of actix workers
    pub workers: usize,
}

/// Which repository implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

/// Page cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL; the in-process cache is used when absent
    pub redis_url: Option<String>,
    /// Lifetime of a cached index page
    pub index_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub cookie_name: String,
    /// Lifetime of tokens issued by `SessionKeys::issue`
    pub token_ttl_secs: i64,
    /// Where login-only views send anonymous visitors
    pub login_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub posts_per_page: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub root: PathBuf,
    pub url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Glob handed to tera, e.g. `templates/**/*.html`
    pub glob: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                env: "development".to_string(),
                host: "0.0.0.0".to_string(),
                port: 8000,
                workers: 4,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: "postgresql://localhost/yatube".to_string(),
                max_connections: 10,
                min_connections: 2,
                connect_timeout_secs: 5,
                acquire_timeout_secs: 10,
                idle_timeout_secs: 600,
                max_lifetime_secs: 1800,
                run_migrations: true,
            },
            cache: CacheConfig {
                redis_url: None,
                index_ttl_secs: 20,
            },
            session: SessionConfig {
                secret: DEV_SESSION_SECRET.to_string(),
                cookie_name: "sessionid".to_string(),
                token_ttl_secs: 14 * 24 * 60 * 60,
                login_url: "/auth/login/".to_string(),
            },
            pagination: PaginationConfig { posts_per_page: 10 },
            media: MediaConfig {
                root: PathBuf::from("media"),
                url: "/media/".to_string(),
                max_upload_bytes: 5 * 1024 * 1024,
            },
            templates: TemplateConfig {
                glob: concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html").to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let defaults = Config::default();
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| defaults.app.env.clone());
        let production = app_env.eq_ignore_ascii_case("production");

        let backend = match std::env::var("BLOG_STORAGE") {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "postgres" | "postgresql" => StorageBackend::Postgres,
                "memory" => StorageBackend::Memory,
                other => return Err(format!("Unknown BLOG_STORAGE '{}'", other)),
            },
            Err(_) => defaults.database.backend,
        };

        let session = {
            let secret = match std::env::var("SESSION_SECRET") {
                Ok(value) => value,
                Err(_) if production => {
                    return Err("SESSION_SECRET must be set in production".to_string())
                }
                Err(_) => defaults.session.secret.clone(),
            };
            if production && (secret.trim().len() < 32 || secret == DEV_SESSION_SECRET) {
                return Err(
                    "SESSION_SECRET must be at least 32 characters and not the development default in production"
                        .to_string(),
                );
            }

            SessionConfig {
                secret,
                cookie_name: std::env::var("SESSION_COOKIE_NAME")
                    .unwrap_or(defaults.session.cookie_name),
                token_ttl_secs: parse_env_or_default(
                    "SESSION_TOKEN_TTL_SECS",
                    defaults.session.token_ttl_secs,
                )?,
                login_url: std::env::var("LOGIN_URL").unwrap_or(defaults.session.login_url),
            }
        };

        let posts_per_page = parse_env_or_default(
            "POSTS_PER_PAGE",
            defaults.pagination.posts_per_page,
        )?;
        if posts_per_page == 0 {
            return Err("POSTS_PER_PAGE must be greater than zero".to_string());
        }

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("BLOG_SERVICE_HOST").unwrap_or(defaults.app.host),
                port: parse_env_or_default("BLOG_SERVICE_PORT", defaults.app.port)?,
                workers: parse_env_or_default("BLOG_SERVICE_WORKERS", defaults.app.workers)?,
            },
            database: DatabaseConfig {
                backend,
                url: std::env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: parse_env_or_default(
                    "DB_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                )?,
                min_connections: parse_env_or_default(
                    "DB_MIN_CONNECTIONS",
                    defaults.database.min_connections,
                )?,
                connect_timeout_secs: parse_env_or_default(
                    "DB_CONNECT_TIMEOUT_SECS",
                    defaults.database.connect_timeout_secs,
                )?,
                acquire_timeout_secs: parse_env_or_default(
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    defaults.database.acquire_timeout_secs,
                )?,
                idle_timeout_secs: parse_env_or_default(
                    "DB_IDLE_TIMEOUT_SECS",
                    defaults.database.idle_timeout_secs,
                )?,
                max_lifetime_secs: parse_env_or_default(
                    "DB_MAX_LIFETIME_SECS",
                    defaults.database.max_lifetime_secs,
                )?,
                run_migrations: parse_env_or_default(
                    "RUN_MIGRATIONS",
                    defaults.database.run_migrations,
                )?,
            },
            cache: CacheConfig {
                redis_url: std::env::var("REDIS_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty()),
                index_ttl_secs: parse_env_or_default(
                    "INDEX_CACHE_TTL_SECS",
                    defaults.cache.index_ttl_secs,
                )?,
            },
            session,
            pagination: PaginationConfig { posts_per_page },
            media: MediaConfig {
                root: std::env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.media.root),
                url: normalize_prefix(
                    &std::env::var("MEDIA_URL").unwrap_or(defaults.media.url),
                ),
                max_upload_bytes: parse_env_or_default(
                    "MEDIA_MAX_UPLOAD_BYTES",
                    defaults.media.max_upload_bytes,
                )?,
            },
            templates: TemplateConfig {
                glob: std::env::var("TEMPLATE_DIR")
                    .map(|dir| format!("{}/**/*.html", dir.trim_end_matches('/')))
                    .unwrap_or(defaults.templates.glob),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}

/// Media URL prefixes always start and end with a slash.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
