use dashmap::DashMap;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::metrics::cache::{PAGE_CACHE_EVENTS, PAGE_CACHE_WRITE_TOTAL};

/// A rendered response body as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPage {
    pub content_type: String,
    pub body: String,
}

enum Backend {
    Redis(ConnectionManager),
    Local(DashMap<String, (Instant, CachedPage)>),
}

/// Whole-page cache with a fixed TTL, backed by Redis or an in-process map.
pub struct PageCache {
    backend: Backend,
    ttl: Duration,
}

impl PageCache {
    pub fn redis(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self {
            backend: Backend::Redis(redis),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    pub fn local(ttl_secs: u64) -> Self {
        Self {
            backend: Backend::Local(DashMap::new()),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Redis(_) => "redis",
            Backend::Local(_) => "local",
        }
    }

    /// Key for a page as seen by `viewer` (user id, or none for guests).
    /// `path` includes the query string so every page number is its own entry.
    pub fn page_key(viewer: Option<i64>, path: &str) -> String {
        match viewer {
            Some(user_id) => format!("page:v1:{}:{}", user_id, path),
            None => format!("page:v1:anon:{}", path),
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<CachedPage>> {
        let cached = match &self.backend {
            Backend::Redis(redis) => {
                let mut conn = redis.clone();
                let data = conn.get::<_, Option<String>>(key).await.map_err(|e| {
                    warn!("Redis read error for page cache: {}", e);
                    PAGE_CACHE_EVENTS.with_label_values(&["error"]).inc();
                    AppError::Cache(e.to_string())
                })?;
                match data {
                    Some(raw) => Some(serde_json::from_str::<CachedPage>(&raw).map_err(|e| {
                        PAGE_CACHE_EVENTS.with_label_values(&["error"]).inc();
                        AppError::Cache(format!("Cache deserialization error: {}", e))
                    })?),
                    None => None,
                }
            }
            Backend::Local(map) => {
                let entry = map
                    .get(key)
                    .map(|entry| (entry.value().0, entry.value().1.clone()));
                match entry {
                    Some((expires_at, page)) if expires_at > Instant::now() => Some(page),
                    Some(_) => {
                        map.remove(key);
                        None
                    }
                    None => None,
                }
            }
        };

        let event = if cached.is_some() { "hit" } else { "miss" };
        PAGE_CACHE_EVENTS.with_label_values(&[event]).inc();
        debug!(%key, event, "page cache lookup");
        Ok(cached)
    }

    pub async fn set(&self, key: &str, page: &CachedPage) -> Result<()> {
        let result = match &self.backend {
            Backend::Redis(redis) => {
                let data = serde_json::to_string(page)?;
                let mut conn = redis.clone();
                conn.set_ex::<_, _, ()>(key, data, self.ttl.as_secs())
                    .await
                    .map_err(|e| AppError::Cache(e.to_string()))
            }
            Backend::Local(map) => {
                map.retain(|_, (expires_at, _)| *expires_at > Instant::now());
                map.insert(key.to_string(), (Instant::now() + self.ttl, page.clone()));
                Ok(())
            }
        };

        match &result {
            Ok(()) => {
                PAGE_CACHE_WRITE_TOTAL.with_label_values(&["success"]).inc();
                debug!(%key, ttl_secs = self.ttl.as_secs(), "page cache WRITE");
            }
            Err(e) => {
                warn!("Failed to write page cache: {}", e);
                PAGE_CACHE_WRITE_TOTAL.with_label_values(&["error"]).inc();
            }
        }
        result
    }

    /// Round-trip check used by the readiness endpoint.
    pub async fn health_check(&self) -> Result<()> {
        match &self.backend {
            Backend::Redis(redis) => {
                let mut conn = redis.clone();
                redis::cmd("PING")
                    .query_async::<_, String>(&mut conn)
                    .await
                    .map_err(|e| AppError::Cache(e.to_string()))?;
                Ok(())
            }
            Backend::Local(_) => Ok(()),
        }
    }
}
