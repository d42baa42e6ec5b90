use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{anyhow, Context, Result};
use blog_service::cache::PageCache;
use blog_service::config::StorageBackend;
use blog_service::db::{self, BlogRepository, MemoryRepository, PostgresRepository};
use blog_service::{handlers, middleware, routes, AppState, Config};
use redis::aio::ConnectionManager;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Call the local health endpoint; used as the container healthcheck.
async fn run_healthcheck() -> Result<()> {
    let port = std::env::var("BLOG_SERVICE_PORT").unwrap_or_else(|_| "8000".to_string());
    let url = format!("http://127.0.0.1:{}/api/v1/health", port);
    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => Err(anyhow!("healthcheck HTTP status: {}", resp.status())),
        Err(e) => Err(anyhow!("healthcheck HTTP error: {}", e)),
    }
}

async fn build_repository(config: &Config) -> Result<Arc<dyn BlogRepository>> {
    match config.database.backend {
        StorageBackend::Postgres => {
            db::pool::log_config(&config.database);
            let pool = db::create_pool(&config.database)
                .await
                .context("Failed to create database pool")?;
            if config.database.run_migrations {
                db::migrate(&pool)
                    .await
                    .context("Failed to run migrations")?;
            }
            tracing::info!("Connected to PostgreSQL");
            Ok(Arc::new(PostgresRepository::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryRepository::new()))
        }
    }
}

async fn build_page_cache(config: &Config) -> Result<PageCache> {
    let ttl = config.cache.index_ttl_secs;
    let Some(url) = config.cache.redis_url.as_deref() else {
        tracing::info!(ttl_secs = ttl, "Using in-process page cache");
        return Ok(PageCache::local(ttl));
    };

    let client = redis::Client::open(url).context("Invalid REDIS_URL")?;
    let manager = ConnectionManager::new(client)
        .await
        .context("Failed to initialize Redis connection")?;
    tracing::info!(ttl_secs = ttl, "Using Redis page cache");
    Ok(PageCache::redis(manager, ttl))
}

/// Blog Service
///
/// Serves the blog's HTML views, the staff admin endpoints, uploaded media,
/// health checks and Prometheus metrics from a single actix-web server.
///
/// # Routes
///
/// - `/`, `/group/{slug}/`, `/{username}/`, `/{username}/{post_id}/` - reading
/// - `/new/`, `/{username}/{post_id}/edit/`, `/{username}/{post_id}/comment/` - writing
/// - `/follow/`, `/{username}/follow/`, `/{username}/unfollow/` - following
/// - `/api/v1/admin/*` - staff JSON listings
/// - `/api/v1/health*`, `/metrics` - operations
#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        return run_healthcheck().await;
    }

    // Initialize tracing
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    // Load configuration
    let config = Config::from_env()
        .map_err(|e| anyhow!(e))
        .context("Failed to load configuration")?;

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let repo = build_repository(&config).await?;
    let cache = build_page_cache(&config).await?;

    tokio::fs::create_dir_all(&config.media.root)
        .await
        .with_context(|| format!("Failed to create media root {}", config.media.root.display()))?;

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    let workers = config.app.workers.max(1);
    let cookie_name = config.session.cookie_name.clone();

    let state = AppState::new(config, repo, cache).context("Failed to build application state")?;
    let state = web::Data::new(state);

    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        let config = state.config.clone();
        App::new()
            .app_data(state.clone())
            .wrap(routes::error_handlers())
            .wrap(middleware::SessionMiddleware::new(
                state.sessions.clone(),
                &cookie_name,
            ))
            .wrap(middleware::MetricsMiddleware)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(|cfg| routes::configure(cfg, &config))
            .default_service(web::to(handlers::not_found))
    })
    .workers(workers)
    .bind(&bind_address)
    .context("Failed to bind HTTP server")?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Ok(())) => tracing::info!("HTTP server stopped"),
                Ok(Err(e)) => {
                    tracing::error!("HTTP server error: {}", e);
                    return Err(e).context("HTTP server error");
                }
                Err(e) => {
                    tracing::error!("HTTP server task join error: {}", e);
                    return Err(e).context("HTTP server task failed");
                }
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    tracing::info!("blog-service shutting down");
    Ok(())
}
