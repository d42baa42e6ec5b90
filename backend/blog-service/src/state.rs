use std::sync::Arc;

use crate::cache::PageCache;
use crate::config::Config;
use crate::db::BlogRepository;
use crate::error::Result;
use crate::media::MediaStore;
use crate::middleware::SessionKeys;
use crate::templates::Templates;

/// Shared application state, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repo: Arc<dyn BlogRepository>,
    pub templates: Arc<Templates>,
    pub cache: Arc<PageCache>,
    pub media: Arc<MediaStore>,
    pub sessions: Arc<SessionKeys>,
}

impl AppState {
    /// Load templates and derive the media store and session keys from `config`.
    pub fn new(config: Config, repo: Arc<dyn BlogRepository>, cache: PageCache) -> Result<Self> {
        let templates = Templates::load(&config.templates.glob)?;
        let media = MediaStore::new(&config.media);
        let sessions = SessionKeys::new(&config.session.secret, config.session.token_ttl_secs);

        Ok(Self {
            config: Arc::new(config),
            repo,
            templates: Arc::new(templates),
            cache: Arc::new(cache),
            media: Arc::new(media),
            sessions: Arc::new(sessions),
        })
    }

    pub fn per_page(&self) -> usize {
        self.config.pagination.posts_per_page
    }
}
