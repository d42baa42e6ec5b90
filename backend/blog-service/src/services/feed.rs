/// Feed service - posts from the authors a user follows
use std::sync::Arc;

use crate::db::BlogRepository;
use crate::error::Result;
use crate::models::{PostDetail, PostScope};
use crate::pagination::Page;
use crate::services::PostService;

pub struct FeedService {
    posts: PostService,
}

impl FeedService {
    pub fn new(repo: Arc<dyn BlogRepository>, per_page: usize) -> Self {
        Self {
            posts: PostService::new(repo, per_page),
        }
    }

    pub async fn feed_page(&self, user_id: i64, raw_page: Option<&str>) -> Result<Page<PostDetail>> {
        self.posts
            .list_page(&PostScope::FollowedBy(user_id), raw_page)
            .await
    }
}
