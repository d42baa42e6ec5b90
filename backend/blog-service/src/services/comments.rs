/// Comment service - comments under a post
use std::sync::Arc;
use tracing::info;

use crate::db::BlogRepository;
use crate::error::Result;
use crate::metrics::content::COMMENTS_CREATED_TOTAL;
use crate::models::{Comment, CommentDetail, NewComment};

pub struct CommentService {
    repo: Arc<dyn BlogRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    /// Oldest first.
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentDetail>> {
        self.repo.list_comments(post_id).await
    }

    pub async fn add_comment(&self, author_id: i64, post_id: i64, text: String) -> Result<Comment> {
        let comment = self
            .repo
            .create_comment(NewComment {
                post_id,
                author_id,
                text,
            })
            .await?;

        COMMENTS_CREATED_TOTAL.inc();
        info!(comment_id = comment.id, post_id, author_id, "Comment added");
        Ok(comment)
    }
}
