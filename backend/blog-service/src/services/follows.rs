/// Follow service - the follow graph and profile counters
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::BlogRepository;
use crate::error::Result;
use crate::metrics::content::FOLLOW_EVENTS_TOTAL;
use crate::middleware::can_follow;
use crate::models::{PostScope, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    Removed,
    NotFollowing,
    /// Users cannot follow themselves; nothing is written
    SelfFollow,
}

impl FollowOutcome {
    fn label(self) -> &'static str {
        match self {
            FollowOutcome::Created => "follow",
            FollowOutcome::Removed => "unfollow",
            FollowOutcome::AlreadyFollowing | FollowOutcome::NotFollowing => "noop",
            FollowOutcome::SelfFollow => "self",
        }
    }
}

/// Counters shown on a profile page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileStats {
    pub posts: i64,
    pub followers: i64,
    pub following: i64,
    /// Whether the viewer follows this author
    pub is_following: bool,
}

pub struct FollowService {
    repo: Arc<dyn BlogRepository>,
}

impl FollowService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    pub async fn follow(&self, user_id: i64, author: &User) -> Result<FollowOutcome> {
        let outcome = if !can_follow(user_id, author.id) {
            FollowOutcome::SelfFollow
        } else if self.repo.create_follow(user_id, author.id).await? {
            FollowOutcome::Created
        } else {
            FollowOutcome::AlreadyFollowing
        };

        self.record(user_id, author, outcome);
        Ok(outcome)
    }

    pub async fn unfollow(&self, user_id: i64, author: &User) -> Result<FollowOutcome> {
        let outcome = if self.repo.delete_follow(user_id, author.id).await? {
            FollowOutcome::Removed
        } else {
            FollowOutcome::NotFollowing
        };

        self.record(user_id, author, outcome);
        Ok(outcome)
    }

    fn record(&self, user_id: i64, author: &User, outcome: FollowOutcome) {
        FOLLOW_EVENTS_TOTAL
            .with_label_values(&[outcome.label()])
            .inc();
        match outcome {
            FollowOutcome::Created | FollowOutcome::Removed => {
                info!(user_id, author_id = author.id, outcome = ?outcome, "Follow graph changed")
            }
            _ => debug!(user_id, author_id = author.id, outcome = ?outcome, "Follow request ignored"),
        }
    }

    pub async fn profile_stats(&self, author: &User, viewer: Option<i64>) -> Result<ProfileStats> {
        let is_following = match viewer {
            Some(user_id) if can_follow(user_id, author.id) => {
                self.repo.is_following(user_id, author.id).await?
            }
            _ => false,
        };

        Ok(ProfileStats {
            posts: self.repo.count_posts(&PostScope::Author(author.id)).await?,
            followers: self.repo.count_followers(author.id).await?,
            following: self.repo.count_following(author.id).await?,
            is_following,
        })
    }
}
