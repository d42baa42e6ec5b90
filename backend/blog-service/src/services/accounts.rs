/// Account mirroring - keeps the local `users` row in step with the session
use std::sync::Arc;
use tracing::info;

use crate::db::BlogRepository;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{NewUser, User};

pub struct AccountService {
    repo: Arc<dyn BlogRepository>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    /// Make sure the signed-in caller has a local row with the session's id,
    /// username and names. Writes only when something changed.
    pub async fn sync(&self, caller: &AuthUser) -> Result<User> {
        if let Some(existing) = self.repo.find_user_by_id(caller.id).await? {
            if existing.username == caller.username
                && existing.first_name == caller.first_name
                && existing.last_name == caller.last_name
            {
                return Ok(existing);
            }
        }

        let user = self
            .repo
            .ensure_user(NewUser {
                id: caller.id,
                username: caller.username.clone(),
                first_name: caller.first_name.clone(),
                last_name: caller.last_name.clone(),
            })
            .await?;
        info!(user_id = user.id, username = %user.username, "Mirrored session account");
        Ok(user)
    }
}
