/// Authorization checks
///
/// Ownership rules for posts and the staff gate for the admin endpoints.
use crate::error::{AppError, Result};
use crate::models::PostDetail;

use super::AuthUser;

/// Only the author may edit a post.
pub fn can_edit_post(user: &AuthUser, post: &PostDetail) -> bool {
    post.author_id == user.id
}

/// Users may follow anyone but themselves.
pub fn can_follow(user_id: i64, author_id: i64) -> bool {
    user_id != author_id
}

pub fn check_staff(user: &AuthUser) -> Result<()> {
    if user.is_staff {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Staff access is required for the admin".to_string(),
        ))
    }
}
