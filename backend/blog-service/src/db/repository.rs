use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Comment, CommentDetail, FollowDetail, Group, NewComment, NewGroup, NewPost, NewUser, Post,
    PostChanges, PostDetail, PostScope, User,
};

/// Persistence interface of the blog.
/// Both `PostgresRepository` and `MemoryRepository` implement this.
#[async_trait]
pub trait BlogRepository: Send + Sync {
    // ---- users -------------------------------------------------------------

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Mirror an account from the auth subsystem, keyed by its id. Fails with
    /// `Conflict` when another id holds the username.
    async fn ensure_user(&self, user: NewUser) -> Result<User>;

    // ---- groups ------------------------------------------------------------

    async fn find_group_by_id(&self, group_id: i64) -> Result<Option<Group>>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    /// Groups ordered by title; `query` filters on the title.
    async fn list_groups(&self, query: Option<&str>) -> Result<Vec<Group>>;

    /// Fails with `Conflict` when the slug is taken.
    async fn create_group(&self, group: NewGroup) -> Result<Group>;

    // ---- posts -------------------------------------------------------------

    async fn count_posts(&self, scope: &PostScope) -> Result<i64>;

    /// Newest first.
    async fn list_posts(
        &self,
        scope: &PostScope,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostDetail>>;

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>>;

    async fn find_post_detail(&self, post_id: i64) -> Result<Option<PostDetail>>;

    async fn create_post(&self, post: NewPost) -> Result<Post>;

    /// Applies the changes only when `author_id` owns the post.
    async fn update_post(
        &self,
        post_id: i64,
        author_id: i64,
        changes: PostChanges,
    ) -> Result<Option<Post>>;

    // ---- comments ----------------------------------------------------------

    /// Oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentDetail>>;

    async fn count_comments(&self, post_id: Option<i64>) -> Result<i64>;

    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;

    /// Newest first; `query` filters on the text.
    async fn search_comments(
        &self,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentDetail>>;

    // ---- follows -----------------------------------------------------------

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool>;

    /// Returns false when the edge already existed.
    async fn create_follow(&self, user_id: i64, author_id: i64) -> Result<bool>;

    /// Returns false when there was nothing to delete.
    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool>;

    /// How many users follow `author_id`.
    async fn count_followers(&self, author_id: i64) -> Result<i64>;

    /// How many authors `user_id` follows.
    async fn count_following(&self, user_id: i64) -> Result<i64>;

    /// Newest first; `query` filters on the follower's username.
    async fn list_follows(
        &self,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FollowDetail>>;

    // ---- ops ---------------------------------------------------------------

    async fn health_check(&self) -> Result<()>;
}
