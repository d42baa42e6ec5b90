/// Business logic layer for blog-service
///
/// Services are cheap to construct per request from the shared repository:
/// - `AccountService`: mirrors the signed-in account into `users`
/// - `PostService`: listings, post lookup by author, create and edit
/// - `CommentService`: comments under a post
/// - `FollowService`: the follow graph and profile counters
/// - `FeedService`: posts from followed authors
pub mod accounts;
pub mod comments;
pub mod feed;
pub mod follows;
pub mod posts;

pub use accounts::AccountService;
pub use comments::CommentService;
pub use feed::FeedService;
pub use follows::{FollowOutcome, FollowService, ProfileStats};
pub use posts::PostService;
