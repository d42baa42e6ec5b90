use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    pub static ref POSTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "blog_posts_created_total",
        "Posts published"
    )
    .expect("failed to register blog_posts_created_total");

    pub static ref POSTS_UPDATED_TOTAL: IntCounter = register_int_counter!(
        "blog_posts_updated_total",
        "Posts edited by their authors"
    )
    .expect("failed to register blog_posts_updated_total");

    pub static ref COMMENTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "blog_comments_created_total",
        "Comments added to posts"
    )
    .expect("failed to register blog_comments_created_total");

    /// Follow graph changes (follow/unfollow/noop).
    pub static ref FOLLOW_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_follow_events_total",
        "Follow and unfollow requests segmented by outcome",
        &["action"]
    )
    .expect("failed to register blog_follow_events_total");

    /// Form submissions rejected by validation, by form.
    pub static ref FORM_REJECTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_form_rejections_total",
        "Invalid form submissions segmented by form",
        &["form"]
    )
    .expect("failed to register blog_form_rejections_total");
}
