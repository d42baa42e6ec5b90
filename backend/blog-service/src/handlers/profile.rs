/// Profile, follow graph and feed views
use actix_web::{web, HttpResponse};
use serde::Serialize;

use super::{redirect, Layout, PageQuery};
use crate::error::Result;
use crate::middleware::{can_follow, RequireLogin, Viewer};
use crate::models::{PostDetail, PostScope, User};
use crate::pagination::Page;
use crate::routes::urls;
use crate::services::{FeedService, FollowService, PostService, ProfileStats};
use crate::state::AppState;

#[derive(Serialize)]
struct ProfileContext<'a> {
    #[serde(flatten)]
    layout: Layout<'a>,
    author: User,
    author_display_name: String,
    stats: ProfileStats,
    /// Whether the follow/unfollow button applies (signed in, not own profile)
    can_follow: bool,
    page: Page<PostDetail>,
}

#[derive(Serialize)]
struct FeedContext<'a> {
    #[serde(flatten)]
    layout: Layout<'a>,
    page: Page<PostDetail>,
}

pub async fn profile(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let posts = PostService::new(state.repo.clone(), state.per_page());
    let author = posts.author(&username).await?;
    let page = posts
        .list_page(&PostScope::Author(author.id), query.page.as_deref())
        .await?;
    let stats = FollowService::new(state.repo.clone())
        .profile_stats(&author, viewer.id())
        .await?;

    let context = ProfileContext {
        layout: Layout::for_viewer(&state, &viewer),
        author_display_name: author.display_name(),
        can_follow: viewer.id().is_some_and(|id| can_follow(id, author.id)),
        author,
        stats,
        page,
    };
    state.templates.render_html("profile.html", &context)
}

pub async fn profile_follow(
    state: web::Data<AppState>,
    RequireLogin(user): RequireLogin,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let author = PostService::new(state.repo.clone(), state.per_page())
        .author(&username)
        .await?;
    FollowService::new(state.repo.clone())
        .follow(user.id, &author)
        .await?;
    Ok(redirect(&urls::profile(&author.username)))
}

pub async fn profile_unfollow(
    state: web::Data<AppState>,
    RequireLogin(user): RequireLogin,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let author = PostService::new(state.repo.clone(), state.per_page())
        .author(&username)
        .await?;
    FollowService::new(state.repo.clone())
        .unfollow(user.id, &author)
        .await?;
    Ok(redirect(&urls::profile(&author.username)))
}

/// Posts by the authors the signed-in user follows.
pub async fn follow_index(
    state: web::Data<AppState>,
    RequireLogin(user): RequireLogin,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = FeedService::new(state.repo.clone(), state.per_page())
        .feed_page(user.id, query.page.as_deref())
        .await?;

    let context = FeedContext {
        layout: Layout::new(&state, Some(&user)),
        page,
    };
    state.templates.render_html("posts/follow.html", &context)
}
