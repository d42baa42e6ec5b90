/// Post views - listings, single post, create and edit
use actix_multipart::Multipart;
use actix_web::{web, Either, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::warn;

use super::{full_path, redirect, Layout, PageQuery};
use crate::cache::{CachedPage, PageCache};
use crate::error::Result;
use crate::forms::{
    CommentForm, FieldMeta, FormErrors, PostForm, Validated, COMMENT_FORM_FIELDS, POST_FORM_FIELDS,
};
use crate::metrics::content::FORM_REJECTIONS_TOTAL;
use crate::middleware::{can_edit_post, RequireLogin, Viewer};
use crate::models::{CommentDetail, Group, PostDetail, PostScope, User};
use crate::pagination::Page;
use crate::routes::urls;
use crate::services::{CommentService, FollowService, PostService, ProfileStats};
use crate::state::AppState;
use crate::templates::HTML_CONTENT_TYPE;

/// Request body of the post form: urlencoded, or multipart when an image is attached.
pub type PostFormBody = Either<web::Form<PostForm>, Multipart>;

#[derive(Serialize)]
struct ListContext<'a> {
    #[serde(flatten)]
    layout: Layout<'a>,
    page: Page<PostDetail>,
    group: Option<Group>,
}

#[derive(Serialize)]
struct PostContext<'a> {
    #[serde(flatten)]
    layout: Layout<'a>,
    author: User,
    stats: ProfileStats,
    post: PostDetail,
    comments: Vec<CommentDetail>,
    form: CommentForm,
    fields: &'static [FieldMeta],
    can_edit: bool,
}

/// Messages per post form field; always present so templates can test them.
#[derive(Serialize)]
struct PostFieldErrors<'a> {
    text: &'a [String],
    group: &'a [String],
    image: &'a [String],
}

impl<'a> From<&'a FormErrors> for PostFieldErrors<'a> {
    fn from(errors: &'a FormErrors) -> Self {
        Self {
            text: errors.field("text"),
            group: errors.field("group"),
            image: errors.field("image"),
        }
    }
}

#[derive(Serialize)]
struct PostFormContext<'a> {
    #[serde(flatten)]
    layout: Layout<'a>,
    form: &'a PostForm,
    selected_group: Option<i64>,
    errors: PostFieldErrors<'a>,
    has_errors: bool,
    fields: &'static [FieldMeta],
    groups: Vec<Group>,
    /// "new" or "edit"
    switch: &'static str,
    post: Option<&'a PostDetail>,
}

fn posts(state: &AppState) -> PostService {
    PostService::new(state.repo.clone(), state.per_page())
}

async fn bind_post_form(body: PostFormBody, state: &AppState) -> Result<PostForm> {
    match body {
        Either::Left(form) => Ok(form.into_inner()),
        Either::Right(multipart) => {
            PostForm::from_multipart(multipart, state.media.max_upload_bytes()).await
        }
    }
}

async fn render_post_form(
    state: &AppState,
    layout: Layout<'_>,
    form: &PostForm,
    errors: &FormErrors,
    post: Option<&PostDetail>,
) -> Result<HttpResponse> {
    let context = PostFormContext {
        layout,
        form,
        selected_group: form
            .group
            .as_deref()
            .and_then(|g| g.trim().parse::<i64>().ok()),
        errors: PostFieldErrors::from(errors),
        has_errors: !errors.is_empty(),
        fields: POST_FORM_FIELDS,
        groups: posts(state).groups().await?,
        switch: if post.is_some() { "edit" } else { "new" },
        post,
    };
    state.templates.render_html("users/new_post.html", &context)
}

/// All posts, newest first. Responses are cached per viewer and page for the
/// configured TTL; new posts show up once the entry expires.
pub async fn index(
    req: HttpRequest,
    state: web::Data<AppState>,
    viewer: Viewer,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let key = PageCache::page_key(viewer.id(), &full_path(&req));
    match state.cache.get(&key).await {
        Ok(Some(cached)) => {
            return Ok(HttpResponse::Ok()
                .content_type(cached.content_type)
                .body(cached.body))
        }
        Ok(None) => {}
        Err(err) => warn!(%key, "page cache read failed, rendering uncached: {}", err),
    }

    let page = posts(&state)
        .list_page(&PostScope::All, query.page.as_deref())
        .await?;
    let context = ListContext {
        layout: Layout::for_viewer(&state, &viewer),
        page,
        group: None,
    };
    let body = state.templates.render("posts/index.html", &context)?;

    let cached = CachedPage {
        content_type: HTML_CONTENT_TYPE.to_string(),
        body,
    };
    if let Err(err) = state.cache.set(&key, &cached).await {
        warn!(%key, "page cache write failed: {}", err);
    }

    Ok(HttpResponse::Ok()
        .content_type(HTML_CONTENT_TYPE)
        .body(cached.body))
}

pub async fn group_posts(
    state: web::Data<AppState>,
    viewer: Viewer,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let service = posts(&state);
    let group = service.group(&slug).await?;
    let page = service
        .list_page(&PostScope::Group(group.id), query.page.as_deref())
        .await?;

    let context = ListContext {
        layout: Layout::for_viewer(&state, &viewer),
        page,
        group: Some(group),
    };
    state.templates.render_html("posts/group.html", &context)
}

pub async fn post_view(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let (author, post) = posts(&state).post_by_author(&username, post_id).await?;
    let stats = FollowService::new(state.repo.clone())
        .profile_stats(&author, viewer.id())
        .await?;
    let comments = CommentService::new(state.repo.clone())
        .list_for_post(post.id)
        .await?;

    let context = PostContext {
        layout: Layout::for_viewer(&state, &viewer),
        can_edit: viewer.id() == Some(author.id),
        author,
        stats,
        post,
        comments,
        form: CommentForm::default(),
        fields: COMMENT_FORM_FIELDS,
    };
    state.templates.render_html("posts/post.html", &context)
}

pub async fn new_post_form(
    state: web::Data<AppState>,
    RequireLogin(user): RequireLogin,
) -> Result<HttpResponse> {
    let layout = Layout::new(&state, Some(&user));
    render_post_form(&state, layout, &PostForm::default(), &FormErrors::default(), None).await
}

/// Publish a post and go back to the index; an invalid form is shown again
/// with its messages.
pub async fn create_post(
    state: web::Data<AppState>,
    RequireLogin(user): RequireLogin,
    body: PostFormBody,
) -> Result<HttpResponse> {
    let mut form = bind_post_form(body, &state).await?;

    match form.clean(state.repo.as_ref()).await? {
        Validated::Valid(cleaned) => {
            posts(&state)
                .create_post(user.id, cleaned, &state.media)
                .await?;
            Ok(redirect(&urls::index()))
        }
        Validated::Invalid(errors) => {
            FORM_REJECTIONS_TOTAL.with_label_values(&["post"]).inc();
            let layout = Layout::new(&state, Some(&user));
            render_post_form(&state, layout, &form, &errors, None).await
        }
    }
}

pub async fn edit_post_form(
    state: web::Data<AppState>,
    RequireLogin(user): RequireLogin,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let (_, post) = posts(&state).post_by_author(&username, post_id).await?;
    if !can_edit_post(&user, &post) {
        return Ok(redirect(&urls::post(&username, post_id)));
    }

    let form = PostForm::for_post(&post.text, post.group_id);
    let layout = Layout::new(&state, Some(&user));
    render_post_form(&state, layout, &form, &FormErrors::default(), Some(&post)).await
}

/// Save an author's edit. Anyone else is sent to the read-only post page.
pub async fn update_post(
    state: web::Data<AppState>,
    RequireLogin(user): RequireLogin,
    path: web::Path<(String, i64)>,
    body: PostFormBody,
) -> Result<HttpResponse> {
    let (username, post_id) = path.into_inner();
    let service = posts(&state);
    let (_, post) = service.post_by_author(&username, post_id).await?;
    if !can_edit_post(&user, &post) {
        return Ok(redirect(&urls::post(&username, post_id)));
    }

    let mut form = bind_post_form(body, &state).await?;
    match form.clean(state.repo.as_ref()).await? {
        Validated::Valid(cleaned) => {
            service
                .update_post(user.id, post_id, cleaned, &state.media)
                .await?;
            Ok(redirect(&urls::post(&user.username, post_id)))
        }
        Validated::Invalid(errors) => {
            FORM_REJECTIONS_TOTAL.with_label_values(&["post"]).inc();
            let layout = Layout::new(&state, Some(&user));
            render_post_form(&state, layout, &form, &errors, Some(&post)).await
        }
    }
}
