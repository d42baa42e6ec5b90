/// Admin endpoints - staff-only JSON listings mirroring the admin registry
///
/// Each listing exposes the registered columns and a `q` search over one
/// field. Empty values are shown as `-empty-`.
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{AppError, Result};
use crate::middleware::StaffUser;
use crate::models::{NewGroup, PostScope};
use crate::pagination::Paginator;
use crate::state::AppState;

pub const EMPTY_VALUE_DISPLAY: &str = "-empty-";
pub const ADMIN_PER_PAGE: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    pub q: Option<String>,
    pub page: Option<String>,
}

impl AdminQuery {
    fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// 1-based page for listings without a total count.
    fn page_number(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }
}

#[derive(Debug, Serialize)]
struct Listing {
    page: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    has_next: bool,
    results: Vec<Value>,
}

fn display(value: &str) -> Value {
    if value.is_empty() {
        Value::from(EMPTY_VALUE_DISPLAY)
    } else {
        Value::from(value)
    }
}

/// Fetch one extra row to learn whether another page exists.
fn split_page<T>(mut rows: Vec<T>) -> (Vec<T>, bool) {
    let has_next = rows.len() > ADMIN_PER_PAGE;
    rows.truncate(ADMIN_PER_PAGE);
    (rows, has_next)
}

/// pk, text, pub_date, author; search on text.
pub async fn admin_posts(
    state: web::Data<AppState>,
    _staff: StaffUser,
    query: web::Query<AdminQuery>,
) -> Result<HttpResponse> {
    let scope = match query.search() {
        Some(q) => PostScope::TextContains(q.to_string()),
        None => PostScope::All,
    };
    let total = state.repo.count_posts(&scope).await?;
    let window = Paginator::new(total.max(0) as usize, ADMIN_PER_PAGE).get_page(query.page.as_deref());
    let posts = state
        .repo
        .list_posts(&scope, window.per_page as i64, window.offset() as i64)
        .await?;

    let results = posts
        .iter()
        .map(|p| {
            json!({
                "pk": p.id,
                "text": display(&p.text),
                "pub_date": p.pub_date,
                "author": display(&p.author_username),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(Listing {
        page: window.number as i64,
        num_pages: Some(window.num_pages),
        count: Some(window.total),
        has_next: window.has_next(),
        results,
    }))
}

/// pk, title, slug, description; search on title.
pub async fn admin_groups(
    state: web::Data<AppState>,
    _staff: StaffUser,
    query: web::Query<AdminQuery>,
) -> Result<HttpResponse> {
    let groups = state.repo.list_groups(query.search()).await?;
    let count = groups.len();
    let results = groups
        .iter()
        .map(|g| {
            json!({
                "pk": g.id,
                "title": display(&g.title),
                "slug": display(&g.slug),
                "description": display(&g.description),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(Listing {
        page: 1,
        num_pages: Some(1),
        count: Some(count),
        has_next: false,
        results,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 50
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub async fn admin_create_group(
    state: web::Data<AppState>,
    StaffUser(staff): StaffUser,
    req: web::Json<CreateGroupRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let title = req.title.trim();
    if title.is_empty() || title.chars().count() > 200 {
        return Err(AppError::Validation(
            "title must be between 1 and 200 characters".to_string(),
        ));
    }
    if !is_valid_slug(&req.slug) {
        return Err(AppError::Validation(
            "slug may only contain letters, numbers, underscores or hyphens".to_string(),
        ));
    }

    let group = state
        .repo
        .create_group(NewGroup {
            title: title.to_string(),
            slug: req.slug,
            description: req.description,
        })
        .await?;

    info!(group_id = group.id, slug = %group.slug, staff = %staff.username, "Group created");
    Ok(HttpResponse::Created().json(group))
}

/// user, author; search on the follower's username.
pub async fn admin_follows(
    state: web::Data<AppState>,
    _staff: StaffUser,
    query: web::Query<AdminQuery>,
) -> Result<HttpResponse> {
    let page = query.page_number();
    let rows = state
        .repo
        .list_follows(
            query.search(),
            ADMIN_PER_PAGE as i64 + 1,
            (page - 1) * ADMIN_PER_PAGE as i64,
        )
        .await?;
    let (rows, has_next) = split_page(rows);

    let results = rows
        .iter()
        .map(|f| {
            json!({
                "pk": f.id,
                "user": display(&f.user_username),
                "author": display(&f.author_username),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(Listing {
        page,
        num_pages: None,
        count: None,
        has_next,
        results,
    }))
}

/// post, author, text, created; search on text.
pub async fn admin_comments(
    state: web::Data<AppState>,
    _staff: StaffUser,
    query: web::Query<AdminQuery>,
) -> Result<HttpResponse> {
    let page = query.page_number();
    let rows = state
        .repo
        .search_comments(
            query.search(),
            ADMIN_PER_PAGE as i64 + 1,
            (page - 1) * ADMIN_PER_PAGE as i64,
        )
        .await?;
    let (rows, has_next) = split_page(rows);

    let results = rows
        .iter()
        .map(|c| {
            json!({
                "pk": c.id,
                "post": display(&c.post_title()),
                "author": display(&c.author_username),
                "text": display(&c.text),
                "created": c.created,
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(Listing {
        page,
        num_pages: None,
        count: None,
        has_next,
        results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_marks_empty_values() {
        assert_eq!(display(""), json!("-empty-"));
        assert_eq!(display("x"), json!("x"));
    }

    #[test]
    fn test_slug_rules() {
        assert!(is_valid_slug("cats-and_dogs2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug(&"a".repeat(51)));
    }

    #[test]
    fn test_page_number_is_lenient() {
        let q = |p: &str| AdminQuery {
            q: None,
            page: Some(p.to_string()),
        };
        assert_eq!(q("3").page_number(), 3);
        assert_eq!(q("0").page_number(), 1);
        assert_eq!(q("x").page_number(), 1);
    }
}
