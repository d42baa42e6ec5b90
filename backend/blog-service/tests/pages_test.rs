//! Integration tests: static pages, error pages and the index cache.

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use common::{body_text, TestApp};

#[actix_web::test]
async fn test_about_pages_render() {
    let ctx = TestApp::new();
    let app = ctx.service().await;

    for uri in ["/about/author/", "/about/tech/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "GET {}", uri);
        assert!(resp
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }
}

#[actix_web::test]
async fn test_unknown_page_uses_404_template() {
    let ctx = TestApp::new();
    let app = ctx.service().await;

    let req = test::TestRequest::get()
        .uri("/deep/missing/page-here")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_text(resp).await;
    assert!(body.contains("Error 404"));
    // autoescape turns the slashes into `&#x2F;`
    assert!(body.contains("page-here"));
    assert!(body.contains("&#x2F;deep&#x2F;missing&#x2F;page-here"));
}

#[actix_web::test]
async fn test_unknown_profile_uses_404_template() {
    let ctx = TestApp::new();
    let app = ctx.service().await;

    let req = test::TestRequest::get().uri("/ghost/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_text(resp).await.contains("Error 404"));
}

#[actix_web::test]
async fn test_api_errors_stay_json() {
    let ctx = TestApp::new();
    let app = ctx.service().await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/posts")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("application/json"));
}

#[actix_web::test]
async fn test_index_is_cached_within_ttl() {
    let ctx = TestApp::new();
    let author = ctx.user("leo").await;
    ctx.post(&author, "First post", None).await;
    let app = ctx.service().await;

    let req = test::TestRequest::get().uri("/").to_request();
    let first = body_text(test::call_service(&app, req).await).await;
    assert!(first.contains("First post"));

    ctx.post(&author, "Second post", None).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let second = body_text(test::call_service(&app, req).await).await;
    assert_eq!(first, second);
    assert!(!second.contains("Second post"));

    // another page is another cache entry
    let req = test::TestRequest::get().uri("/?page=1").to_request();
    let fresh = body_text(test::call_service(&app, req).await).await;
    assert!(fresh.contains("Second post"));
}

#[actix_web::test]
async fn test_index_without_cache_ttl_is_fresh() {
    let ctx = TestApp::with_cache_ttl(0);
    let author = ctx.user("leo").await;
    ctx.post(&author, "First post", None).await;
    let app = ctx.service().await;

    let req = test::TestRequest::get().uri("/").to_request();
    body_text(test::call_service(&app, req).await).await;

    ctx.post(&author, "Second post", None).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(body.contains("Second post"));
}

#[actix_web::test]
async fn test_health_endpoints() {
    let ctx = TestApp::new();
    let app = ctx.service().await;

    for uri in ["/api/v1/health", "/api/v1/health/ready", "/api/v1/health/live"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "GET {}", uri);
    }
}
