//! Integration tests: staff-only admin listings.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::TestApp;
use serde_json::{json, Value};

#[actix_web::test]
async fn test_admin_requires_staff() {
    let ctx = TestApp::new();
    let user = ctx.user("leo").await;
    let app = ctx.service().await;

    let req = test::TestRequest::get().uri("/api/v1/admin/groups").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/groups")
        .cookie(ctx.login(&user))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/groups")
        .cookie(ctx.login_staff(&user))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_empty_values_are_marked() {
    let ctx = TestApp::new();
    let staff = ctx.user("admin").await;
    ctx.repo()
        .create_group(blog_service::models::NewGroup {
            title: "Quiet".into(),
            slug: "quiet".into(),
            description: String::new(),
        })
        .await
        .unwrap();
    let app = ctx.service().await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/groups")
        .cookie(ctx.login_staff(&staff))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["slug"], "quiet");
    assert_eq!(body["results"][0]["description"], "-empty-");
}

#[actix_web::test]
async fn test_post_search_filters_on_text() {
    let ctx = TestApp::new();
    let staff = ctx.user("admin").await;
    let author = ctx.user("leo").await;
    ctx.post(&author, "All about cats", None).await;
    ctx.post(&author, "Dogs only", None).await;
    let app = ctx.service().await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/posts?q=CATS")
        .cookie(ctx.login_staff(&staff))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["text"], "All about cats");
    assert_eq!(body["results"][0]["author"], "leo");
}

#[actix_web::test]
async fn test_create_group_and_reject_duplicate_slug() {
    let ctx = TestApp::new();
    let staff = ctx.user("admin").await;
    let app = ctx.service().await;
    let payload = json!({ "title": "Cats", "slug": "cats", "description": "Meow" });

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/groups")
        .cookie(ctx.login_staff(&staff))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(ctx.repo().find_group_by_slug("cats").await.unwrap().is_some());

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/groups")
        .cookie(ctx.login_staff(&staff))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/groups")
        .cookie(ctx.login_staff(&staff))
        .set_json(json!({ "title": "Bad", "slug": "no spaces" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_follow_and_comment_listings() {
    let ctx = TestApp::new();
    let staff = ctx.user("admin").await;
    let author = ctx.user("leo").await;
    let reader = ctx.user("reader").await;
    let post = ctx.post(&author, "Commented post text", None).await;
    ctx.repo().create_follow(reader.id, author.id).await.unwrap();
    ctx.repo()
        .create_comment(blog_service::models::NewComment {
            post_id: post.id,
            author_id: reader.id,
            text: "First!".into(),
        })
        .await
        .unwrap();
    let app = ctx.service().await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/follows")
        .cookie(ctx.login_staff(&staff))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["results"][0]["user"], "reader");
    assert_eq!(body["results"][0]["author"], "leo");
    assert_eq!(body["has_next"], false);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/comments")
        .cookie(ctx.login_staff(&staff))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["results"][0]["text"], "First!");
    assert_eq!(body["results"][0]["post"], "Commented post ");
}

#[actix_web::test]
async fn test_user_named_admin_keeps_profile() {
    let ctx = TestApp::new();
    let admin = ctx.user("admin").await;
    ctx.post(&admin, "Posted by a user called admin", None).await;
    let app = ctx.service().await;

    let req = test::TestRequest::get().uri("/admin/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Posted by a user called admin"));
}
