//! Integration tests: commenting on posts.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{body_text, location, TestApp};

#[actix_web::test]
async fn test_signed_in_user_comments() {
    let ctx = TestApp::new();
    let author = ctx.user("leo").await;
    let reader = ctx.user("reader").await;
    let post = ctx.post(&author, "Discuss", None).await;
    let app = ctx.service().await;

    let req = test::TestRequest::post()
        .uri(&format!("/leo/{}/comment/", post.id))
        .cookie(ctx.login(&reader))
        .set_form([("text", "Nice one")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/leo/{}/", post.id));
    assert_eq!(ctx.repo().count_comments(Some(post.id)).await.unwrap(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("/leo/{}/", post.id))
        .to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(body.contains("Nice one"));
    assert!(body.contains("reader"));
}

#[actix_web::test]
async fn test_guest_cannot_comment() {
    let ctx = TestApp::new();
    let author = ctx.user("leo").await;
    let post = ctx.post(&author, "Discuss", None).await;
    let app = ctx.service().await;

    let req = test::TestRequest::post()
        .uri(&format!("/leo/{}/comment/", post.id))
        .set_form([("text", "Anonymous words")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        format!("/auth/login/?next=/leo/{}/comment/", post.id)
    );
    assert_eq!(ctx.repo().count_comments(Some(post.id)).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_empty_comment_is_dropped() {
    let ctx = TestApp::new();
    let author = ctx.user("leo").await;
    let post = ctx.post(&author, "Discuss", None).await;
    let app = ctx.service().await;

    let req = test::TestRequest::post()
        .uri(&format!("/leo/{}/comment/", post.id))
        .cookie(ctx.login(&author))
        .set_form([("text", "  ")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/leo/{}/", post.id));
    assert_eq!(ctx.repo().count_comments(Some(post.id)).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_comment_form_shown_only_when_signed_in() {
    let ctx = TestApp::new();
    let author = ctx.user("leo").await;
    let post = ctx.post(&author, "Discuss", None).await;
    let app = ctx.service().await;
    let uri = format!("/leo/{}/", post.id);
    let action = format!("action=\"/leo/{}/comment/\"", post.id);

    let req = test::TestRequest::get().uri(&uri).to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(!body.contains(&action));

    let req = test::TestRequest::get()
        .uri(&uri)
        .cookie(ctx.login(&author))
        .to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(body.contains(&action));
}
