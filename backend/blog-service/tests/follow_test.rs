//! Integration tests: following authors and the personal feed.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{body_text, location, TestApp};

#[actix_web::test]
async fn test_follow_then_unfollow_restores_count() {
    let ctx = TestApp::new();
    let reader = ctx.user("reader").await;
    let author = ctx.user("leo").await;
    let app = ctx.service().await;

    let req = test::TestRequest::post()
        .uri("/leo/follow/")
        .cookie(ctx.login(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/leo/");
    assert_eq!(ctx.repo().count_followers(author.id).await.unwrap(), 1);
    assert!(ctx.repo().is_following(reader.id, author.id).await.unwrap());

    // a second follow changes nothing
    let req = test::TestRequest::post()
        .uri("/leo/follow/")
        .cookie(ctx.login(&reader))
        .to_request();
    test::call_service(&app, req).await;
    assert_eq!(ctx.repo().count_followers(author.id).await.unwrap(), 1);

    let req = test::TestRequest::post()
        .uri("/leo/unfollow/")
        .cookie(ctx.login(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/leo/");
    assert_eq!(ctx.repo().count_followers(author.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_cannot_follow_self() {
    let ctx = TestApp::new();
    let author = ctx.user("leo").await;
    let app = ctx.service().await;

    let req = test::TestRequest::post()
        .uri("/leo/follow/")
        .cookie(ctx.login(&author))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(ctx.repo().count_followers(author.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_guest_follow_redirects_to_login() {
    let ctx = TestApp::new();
    ctx.user("leo").await;
    let app = ctx.service().await;

    let req = test::TestRequest::post().uri("/leo/follow/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/leo/follow/");
}

#[actix_web::test]
async fn test_feed_shows_only_followed_authors() {
    let ctx = TestApp::new();
    let follower = ctx.user("follower").await;
    let stranger = ctx.user("stranger").await;
    let author = ctx.user("leo").await;
    let other = ctx.user("ivan").await;
    ctx.post(&author, "From the followed author", None).await;
    ctx.post(&other, "From someone else", None).await;
    ctx.repo().create_follow(follower.id, author.id).await.unwrap();
    let app = ctx.service().await;

    let req = test::TestRequest::get()
        .uri("/follow/")
        .cookie(ctx.login(&follower))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("From the followed author"));
    assert!(!body.contains("From someone else"));

    let req = test::TestRequest::get()
        .uri("/follow/")
        .cookie(ctx.login(&stranger))
        .to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(!body.contains("From the followed author"));
}

#[actix_web::test]
async fn test_profile_shows_follow_button_state() {
    let ctx = TestApp::new();
    let reader = ctx.user("reader").await;
    let author = ctx.user("leo").await;
    let app = ctx.service().await;

    let req = test::TestRequest::get()
        .uri("/leo/")
        .cookie(ctx.login(&reader))
        .to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(body.contains("action=\"/leo/follow/\""));

    ctx.repo().create_follow(reader.id, author.id).await.unwrap();
    let req = test::TestRequest::get()
        .uri("/leo/")
        .cookie(ctx.login(&reader))
        .to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(body.contains("action=\"/leo/unfollow/\""));
    assert!(body.contains("Followers: 1"));

    let req = test::TestRequest::get()
        .uri("/leo/")
        .cookie(ctx.login(&author))
        .to_request();
    let body = body_text(test::call_service(&app, req).await).await;
    assert!(!body.contains("/leo/follow/"));
    assert!(!body.contains("/leo/unfollow/"));
}
