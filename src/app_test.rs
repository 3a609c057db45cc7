use std::sync::Arc;

use super::*;
use crate::flows::compose::ComposePhase;
use crate::flows::test_helpers::{Call, MockBackend, auth_success, post, rejected, user};
use crate::session::{KeyValueStore, MemoryStore, TOKEN_KEY};
use crate::types::MediaAsset;

fn signed_in_session() -> SessionStore {
    let session = SessionStore::ephemeral();
    session.save(&auth_success(1)).unwrap();
    session
}

fn created(post_id: i64) -> CreatedPost {
    CreatedPost::Summary { post_id, created_at: None, media_urls: vec![format!("https://cdn.test/{post_id}.jpg")] }
}

// =============================================================
// startup
// =============================================================

#[test]
fn new_restores_saved_login() {
    let app = App::new(MockBackend::new(), signed_in_session());
    assert!(app.auth.is_authenticated());
    assert_eq!(app.user(), Some(&user(1)));
}

#[test]
fn new_repairs_token_without_user() {
    let store = MemoryStore::new();
    store.set(TOKEN_KEY, "orphan").unwrap();

    let app = App::new(MockBackend::new(), SessionStore::new(store));

    assert!(!app.auth.is_authenticated());
    assert_eq!(app.session().token().unwrap(), None);
}

// =============================================================
// auth
// =============================================================

#[tokio::test]
async fn login_then_logout() {
    let mut app = App::new(MockBackend::new().with_auth(Ok(auth_success(2))), SessionStore::ephemeral());

    let outcome = app.login("user2@lumi.test", "pw").await;
    assert!(outcome.is_success());
    assert_eq!(app.session().token().unwrap().as_deref(), Some("tok-2"));

    let notice = app.logout();
    assert!(!notice.is_error());
    assert_eq!(app.session().load().unwrap(), Session::default());
    assert!(app.user().is_none());
}

#[tokio::test]
async fn register_goes_through_auth_flow() {
    let mut app = App::new(MockBackend::new().with_auth(Err(rejected("Username taken"))), SessionStore::ephemeral());
    let form = Registration {
        username: "taken".into(),
        email: "t@lumi.test".into(),
        password: "pw".into(),
        full_name: "T".into(),
    };

    let outcome = app.register(form).await;

    assert_eq!(outcome.notification.message, "Username taken");
    assert_eq!(app.auth.register.username, "taken");
}

// =============================================================
// posts
// =============================================================

#[tokio::test]
async fn publish_refreshes_feed() {
    let backend = MockBackend::new()
        .with_created(Ok(created(5)))
        .with_posts(Ok(vec![post(5, 0, false), post(4, 2, false)]));
    let mut app = App::new(backend, signed_in_session());
    app.compose.caption = "new".into();
    app.compose.add_asset(MediaAsset::from_bytes(b"x", "image/jpeg")).unwrap();

    let outcome = app.publish().await;

    assert!(outcome.is_success());
    assert_eq!(app.compose.phase(), ComposePhase::Done);
    assert_eq!(app.feed.posts().len(), 2);
    assert_eq!(app.feed.posts()[0].id, 5);
}

#[tokio::test]
async fn failed_publish_does_not_reload_feed() {
    let mut app = App::new(MockBackend::new().with_created(Err(rejected("Unauthorized"))), signed_in_session());
    app.compose.add_asset(MediaAsset::from_bytes(b"x", "image/jpeg")).unwrap();

    let outcome = app.publish().await;

    assert!(!outcome.is_success());
    assert!(app.feed.posts().is_empty());
    assert_eq!(app.compose.assets().len(), 1);
}

#[tokio::test]
async fn refresh_then_like() {
    let backend = MockBackend::new()
        .with_posts(Ok(vec![post(1, 0, false), post(2, 0, false)]))
        .with_like(Ok(LikeOutcome { liked: Some(true) }));
    let mut app = App::new(backend, signed_in_session());

    assert_eq!(app.refresh_feed().await.value, Some(2));
    assert!(app.like(1).await.is_success());

    assert!(app.feed.posts()[0].liked_by_viewer);
    assert!(!app.feed.posts()[1].liked_by_viewer);
}

#[tokio::test]
async fn verify_uses_stored_token() {
    let backend = MockBackend::new().with_verify(Err(rejected("Invalid token")));
    let mut app = App::new(backend, signed_in_session());

    let outcome = app.verify().await;

    assert_eq!(outcome.notification.message, "Invalid token");
    assert!(app.auth.is_authenticated());
}

#[tokio::test]
async fn like_sends_stored_token() {
    let backend = Arc::new(MockBackend::new().with_like(Ok(LikeOutcome { liked: None })));
    let mut app = App::new(Arc::clone(&backend), signed_in_session());

    app.like(9).await;

    assert_eq!(backend.calls(), vec![Call::Like { token: Some("tok-1".into()), post_id: 9 }]);
}

#[tokio::test]
async fn logout_then_like_sends_no_token() {
    let backend = Arc::new(MockBackend::new().with_like(Err(rejected("Unauthorized"))));
    let mut app = App::new(Arc::clone(&backend), signed_in_session());
    app.logout();

    let outcome = app.like(3).await;

    assert_eq!(outcome.notification.message, "Unauthorized");
    assert_eq!(backend.calls(), vec![Call::Like { token: None, post_id: 3 }]);
}
