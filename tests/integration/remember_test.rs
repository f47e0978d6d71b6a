//! Integration tests for remember-me tokens.

mod helpers;

use chrono::Duration;

use warden_auth::{MemoryTransport, SessionTransport};
use warden_core::ErrorKind;
use warden_database::store::UserStore;
use warden_entity::session::SessionOrigin;

#[tokio::test]
async fn test_token_resumes_until_expiry() {
    let app = helpers::TestApp::new();
    let user = app.register("alice@example.com", "secret123").await;
    let remember = &app.system.remember;

    let issued = remember.issue(user.id).await.unwrap();
    let token = issued.token.to_string();

    let session = remember.resume(&token).await.unwrap();
    assert_eq!(session.user_id, user.id);
    assert_eq!(session.origin, SessionOrigin::RememberToken);

    app.advance(remember.default_ttl() - Duration::seconds(1));
    assert_eq!(remember.resume(&token).await.unwrap().user_id, user.id);

    app.advance(Duration::seconds(1));
    let err = remember.resume(&token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Expired);
}

#[tokio::test]
async fn test_expired_credential_is_kept() {
    let app = helpers::TestApp::new();
    let user = app.register("bob@example.com", "secret123").await;
    let remember = &app.system.remember;

    let issued = remember
        .issue_with_ttl(user.id, Duration::minutes(1))
        .await
        .unwrap();
    app.advance(Duration::minutes(2));
    remember.resume(&issued.token.to_string()).await.unwrap_err();

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.remember_token.as_deref(), Some(issued.token.secret.as_str()));
}

#[tokio::test]
async fn test_reissue_invalidates_previous_token() {
    let app = helpers::TestApp::new();
    let user = app.register("carol@example.com", "secret123").await;
    let remember = &app.system.remember;

    let first = remember.issue(user.id).await.unwrap().token.to_string();
    remember.resume(&first).await.unwrap();

    let second = remember.issue(user.id).await.unwrap().token.to_string();
    assert_ne!(first, second);

    let err = remember.resume(&first).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unknown_secret_clears_stored_credential() {
    let app = helpers::TestApp::new();
    let user = app.register("dave@example.com", "secret123").await;
    let remember = &app.system.remember;

    let issued = remember.issue(user.id).await.unwrap();
    let forged = format!("{}-{}", user.id, "zzzzzzzzzzzzzzzz");

    let err = remember.resume(&forged).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = remember.resume(&issued.token.to_string()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_trailing_segment_is_part_of_the_secret() {
    let app = helpers::TestApp::new();
    let user = app.register("dora@example.com", "secret123").await;
    let remember = &app.system.remember;

    let issued = remember.issue(user.id).await.unwrap();
    let extended = format!("{}-extra", issued.token);

    let err = remember.resume(&extended).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_malformed_tokens() {
    let app = helpers::TestApp::new();
    let remember = &app.system.remember;

    for raw in ["", "abc", "-secretsecretsecret", "x1-secretsecretsecret", "7-short"] {
        let err = remember.resume(raw).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Malformed, "token {raw:?}");
    }
}

#[tokio::test]
async fn test_banned_account_cannot_resume() {
    let app = helpers::TestApp::new();
    let user = app.register("erin@example.com", "secret123").await;
    let remember = &app.system.remember;

    let token = remember.issue(user.id).await.unwrap().token.to_string();
    app.system.accounts.ban(user.id).await.unwrap();

    let err = remember.resume(&token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Banned);
}

#[tokio::test]
async fn test_pending_verification_cannot_resume() {
    let app = helpers::TestApp::new();
    let user = app.register("frank@example.com", "secret123").await;
    let remember = &app.system.remember;

    let token = remember.issue(user.id).await.unwrap().token.to_string();
    app.system.accounts.ban(user.id).await.unwrap();
    app.system.accounts.send_verification(user.id).await.unwrap();

    let err = remember.resume(&token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotVerified);
}

#[tokio::test]
async fn test_resume_does_not_record_a_login() {
    let app = helpers::TestApp::new();
    let user = app.register("grace@example.com", "secret123").await;

    let token = app.system.remember.issue(user.id).await.unwrap().token.to_string();
    app.system.remember.resume(&token).await.unwrap();

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.last_login.is_none());
}

#[tokio::test]
async fn test_is_logged_in_resumes_from_carried_token() {
    let app = helpers::TestApp::new();
    let user = app.register("heidi@example.com", "secret123").await;

    let issued = app.system.remember.issue(user.id).await.unwrap();
    let transport = MemoryTransport::with_remember_token(&issued.token.to_string(), issued.expires_at);

    let session = app
        .system
        .authenticator
        .is_logged_in(&transport)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.user_id, user.id);
    assert_eq!(transport.current_principal_id(), Some(user.id));
}

#[tokio::test]
async fn test_is_logged_in_treats_bad_token_as_anonymous() {
    let app = helpers::TestApp::new();
    let transport = MemoryTransport::with_remember_token("garbage", app.clock_now());

    let session = app.system.authenticator.is_logged_in(&transport).await.unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn test_is_logged_in_propagates_store_failure() {
    let app = helpers::TestApp::new();
    let user = app.register("ivan@example.com", "secret123").await;
    let issued = app.system.remember.issue(user.id).await.unwrap();
    let transport = MemoryTransport::with_remember_token(&issued.token.to_string(), issued.expires_at);

    app.store.set_unavailable(true);
    let err = app.system.authenticator.is_logged_in(&transport).await.unwrap_err();
    assert!(err.is_store_error());
}

#[tokio::test]
async fn test_logout_keeps_stored_credential() {
    let app = helpers::TestApp::new();
    let user = app.register("judy@example.com", "secret123").await;

    let transport = MemoryTransport::new();
    app.system
        .authenticator
        .login(&transport, "judy@example.com", "secret123", true, None)
        .await
        .unwrap();
    let (token, _) = transport.remember_cookie().unwrap();
    app.system.authenticator.logout(&transport);

    let session = app.system.remember.resume(&token).await.unwrap();
    assert_eq!(session.user_id, user.id);
}

#[tokio::test]
async fn test_revoke_drops_credential() {
    let app = helpers::TestApp::new();
    let user = app.register("ken@example.com", "secret123").await;
    let remember = &app.system.remember;

    let token = remember.issue(user.id).await.unwrap().token.to_string();
    remember.revoke(user.id).await.unwrap();

    let err = remember.resume(&token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
