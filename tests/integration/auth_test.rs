//! Integration tests for password login and the login throttle.

mod helpers;

use chrono::Duration;

use warden_auth::{MemoryTransport, SessionTransport};
use warden_core::ErrorKind;
use warden_core::config::AppConfig;
use warden_database::store::UserStore;
use warden_entity::session::SessionOrigin;

#[tokio::test]
async fn test_register_then_login_at_minimum_length() {
    let app = helpers::TestApp::new();
    let user = app.register("alice@example.com", "abcd1").await;

    let session = app.login("alice@example.com", "abcd1").await.unwrap();
    assert_eq!(session.user_id, user.id);
    assert_eq!(session.origin, SessionOrigin::Password);
}

#[tokio::test]
async fn test_short_password_rejected_at_registration_and_login() {
    let app = helpers::TestApp::new();

    let err = app
        .system
        .accounts
        .register("bob@example.com", "abcd", "")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    app.register("bob@example.com", "abcd1").await;
    let err = app.login("bob@example.com", "abcd").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_validation_happens_before_store_access() {
    let app = helpers::TestApp::new();
    app.store.set_unavailable(true);

    let err = app.login("not-an-email", "abcd1").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_login_records_last_login_and_activity() {
    let app = helpers::TestApp::new();
    let user = app.register("carol@example.com", "secret123").await;
    assert!(user.last_login.is_none());

    app.advance(Duration::minutes(5));
    let now = app.clock_now();
    let transport = MemoryTransport::new();
    app.system
        .authenticator
        .login(&transport, "carol@example.com", "secret123", false, Some("10.0.0.7"))
        .await
        .unwrap();

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.last_login, Some(now));
    assert_eq!(stored.last_activity, Some(now));
    assert_eq!(stored.ip_address.as_deref(), Some("10.0.0.7"));
    assert_eq!(transport.current_principal_id(), Some(user.id));
}

#[tokio::test]
async fn test_email_lookup_ignores_case() {
    let app = helpers::TestApp::new();
    app.register("Dave@Example.com", "secret123").await;

    assert!(app.login("dave@example.com", "secret123").await.is_ok());
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let app = helpers::TestApp::new();
    app.register("erin@example.com", "secret123").await;

    let wrong = app.login("erin@example.com", "secret124").await.unwrap_err();
    let unknown = app.login("nobody@example.com", "secret123").await.unwrap_err();
    assert_eq!(wrong.kind, ErrorKind::InvalidCredentials);
    assert_eq!(unknown.kind, ErrorKind::InvalidCredentials);
    assert_eq!(wrong.message, unknown.message);
}

#[tokio::test]
async fn test_failed_login_advances_throttle() {
    let app = helpers::TestApp::new();
    let user = app.register("frank@example.com", "secret123").await;

    app.login("frank@example.com", "wrong1").await.unwrap_err();
    app.advance(Duration::seconds(10));
    app.login("frank@example.com", "wrong2").await.unwrap_err();

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 2);
    assert_eq!(stored.last_login_attempt, Some(app.clock_now()));
    assert!(stored.locked_until.is_none());
}

#[tokio::test]
async fn test_lockout_refuses_correct_password_until_it_elapses() {
    let app = helpers::TestApp::new();
    let max = app.config.throttle.max_attempts;
    let step = app.config.throttle.lockout_step_seconds as i64;
    app.register("grace@example.com", "secret123").await;

    for _ in 0..max {
        let err = app.login("grace@example.com", "wrong1").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    }

    let err = app.login("grace@example.com", "secret123").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AttemptsExceeded);

    app.advance(Duration::seconds(step - 1));
    let err = app.login("grace@example.com", "secret123").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AttemptsExceeded);

    app.advance(Duration::seconds(1));
    assert!(app.login("grace@example.com", "secret123").await.is_ok());
}

#[tokio::test]
async fn test_successful_login_clears_throttle_state() {
    let app = helpers::TestApp::new();
    let user = app.register("heidi@example.com", "secret123").await;

    app.login("heidi@example.com", "wrong1").await.unwrap_err();
    app.login("heidi@example.com", "secret123").await.unwrap();

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 0);
    assert!(stored.last_login_attempt.is_none());
}

#[tokio::test]
async fn test_quiet_period_restarts_failure_count() {
    let app = helpers::TestApp::new();
    let user = app.register("ivan@example.com", "secret123").await;

    for _ in 0..3 {
        app.login("ivan@example.com", "wrong1").await.unwrap_err();
    }
    app.advance(Duration::seconds(
        app.config.throttle.reset_after_seconds as i64 + 1,
    ));
    app.login("ivan@example.com", "wrong1").await.unwrap_err();

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 1);
}

#[tokio::test]
async fn test_banned_account_cannot_log_in() {
    let app = helpers::TestApp::new();
    let user = app.register("judy@example.com", "secret123").await;
    app.system.accounts.ban(user.id).await.unwrap();

    let err = app.login("judy@example.com", "secret123").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
}

#[tokio::test]
async fn test_unverified_account_is_refused() {
    let mut config = AppConfig::default();
    config.auth.verification = true;
    let app = helpers::TestApp::with_config(config);
    app.register("ken@example.com", "secret123").await;

    let err = app.login("ken@example.com", "secret123").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotVerified);
}

#[tokio::test]
async fn test_login_with_remember_hands_out_token() {
    let app = helpers::TestApp::new();
    let user = app.register("leo@example.com", "secret123").await;

    let transport = MemoryTransport::new();
    app.system
        .authenticator
        .login(&transport, "leo@example.com", "secret123", true, None)
        .await
        .unwrap();

    let (token, expires_at) = transport.remember_cookie().unwrap();
    assert!(token.starts_with(&format!("{}-", user.id)));
    assert_eq!(
        expires_at,
        app.clock_now() + Duration::days(app.config.session.remember_ttl_days)
    );
}

#[tokio::test]
async fn test_failed_login_drops_carried_token() {
    let app = helpers::TestApp::new();
    app.register("mia@example.com", "secret123").await;

    let transport = MemoryTransport::with_remember_token("1-abcdefghijklmnop", app.clock_now());
    app.system
        .authenticator
        .login(&transport, "mia@example.com", "wrong1", false, None)
        .await
        .unwrap_err();

    assert!(transport.remember_token().is_none());
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = helpers::TestApp::new();
    app.register("nina@example.com", "secret123").await;

    let transport = MemoryTransport::new();
    app.system
        .authenticator
        .login(&transport, "nina@example.com", "secret123", true, None)
        .await
        .unwrap();
    app.system.authenticator.logout(&transport);

    assert!(transport.current().is_none());
    assert!(transport.remember_token().is_none());
    let session = app.system.authenticator.is_logged_in(&transport).await.unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn test_store_failure_is_not_invalid_credentials() {
    let app = helpers::TestApp::new();
    app.register("oscar@example.com", "secret123").await;
    app.store.set_unavailable(true);

    let err = app.login("oscar@example.com", "secret123").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Database);
    assert!(err.is_store_error());
}
