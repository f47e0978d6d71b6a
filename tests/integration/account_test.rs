//! Integration tests for registration and account administration.

mod helpers;

use warden_auth::PasswordHasher;
use warden_core::ErrorKind;
use warden_core::config::AppConfig;
use warden_database::store::{AccessStore, UserStore};
use warden_entity::group::GroupRef;
use warden_entity::user::AccountStatus;

use helpers::MessageKind;

fn verifying_app() -> helpers::TestApp {
    let mut config = AppConfig::default();
    config.auth.verification = true;
    helpers::TestApp::with_config(config)
}

#[tokio::test]
async fn test_registration_hashes_with_assigned_id() {
    let app = helpers::TestApp::new();
    let user = app.register("alice@example.com", "secret123").await;

    let hasher = PasswordHasher::new();
    assert!(hasher.verify_password("secret123", user.id, &user.password_hash));
    assert_eq!(user.password_hash, hasher.hash_password("secret123", user.id));
    assert_eq!(user.status(), AccountStatus::Active);
}

#[tokio::test]
async fn test_registration_joins_default_group() {
    let app = helpers::TestApp::new();
    let user = app.register("bob@example.com", "secret123").await;

    let default = app.store.resolve_group(&GroupRef::from("default")).await.unwrap();
    assert!(app.store.is_member(user.id, default).await.unwrap());
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = helpers::TestApp::new();
    app.register("carol@example.com", "secret123").await;

    let err = app
        .system
        .accounts
        .register("CAROL@example.com", "other123", "")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_registration_rejects_bad_input() {
    let app = helpers::TestApp::new();
    let accounts = &app.system.accounts;

    let cases = [
        ("not-an-email", "secret123", ""),
        ("dave@example.com", "has space1", ""),
        ("dave@example.com", "waytoolongpassword", ""),
        ("dave@example.com", "secret123", "Dave!"),
    ];
    for (email, password, name) in cases {
        let err = accounts.register(email, password, name).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation, "{email} / {password} / {name}");
    }

    let user = accounts.register("dave@example.com", "secret123", "Dave O'Neil").await.unwrap();
    assert_eq!(user.name, "Dave O'Neil");
}

#[tokio::test]
async fn test_failed_notification_still_stores_real_digest() {
    let app = verifying_app();
    app.notifier.set_failing(true);

    let err = app
        .system
        .accounts
        .register("olivia@example.com", "secret123", "")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Internal);

    let stored = app
        .store
        .find_by_email("olivia@example.com")
        .await
        .unwrap()
        .unwrap();
    let hasher = PasswordHasher::new();
    assert_eq!(stored.password_hash, hasher.hash_password("secret123", stored.id));

    app.notifier.set_failing(false);
    app.system.accounts.send_verification(stored.id).await.unwrap();
    let code = app.notifier.last_code(stored.id).unwrap();
    app.system.accounts.verify(stored.id, &code).await.unwrap();
    assert!(app.login("olivia@example.com", "secret123").await.is_ok());
}

#[tokio::test]
async fn test_verification_flow() {
    let app = verifying_app();
    let user = app.register("erin@example.com", "secret123").await;
    assert_eq!(user.status(), AccountStatus::PendingVerification);
    assert_eq!(app.notifier.count(), 1);

    let code = app.notifier.last_code(user.id).unwrap();
    let err = app.system.accounts.verify(user.id, "wrong").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let err = app.system.accounts.verify(user.id, "").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    app.system.accounts.verify(user.id, &code).await.unwrap();
    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), AccountStatus::Active);
    assert!(stored.verification_code.is_none());

    assert!(app.login("erin@example.com", "secret123").await.is_ok());
}

#[tokio::test]
async fn test_resent_code_replaces_previous() {
    let app = verifying_app();
    let user = app.register("frank@example.com", "secret123").await;
    let first = app.notifier.last_code(user.id).unwrap();

    app.system.accounts.send_verification(user.id).await.unwrap();
    let second = app.notifier.last_code(user.id).unwrap();
    assert_eq!(app.notifier.count(), 2);

    if first != second {
        let err = app.system.accounts.verify(user.id, &first).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
    app.system.accounts.verify(user.id, &second).await.unwrap();
}

#[tokio::test]
async fn test_password_change_invalidates_old_digest() {
    let app = helpers::TestApp::new();
    let user = app.register("grace@example.com", "secret123").await;
    let old_hash = user.password_hash.clone();

    app.system
        .accounts
        .change_password(user.id, "newpass99")
        .await
        .unwrap();

    let hasher = PasswordHasher::new();
    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_ne!(stored.password_hash, old_hash);
    assert!(!hasher.verify_password("secret123", user.id, &stored.password_hash));

    let err = app.login("grace@example.com", "secret123").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    assert!(app.login("grace@example.com", "newpass99").await.is_ok());
}

#[tokio::test]
async fn test_ban_and_unban() {
    let app = helpers::TestApp::new();
    let user = app.register("heidi@example.com", "secret123").await;
    let accounts = &app.system.accounts;

    accounts.ban(user.id).await.unwrap();
    assert!(accounts.is_banned(user.id).await.unwrap());
    accounts.unban(user.id).await.unwrap();
    assert!(!accounts.is_banned(user.id).await.unwrap());
    assert!(app.login("heidi@example.com", "secret123").await.is_ok());
}

#[tokio::test]
async fn test_reset_login_attempts_lifts_lockout() {
    let app = helpers::TestApp::new();
    let user = app.register("ivan@example.com", "secret123").await;

    for _ in 0..app.config.throttle.max_attempts {
        app.login("ivan@example.com", "wrong1").await.unwrap_err();
    }
    let err = app.login("ivan@example.com", "secret123").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AttemptsExceeded);

    app.system.accounts.reset_login_attempts(user.id).await.unwrap();
    assert!(app.login("ivan@example.com", "secret123").await.is_ok());
}

#[tokio::test]
async fn test_delete_removes_account_and_memberships() {
    let app = helpers::TestApp::new();
    let user = app.register("judy@example.com", "secret123").await;
    app.system.accounts.delete(user.id).await.unwrap();

    assert!(app.store.find_by_id(user.id).await.unwrap().is_none());
    assert!(app.store.groups_of(user.id).await.unwrap().is_empty());
    let err = app.system.accounts.is_banned(user.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    app.register("judy@example.com", "secret123").await;
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = helpers::TestApp::new();
    let user = app.register("kim@example.com", "secret123").await;
    let accounts = &app.system.accounts;

    accounts.remind_password("kim@example.com").await.unwrap();
    let code = app.notifier.last(user.id, MessageKind::PasswordReset).unwrap();
    assert_eq!(code.len(), 16);

    let err = accounts.reset_password(user.id, "wrong").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let err = accounts.reset_password(user.id, "").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    accounts.reset_password(user.id, &code).await.unwrap();
    let password = app.notifier.last(user.id, MessageKind::NewPassword).unwrap();
    assert_eq!(password.len(), 8);
    assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.verification_code.is_none());
    let err = accounts.reset_password(user.id, &code).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = app.login("kim@example.com", "secret123").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    assert!(app.login("kim@example.com", &password).await.is_ok());
}

#[tokio::test]
async fn test_remind_password_is_silent_for_unknown_and_banned() {
    let app = verifying_app();
    let accounts = &app.system.accounts;
    accounts.remind_password("nobody@example.com").await.unwrap();
    assert_eq!(app.notifier.count(), 0);

    let user = app.register("liam@example.com", "secret123").await;
    let code = app.notifier.last_code(user.id).unwrap();
    accounts.remind_password("liam@example.com").await.unwrap();
    assert_eq!(app.notifier.count(), 1);

    let err = accounts.reset_password(user.id, &code).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotVerified);
    accounts.verify(user.id, &code).await.unwrap();
}

#[tokio::test]
async fn test_list_users_by_group() {
    let app = helpers::TestApp::new();
    let alice = app.register("alice@example.com", "secret123").await;
    let bob = app.register("bob@example.com", "secret123").await;
    let editors = app.group("editors").await;
    app.store.add_member(bob.id, editors).await.unwrap();
    let accounts = &app.system.accounts;

    let all = accounts.list_users(None, true).await.unwrap();
    assert_eq!(all.iter().map(|u| u.id).collect::<Vec<_>>(), vec![alice.id, bob.id]);

    let members = accounts
        .list_users(Some(&GroupRef::from("editors")), true)
        .await
        .unwrap();
    assert_eq!(members.iter().map(|u| u.id).collect::<Vec<_>>(), vec![bob.id]);

    accounts.ban(bob.id).await.unwrap();
    let active = accounts
        .list_users(Some(&GroupRef::Id(editors)), false)
        .await
        .unwrap();
    assert!(active.is_empty());

    let err = accounts
        .list_users(Some(&GroupRef::from("missing")), true)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let names: Vec<String> = accounts
        .user_groups(bob.id)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.name)
        .collect();
    assert_eq!(names, vec!["default".to_string(), "editors".to_string()]);
}

#[tokio::test]
async fn test_user_variables() {
    let app = helpers::TestApp::new();
    let user = app.register("mia@example.com", "secret123").await;
    let accounts = &app.system.accounts;

    accounts.set_user_var(user.id, "theme", "dark").await.unwrap();
    accounts.set_user_var(user.id, "theme", "light").await.unwrap();
    accounts.set_user_var(user.id, "lang", "de").await.unwrap();
    assert_eq!(
        accounts.get_user_var(user.id, "theme").await.unwrap().as_deref(),
        Some("light")
    );
    assert_eq!(accounts.user_vars(user.id).await.unwrap().len(), 2);

    accounts.unset_user_var(user.id, "theme").await.unwrap();
    assert!(accounts.get_user_var(user.id, "theme").await.unwrap().is_none());

    let err = accounts.set_user_var(user.id, " ", "x").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let missing = warden_core::types::UserId(999);
    let err = accounts.set_user_var(missing, "k", "v").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = accounts.get_user_var(missing, "k").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
