//! Integration tests for permission resolution and the access gate.

mod helpers;

use chrono::Duration;

use warden_auth::Decision;
use warden_core::ErrorKind;
use warden_database::store::{AccessStore, UserStore};
use warden_entity::group::GroupRef;
use warden_entity::permission::PermissionRef;
use warden_entity::user::CreateUser;

fn perm(name: &str) -> PermissionRef {
    PermissionRef::from(name)
}

#[tokio::test]
async fn test_group_grant_reaches_members_only() {
    let app = helpers::TestApp::new();
    let member = app.register("editor@example.com", "secret123").await;
    let outsider = app
        .store
        .create(&CreateUser {
            email: "outsider@example.com".to_string(),
            password_hash: String::new(),
            name: String::new(),
        })
        .await
        .unwrap();

    let editors = app.group("editors").await;
    let publish = app.permission("publish").await;
    app.store.grant_group(editors, publish).await.unwrap();
    app.store.add_member(member.id, editors).await.unwrap();

    let resolver = &app.system.resolver;
    assert!(resolver.is_allowed(&perm("publish"), Some(member.id)).await.unwrap());
    assert!(!resolver.is_allowed(&perm("publish"), Some(outsider.id)).await.unwrap());
    assert!(!resolver.is_allowed(&perm("publish"), None).await.unwrap());
}

#[tokio::test]
async fn test_direct_user_grant() {
    let app = helpers::TestApp::new();
    let user = app.register("alice@example.com", "secret123").await;
    let publish = app.permission("publish").await;
    app.store.grant_user(user.id, publish).await.unwrap();

    let resolver = &app.system.resolver;
    assert!(resolver.is_allowed(&PermissionRef::Id(publish), Some(user.id)).await.unwrap());

    app.store.revoke_user(user.id, publish).await.unwrap();
    assert!(!resolver.is_allowed(&PermissionRef::Id(publish), Some(user.id)).await.unwrap());
}

#[tokio::test]
async fn test_public_group_allows_everyone() {
    let app = helpers::TestApp::new();
    let user = app.register("bob@example.com", "secret123").await;
    let read = app.permission("read").await;
    let public = app.store.resolve_group(&GroupRef::from("public")).await.unwrap();
    app.store.grant_group(public, read).await.unwrap();

    let resolver = &app.system.resolver;
    assert!(resolver.is_allowed(&perm("read"), None).await.unwrap());
    assert!(resolver.is_allowed(&perm("read"), Some(user.id)).await.unwrap());
    assert!(resolver.is_group_allowed(&perm("read"), None, None).await.unwrap());
}

#[tokio::test]
async fn test_admin_is_always_allowed() {
    let app = helpers::TestApp::new();
    let admin = app.register("root@example.com", "secret123").await;
    let admin_group = app.store.resolve_group(&GroupRef::from("admin")).await.unwrap();
    app.store.add_member(admin.id, admin_group).await.unwrap();
    app.permission("delete_everything").await;

    let resolver = &app.system.resolver;
    assert!(resolver.is_admin(admin.id).await.unwrap());
    assert!(resolver.is_allowed(&perm("delete_everything"), Some(admin.id)).await.unwrap());
    assert!(
        resolver
            .is_group_allowed(&perm("delete_everything"), None, Some(admin.id))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_missing_admin_group_means_no_admins() {
    let app = helpers::TestApp::new();
    let user = app.register("carol@example.com", "secret123").await;
    let admin_group = app.store.resolve_group(&GroupRef::from("admin")).await.unwrap();
    app.store.add_member(user.id, admin_group).await.unwrap();
    app.store.delete_group(admin_group).await.unwrap();

    assert!(!app.system.resolver.is_admin(user.id).await.unwrap());
}

#[tokio::test]
async fn test_named_group_check_ignores_membership() {
    let app = helpers::TestApp::new();
    let user = app.register("dave@example.com", "secret123").await;
    let editors = app.group("editors").await;
    let reviewers = app.group("reviewers").await;
    let publish = app.permission("publish").await;
    app.store.grant_group(editors, publish).await.unwrap();
    app.store.add_member(user.id, reviewers).await.unwrap();

    let resolver = &app.system.resolver;
    let editors_ref = GroupRef::from("editors");
    let reviewers_ref = GroupRef::Id(reviewers);
    assert!(resolver.is_group_allowed(&perm("publish"), Some(&editors_ref), None).await.unwrap());
    assert!(
        !resolver
            .is_group_allowed(&perm("publish"), Some(&reviewers_ref), Some(user.id))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_unknown_names_are_not_found() {
    let app = helpers::TestApp::new();
    let resolver = &app.system.resolver;

    let err = resolver.is_allowed(&perm("missing"), None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    app.permission("publish").await;
    let err = resolver
        .is_group_allowed(&perm("publish"), Some(&GroupRef::from("missing")), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_deleting_permission_removes_grants() {
    let app = helpers::TestApp::new();
    let user = app.register("erin@example.com", "secret123").await;
    let publish = app.permission("publish").await;
    app.store.grant_user(user.id, publish).await.unwrap();
    app.store.delete_permission(publish).await.unwrap();

    let republished = app.permission("publish").await;
    assert!(!app.store.user_has(user.id, republished).await.unwrap());
}

#[tokio::test]
async fn test_gate_denies_with_configured_message() {
    let app = helpers::TestApp::new();
    app.permission("publish").await;

    let decision = app.system.gate.check(None, &perm("publish")).await.unwrap();
    assert_eq!(
        decision,
        Decision::Deny {
            message: app.config.auth.no_access_message.clone()
        }
    );
    assert!(!decision.is_allowed());

    let err = app.system.gate.require(None, &perm("publish")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_gate_allows_and_refreshes_activity() {
    let app = helpers::TestApp::new();
    let user = app.register("frank@example.com", "secret123").await;
    let session = app.login("frank@example.com", "secret123").await.unwrap();
    let publish = app.permission("publish").await;
    app.store.grant_user(user.id, publish).await.unwrap();

    app.advance(Duration::minutes(10));
    let decision = app.system.gate.check(Some(&session), &perm("publish")).await.unwrap();
    assert_eq!(decision, Decision::Allow);
    app.system.gate.require(Some(&session), &perm("publish")).await.unwrap();

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.last_activity, Some(app.clock_now()));
}

#[tokio::test]
async fn test_gate_denial_still_refreshes_activity() {
    let app = helpers::TestApp::new();
    let user = app.register("gina@example.com", "secret123").await;
    let session = app.login("gina@example.com", "secret123").await.unwrap();
    app.permission("publish").await;

    app.advance(Duration::minutes(25));
    let decision = app.system.gate.check(Some(&session), &perm("publish")).await.unwrap();
    assert!(!decision.is_allowed());

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.last_activity, Some(app.clock_now()));
}

#[tokio::test]
async fn test_renamed_permission_keeps_grants() {
    let app = helpers::TestApp::new();
    let user = app.register("hank@example.com", "secret123").await;
    let publish = app.permission("publish").await;
    app.store.grant_user(user.id, publish).await.unwrap();

    app.store
        .update_permission(publish, Some("post"), Some("Post articles"))
        .await
        .unwrap();
    assert!(app.system.resolver.is_allowed(&perm("post"), Some(user.id)).await.unwrap());
    let err = app
        .system
        .resolver
        .is_allowed(&perm("publish"), Some(user.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_store_failure_is_not_a_denial() {
    let app = helpers::TestApp::new();
    app.permission("publish").await;
    app.store.set_unavailable(true);

    let err = app.system.resolver.is_allowed(&perm("publish"), None).await.unwrap_err();
    assert!(err.is_store_error());
    let err = app.system.gate.check(None, &perm("publish")).await.unwrap_err();
    assert!(err.is_store_error());
}
