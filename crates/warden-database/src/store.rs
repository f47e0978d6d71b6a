//! Store traits consumed by the authentication engine.
//!
//! Every method is a single round trip. Failures of the backing store come
//! back as `ErrorKind::Database` and are never retried here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warden_core::result::AppResult;
use warden_core::types::{GroupId, PermissionId, UserId};
use warden_core::AppError;
use warden_entity::group::{Group, GroupRef};
use warden_entity::permission::{Permission, PermissionRef};
use warden_entity::session::RememberCredential;
use warden_entity::user::{CreateUser, LoginAttemptState, User, UserVariable};

/// User rows.
///
/// `touch_activity`, `record_login`, `update_login_attempts` and
/// `set_remember` silently ignore missing rows. The other mutators fail
/// with `NotFound`.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find a user whose stored remember secret equals `secret`.
    async fn find_by_remember_token(&self, id: UserId, secret: &str) -> AppResult<Option<User>>;

    /// Insert a new user. Fails with `Conflict` when the email is taken.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Replace the password digest.
    async fn update_password(&self, id: UserId, password_hash: &str) -> AppResult<()>;

    /// Persist the login throttle state.
    async fn update_login_attempts(&self, id: UserId, state: &LoginAttemptState)
    -> AppResult<()>;

    /// Record a successful login.
    async fn record_login(&self, id: UserId, at: DateTime<Utc>, ip: Option<&str>)
    -> AppResult<()>;

    /// Refresh the last-activity timestamp.
    async fn touch_activity(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()>;

    /// Replace (or clear, with `None`) the remember credential.
    async fn set_remember(&self, id: UserId, credential: Option<&RememberCredential>)
    -> AppResult<()>;

    /// Set the ban flag.
    async fn set_banned(&self, id: UserId, banned: bool) -> AppResult<()>;

    /// Replace (or clear) the verification code.
    async fn set_verification_code(&self, id: UserId, code: Option<&str>) -> AppResult<()>;

    /// List users ordered by id.
    async fn list(&self, include_banned: bool) -> AppResult<Vec<User>>;

    /// List the members of a group ordered by id.
    async fn list_members(&self, group: GroupId, include_banned: bool) -> AppResult<Vec<User>>;

    /// Insert or overwrite a user variable. Fails with `NotFound` when the
    /// user does not exist.
    async fn set_variable(&self, id: UserId, key: &str, value: &str) -> AppResult<()>;

    /// Remove a user variable. Idempotent.
    async fn unset_variable(&self, id: UserId, key: &str) -> AppResult<()>;

    /// Read a user variable.
    async fn get_variable(&self, id: UserId, key: &str) -> AppResult<Option<String>>;

    /// Every variable of a user, ordered by key.
    async fn list_variables(&self, id: UserId) -> AppResult<Vec<UserVariable>>;

    /// Delete a user together with its memberships and grants.
    async fn delete(&self, id: UserId) -> AppResult<()>;
}

/// Groups, permissions, memberships and grants.
#[async_trait]
pub trait AccessStore: Send + Sync + 'static {
    /// Create a group. Fails with `Conflict` when the name is taken.
    async fn create_group(&self, name: &str, definition: Option<&str>) -> AppResult<Group>;

    /// Find a group by id.
    async fn find_group(&self, id: GroupId) -> AppResult<Option<Group>>;

    /// Find a group by its unique name.
    async fn find_group_by_name(&self, name: &str) -> AppResult<Option<Group>>;

    /// List all groups ordered by id.
    async fn list_groups(&self) -> AppResult<Vec<Group>>;

    /// Rename a group and/or replace its definition; `None` leaves a field
    /// as it is. Fails with `NotFound` or, on a name clash, `Conflict`.
    async fn update_group(
        &self,
        id: GroupId,
        name: Option<&str>,
        definition: Option<&str>,
    ) -> AppResult<Group>;

    /// Delete a group together with its memberships and grants.
    async fn delete_group(&self, id: GroupId) -> AppResult<()>;

    /// Create a permission. Fails with `Conflict` when the name is taken.
    async fn create_permission(&self, name: &str, definition: Option<&str>)
    -> AppResult<Permission>;

    /// Find a permission by id.
    async fn find_permission(&self, id: PermissionId) -> AppResult<Option<Permission>>;

    /// Find a permission by its unique name.
    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>>;

    /// List all permissions ordered by id.
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Rename a permission and/or replace its definition; `None` leaves a
    /// field as it is. Fails with `NotFound` or, on a name clash, `Conflict`.
    async fn update_permission(
        &self,
        id: PermissionId,
        name: Option<&str>,
        definition: Option<&str>,
    ) -> AppResult<Permission>;

    /// Delete a permission together with every grant of it.
    async fn delete_permission(&self, id: PermissionId) -> AppResult<()>;

    /// Add a user to a group. Idempotent.
    async fn add_member(&self, user: UserId, group: GroupId) -> AppResult<()>;

    /// Remove a user from a group. Idempotent.
    async fn remove_member(&self, user: UserId, group: GroupId) -> AppResult<()>;

    /// Whether the user belongs to the group.
    async fn is_member(&self, user: UserId, group: GroupId) -> AppResult<bool>;

    /// Every group the user belongs to.
    async fn groups_of(&self, user: UserId) -> AppResult<Vec<GroupId>>;

    /// Every group the user belongs to, as full rows ordered by id.
    async fn user_groups(&self, user: UserId) -> AppResult<Vec<Group>>;

    /// Grant a permission directly to a user. Idempotent.
    async fn grant_user(&self, user: UserId, permission: PermissionId) -> AppResult<()>;

    /// Revoke a direct user grant. Idempotent.
    async fn revoke_user(&self, user: UserId, permission: PermissionId) -> AppResult<()>;

    /// Whether the user holds a direct grant.
    async fn user_has(&self, user: UserId, permission: PermissionId) -> AppResult<bool>;

    /// Grant a permission to a group. Idempotent.
    async fn grant_group(&self, group: GroupId, permission: PermissionId) -> AppResult<()>;

    /// Revoke a group grant. Idempotent.
    async fn revoke_group(&self, group: GroupId, permission: PermissionId) -> AppResult<()>;

    /// Whether the group holds the permission.
    async fn group_has(&self, group: GroupId, permission: PermissionId) -> AppResult<bool>;

    /// Turn a name-or-id reference into an id. Unknown names are `NotFound`.
    async fn resolve_group(&self, group: &GroupRef) -> AppResult<GroupId> {
        match group {
            GroupRef::Id(id) => Ok(*id),
            GroupRef::Name(name) => self
                .find_group_by_name(name)
                .await?
                .map(|g| g.id)
                .ok_or_else(|| AppError::not_found(format!("Group '{name}' not found"))),
        }
    }

    /// Turn a name-or-id reference into an id. Unknown names are `NotFound`.
    async fn resolve_permission(&self, permission: &PermissionRef) -> AppResult<PermissionId> {
        match permission {
            PermissionRef::Id(id) => Ok(*id),
            PermissionRef::Name(name) => self
                .find_permission_by_name(name)
                .await?
                .map(|p| p.id)
                .ok_or_else(|| AppError::not_found(format!("Permission '{name}' not found"))),
        }
    }
}
