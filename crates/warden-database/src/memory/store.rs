//! In-memory implementation of both store traits.
//!
//! Used by the test suite and by embedders that do not want a database.
//! Mirrors the PostgreSQL schema: case-insensitive unique emails, unique
//! group and permission names, and cascading deletes of edges.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use tracing::debug;

use warden_core::result::AppResult;
use warden_core::types::{GroupId, PermissionId, UserId};
use warden_core::AppError;
use warden_entity::group::Group;
use warden_entity::permission::{GroupPermissionGrant, Membership, Permission, UserPermissionGrant};
use warden_entity::session::RememberCredential;
use warden_entity::user::{CreateUser, LoginAttemptState, User, UserVariable};

use crate::store::{AccessStore, UserStore};

/// In-memory [`UserStore`] and [`AccessStore`].
#[derive(Debug)]
pub struct MemoryStore {
    users: DashMap<UserId, User>,
    emails: DashMap<String, UserId>,
    groups: DashMap<GroupId, Group>,
    group_names: DashMap<String, GroupId>,
    permissions: DashMap<PermissionId, Permission>,
    permission_names: DashMap<String, PermissionId>,
    memberships: DashSet<Membership>,
    variables: DashMap<(UserId, String), String>,
    user_grants: DashSet<UserPermissionGrant>,
    group_grants: DashSet<GroupPermissionGrant>,
    next_user_id: AtomicI64,
    next_group_id: AtomicI64,
    next_permission_id: AtomicI64,
    unavailable: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            groups: DashMap::new(),
            group_names: DashMap::new(),
            permissions: DashMap::new(),
            permission_names: DashMap::new(),
            memberships: DashSet::new(),
            variables: DashMap::new(),
            user_grants: DashSet::new(),
            group_grants: DashSet::new(),
            next_user_id: AtomicI64::new(1),
            next_group_id: AtomicI64::new(1),
            next_permission_id: AtomicI64::new(1),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Create a store seeded with the given groups, like the initial migration.
    pub fn with_groups(names: &[&str]) -> Self {
        let store = Self::new();
        for name in names {
            let id = GroupId(store.next_group_id.fetch_add(1, Ordering::SeqCst));
            store.group_names.insert((*name).to_string(), id);
            store.groups.insert(
                id,
                Group {
                    id,
                    name: (*name).to_string(),
                    definition: None,
                },
            );
        }
        store
    }

    /// Make every subsequent call fail with a store error (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::database("Memory store is unavailable"));
        }
        Ok(())
    }

    fn update_user<F>(&self, id: UserId, f: F) -> AppResult<bool>
    where
        F: FnOnce(&mut User),
    {
        self.available()?;
        match self.users.get_mut(&id) {
            Some(mut user) => {
                f(user.value_mut());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn require_user<F>(&self, id: UserId, f: F) -> AppResult<()>
    where
        F: FnOnce(&mut User),
    {
        if self.update_user(id, f)? {
            Ok(())
        } else {
            Err(AppError::not_found(format!("User {id} not found")))
        }
    }

    /// Move `id` from `old` to `new` in a unique-name index.
    fn rename<K: Copy>(
        index: &DashMap<String, K>,
        id: K,
        old: &str,
        new: &str,
        what: &str,
    ) -> AppResult<()> {
        if old == new {
            return Ok(());
        }
        match index.entry(new.to_string()) {
            Entry::Occupied(_) => {
                return Err(AppError::conflict(format!("{what} '{new}' already exists")));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        index.remove(old);
        Ok(())
    }

    fn require_refs(
        &self,
        user: Option<UserId>,
        group: Option<GroupId>,
        permission: Option<PermissionId>,
    ) -> AppResult<()> {
        if user.is_some_and(|id| !self.users.contains_key(&id)) {
            return Err(AppError::not_found("Referenced user does not exist"));
        }
        if group.is_some_and(|id| !self.groups.contains_key(&id)) {
            return Err(AppError::not_found("Referenced group does not exist"));
        }
        if permission.is_some_and(|id| !self.permissions.contains_key(&id)) {
            return Err(AppError::not_found("Referenced permission does not exist"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        self.available()?;
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.available()?;
        let Some(id) = self.emails.get(&email.to_lowercase()).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_remember_token(&self, id: UserId, secret: &str) -> AppResult<Option<User>> {
        self.available()?;
        Ok(self
            .users
            .get(&id)
            .filter(|u| u.remember_token.as_deref() == Some(secret))
            .map(|u| u.value().clone()))
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        self.available()?;
        match self.emails.entry(data.email.to_lowercase()) {
            Entry::Occupied(_) => Err(AppError::conflict("Email already in use")),
            Entry::Vacant(slot) => {
                let id = UserId(self.next_user_id.fetch_add(1, Ordering::SeqCst));
                let user = User {
                    id,
                    email: data.email.clone(),
                    password_hash: data.password_hash.clone(),
                    name: data.name.clone(),
                    banned: false,
                    verification_code: None,
                    last_login: None,
                    last_activity: None,
                    ip_address: None,
                    failed_login_attempts: 0,
                    last_login_attempt: None,
                    locked_until: None,
                    remember_token: None,
                    remember_expires_at: None,
                    created_at: Utc::now(),
                };
                self.users.insert(id, user.clone());
                slot.insert(id);
                debug!(user_id = %id, "Created user in memory store");
                Ok(user)
            }
        }
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> AppResult<()> {
        self.require_user(id, |u| u.password_hash = password_hash.to_string())
    }

    async fn update_login_attempts(
        &self,
        id: UserId,
        state: &LoginAttemptState,
    ) -> AppResult<()> {
        self.update_user(id, |u| {
            u.failed_login_attempts = i32::try_from(state.failure_count).unwrap_or(i32::MAX);
            u.last_login_attempt = state.last_attempt;
            u.locked_until = state.locked_until;
        })
        .map(|_| ())
    }

    async fn record_login(
        &self,
        id: UserId,
        at: DateTime<Utc>,
        ip: Option<&str>,
    ) -> AppResult<()> {
        self.update_user(id, |u| {
            u.last_login = Some(at);
            u.ip_address = ip.map(str::to_string);
        })
        .map(|_| ())
    }

    async fn touch_activity(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        self.update_user(id, |u| u.last_activity = Some(at)).map(|_| ())
    }

    async fn set_remember(
        &self,
        id: UserId,
        credential: Option<&RememberCredential>,
    ) -> AppResult<()> {
        self.update_user(id, |u| {
            u.remember_token = credential.map(|c| c.secret.clone());
            u.remember_expires_at = credential.map(|c| c.expires_at);
        })
        .map(|_| ())
    }

    async fn set_banned(&self, id: UserId, banned: bool) -> AppResult<()> {
        self.require_user(id, |u| u.banned = banned)
    }

    async fn set_verification_code(&self, id: UserId, code: Option<&str>) -> AppResult<()> {
        self.require_user(id, |u| u.verification_code = code.map(str::to_string))
    }

    async fn list(&self, include_banned: bool) -> AppResult<Vec<User>> {
        self.available()?;
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|u| include_banned || !u.banned)
            .map(|u| u.value().clone())
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn list_members(&self, group: GroupId, include_banned: bool) -> AppResult<Vec<User>> {
        self.available()?;
        let mut users: Vec<User> = self
            .memberships
            .iter()
            .filter(|m| m.group_id == group)
            .filter_map(|m| self.users.get(&m.user_id).map(|u| u.value().clone()))
            .filter(|u| include_banned || !u.banned)
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn set_variable(&self, id: UserId, key: &str, value: &str) -> AppResult<()> {
        self.available()?;
        self.require_refs(Some(id), None, None)?;
        self.variables.insert((id, key.to_string()), value.to_string());
        Ok(())
    }

    async fn unset_variable(&self, id: UserId, key: &str) -> AppResult<()> {
        self.available()?;
        self.variables.remove(&(id, key.to_string()));
        Ok(())
    }

    async fn get_variable(&self, id: UserId, key: &str) -> AppResult<Option<String>> {
        self.available()?;
        Ok(self
            .variables
            .get(&(id, key.to_string()))
            .map(|v| v.value().clone()))
    }

    async fn list_variables(&self, id: UserId) -> AppResult<Vec<UserVariable>> {
        self.available()?;
        let mut variables: Vec<UserVariable> = self
            .variables
            .iter()
            .filter(|e| e.key().0 == id)
            .map(|e| UserVariable {
                user_id: id,
                key: e.key().1.clone(),
                value: e.value().clone(),
            })
            .collect();
        variables.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(variables)
    }

    async fn delete(&self, id: UserId) -> AppResult<()> {
        self.available()?;
        let (_, user) = self
            .users
            .remove(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        self.emails.remove(&user.email.to_lowercase());
        self.memberships.retain(|m| m.user_id != id);
        self.user_grants.retain(|g| g.user_id != id);
        self.variables.retain(|(user_id, _), _| *user_id != id);
        Ok(())
    }
}

#[async_trait]
impl AccessStore for MemoryStore {
    async fn create_group(&self, name: &str, definition: Option<&str>) -> AppResult<Group> {
        self.available()?;
        match self.group_names.entry(name.to_string()) {
            Entry::Occupied(_) => Err(AppError::conflict(format!("Group '{name}' already exists"))),
            Entry::Vacant(slot) => {
                let id = GroupId(self.next_group_id.fetch_add(1, Ordering::SeqCst));
                let group = Group {
                    id,
                    name: name.to_string(),
                    definition: definition.map(str::to_string),
                };
                self.groups.insert(id, group.clone());
                slot.insert(id);
                Ok(group)
            }
        }
    }

    async fn find_group(&self, id: GroupId) -> AppResult<Option<Group>> {
        self.available()?;
        Ok(self.groups.get(&id).map(|g| g.value().clone()))
    }

    async fn find_group_by_name(&self, name: &str) -> AppResult<Option<Group>> {
        self.available()?;
        let Some(id) = self.group_names.get(name).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.groups.get(&id).map(|g| g.value().clone()))
    }

    async fn list_groups(&self) -> AppResult<Vec<Group>> {
        self.available()?;
        let mut groups: Vec<Group> = self.groups.iter().map(|g| g.value().clone()).collect();
        groups.sort_by_key(|g| g.id);
        Ok(groups)
    }

    async fn update_group(
        &self,
        id: GroupId,
        name: Option<&str>,
        definition: Option<&str>,
    ) -> AppResult<Group> {
        self.available()?;
        let mut group = self
            .groups
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Group {id} not found")))?;
        if let Some(name) = name {
            Self::rename(&self.group_names, id, &group.name, name, "Group")?;
            group.name = name.to_string();
        }
        if let Some(definition) = definition {
            group.definition = Some(definition.to_string());
        }
        Ok(group.value().clone())
    }

    async fn delete_group(&self, id: GroupId) -> AppResult<()> {
        self.available()?;
        let (_, group) = self
            .groups
            .remove(&id)
            .ok_or_else(|| AppError::not_found(format!("Group {id} not found")))?;
        self.group_names.remove(&group.name);
        self.memberships.retain(|m| m.group_id != id);
        self.group_grants.retain(|g| g.group_id != id);
        Ok(())
    }

    async fn create_permission(
        &self,
        name: &str,
        definition: Option<&str>,
    ) -> AppResult<Permission> {
        self.available()?;
        match self.permission_names.entry(name.to_string()) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Permission '{name}' already exists"
            ))),
            Entry::Vacant(slot) => {
                let id = PermissionId(self.next_permission_id.fetch_add(1, Ordering::SeqCst));
                let permission = Permission {
                    id,
                    name: name.to_string(),
                    definition: definition.map(str::to_string),
                };
                self.permissions.insert(id, permission.clone());
                slot.insert(id);
                Ok(permission)
            }
        }
    }

    async fn find_permission(&self, id: PermissionId) -> AppResult<Option<Permission>> {
        self.available()?;
        Ok(self.permissions.get(&id).map(|p| p.value().clone()))
    }

    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        self.available()?;
        let Some(id) = self.permission_names.get(name).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.permissions.get(&id).map(|p| p.value().clone()))
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        self.available()?;
        let mut permissions: Vec<Permission> =
            self.permissions.iter().map(|p| p.value().clone()).collect();
        permissions.sort_by_key(|p| p.id);
        Ok(permissions)
    }

    async fn update_permission(
        &self,
        id: PermissionId,
        name: Option<&str>,
        definition: Option<&str>,
    ) -> AppResult<Permission> {
        self.available()?;
        let mut permission = self
            .permissions
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Permission {id} not found")))?;
        if let Some(name) = name {
            Self::rename(&self.permission_names, id, &permission.name, name, "Permission")?;
            permission.name = name.to_string();
        }
        if let Some(definition) = definition {
            permission.definition = Some(definition.to_string());
        }
        Ok(permission.value().clone())
    }

    async fn delete_permission(&self, id: PermissionId) -> AppResult<()> {
        self.available()?;
        let (_, permission) = self
            .permissions
            .remove(&id)
            .ok_or_else(|| AppError::not_found(format!("Permission {id} not found")))?;
        self.permission_names.remove(&permission.name);
        self.user_grants.retain(|g| g.permission_id != id);
        self.group_grants.retain(|g| g.permission_id != id);
        Ok(())
    }

    async fn add_member(&self, user: UserId, group: GroupId) -> AppResult<()> {
        self.available()?;
        self.require_refs(Some(user), Some(group), None)?;
        self.memberships.insert(Membership {
            user_id: user,
            group_id: group,
        });
        Ok(())
    }

    async fn remove_member(&self, user: UserId, group: GroupId) -> AppResult<()> {
        self.available()?;
        self.memberships.remove(&Membership {
            user_id: user,
            group_id: group,
        });
        Ok(())
    }

    async fn is_member(&self, user: UserId, group: GroupId) -> AppResult<bool> {
        self.available()?;
        Ok(self.memberships.contains(&Membership {
            user_id: user,
            group_id: group,
        }))
    }

    async fn groups_of(&self, user: UserId) -> AppResult<Vec<GroupId>> {
        self.available()?;
        let mut groups: Vec<GroupId> = self
            .memberships
            .iter()
            .filter(|m| m.user_id == user)
            .map(|m| m.group_id)
            .collect();
        groups.sort();
        Ok(groups)
    }

    async fn user_groups(&self, user: UserId) -> AppResult<Vec<Group>> {
        self.available()?;
        let mut groups: Vec<Group> = self
            .memberships
            .iter()
            .filter(|m| m.user_id == user)
            .filter_map(|m| self.groups.get(&m.group_id).map(|g| g.value().clone()))
            .collect();
        groups.sort_by_key(|g| g.id);
        Ok(groups)
    }

    async fn grant_user(&self, user: UserId, permission: PermissionId) -> AppResult<()> {
        self.available()?;
        self.require_refs(Some(user), None, Some(permission))?;
        self.user_grants.insert(UserPermissionGrant {
            user_id: user,
            permission_id: permission,
        });
        Ok(())
    }

    async fn revoke_user(&self, user: UserId, permission: PermissionId) -> AppResult<()> {
        self.available()?;
        self.user_grants.remove(&UserPermissionGrant {
            user_id: user,
            permission_id: permission,
        });
        Ok(())
    }

    async fn user_has(&self, user: UserId, permission: PermissionId) -> AppResult<bool> {
        self.available()?;
        Ok(self.user_grants.contains(&UserPermissionGrant {
            user_id: user,
            permission_id: permission,
        }))
    }

    async fn grant_group(&self, group: GroupId, permission: PermissionId) -> AppResult<()> {
        self.available()?;
        self.require_refs(None, Some(group), Some(permission))?;
        self.group_grants.insert(GroupPermissionGrant {
            group_id: group,
            permission_id: permission,
        });
        Ok(())
    }

    async fn revoke_group(&self, group: GroupId, permission: PermissionId) -> AppResult<()> {
        self.available()?;
        self.group_grants.remove(&GroupPermissionGrant {
            group_id: group,
            permission_id: permission,
        });
        Ok(())
    }

    async fn group_has(&self, group: GroupId, permission: PermissionId) -> AppResult<bool> {
        self.available()?;
        Ok(self.group_grants.contains(&GroupPermissionGrant {
            group_id: group,
            permission_id: permission,
        }))
    }
}
