//! Permission resolution over direct grants and group grants.
//!
//! Resolution order for a principal:
//! 1. Direct user grant.
//! 2. Admin group membership (holds everything).
//! 3. Public group grant (applies to anonymous callers too).
//! 4. Any group the principal belongs to.
//!
//! A "no" is `Ok(false)`. Only unknown names and store failures are errors.

use std::sync::Arc;

use tracing::debug;

use warden_core::config::AuthConfig;
use warden_core::error::AppError;
use warden_core::types::{GroupId, PermissionId, UserId};
use warden_database::store::AccessStore;
use warden_entity::group::GroupRef;
use warden_entity::permission::PermissionRef;

/// Answers "may this principal do that".
pub struct PermissionResolver {
    access: Arc<dyn AccessStore>,
    admin_group: String,
    public_group: String,
}

impl std::fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("admin_group", &self.admin_group)
            .field("public_group", &self.public_group)
            .finish()
    }
}

impl PermissionResolver {
    /// Creates a resolver using the configured admin and public groups.
    pub fn new(access: Arc<dyn AccessStore>, config: &AuthConfig) -> Self {
        Self {
            access,
            admin_group: config.admin_group.clone(),
            public_group: config.public_group.clone(),
        }
    }

    /// Whether `principal` (or an anonymous caller, for `None`) holds
    /// `permission`, directly or through any group.
    pub async fn is_allowed(
        &self,
        permission: &PermissionRef,
        principal: Option<UserId>,
    ) -> Result<bool, AppError> {
        let permission_id = self.access.resolve_permission(permission).await?;

        if let Some(user) = principal {
            if self.access.user_has(user, permission_id).await? {
                debug!(user_id = %user, permission = %permission, "Allowed by user grant");
                return Ok(true);
            }
        }

        self.any_group_allows(permission_id, principal).await
    }

    /// Group form of the check.
    ///
    /// With `group` set, only that group's grants count. Without it, the
    /// admin override, the public group and then every group of `principal`
    /// are consulted.
    pub async fn is_group_allowed(
        &self,
        permission: &PermissionRef,
        group: Option<&GroupRef>,
        principal: Option<UserId>,
    ) -> Result<bool, AppError> {
        let permission_id = self.access.resolve_permission(permission).await?;

        match group {
            Some(group) => {
                let group_id = self.access.resolve_group(group).await?;
                self.access.group_has(group_id, permission_id).await
            }
            None => self.any_group_allows(permission_id, principal).await,
        }
    }

    /// Whether `user` belongs to the admin group. A missing admin group
    /// means nobody is an admin.
    pub async fn is_admin(&self, user: UserId) -> Result<bool, AppError> {
        match self.named_group(&self.admin_group).await? {
            Some(admin) => self.access.is_member(user, admin).await,
            None => Ok(false),
        }
    }

    async fn any_group_allows(
        &self,
        permission: PermissionId,
        principal: Option<UserId>,
    ) -> Result<bool, AppError> {
        if let Some(user) = principal {
            if self.is_admin(user).await? {
                debug!(user_id = %user, "Allowed by admin group");
                return Ok(true);
            }
        }

        if let Some(public) = self.named_group(&self.public_group).await? {
            if self.access.group_has(public, permission).await? {
                return Ok(true);
            }
        }

        let Some(user) = principal else {
            return Ok(false);
        };

        for group in self.access.groups_of(user).await? {
            if self.access.group_has(group, permission).await? {
                debug!(user_id = %user, group_id = %group, "Allowed by group grant");
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn named_group(&self, name: &str) -> Result<Option<GroupId>, AppError> {
        Ok(self.access.find_group_by_name(name).await?.map(|g| g.id))
    }
}
