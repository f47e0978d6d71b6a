//! Membership and grant edges.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use warden_core::types::{GroupId, PermissionId, UserId};

/// A user belongs to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct Membership {
    /// The member.
    pub user_id: UserId,
    /// The group.
    pub group_id: GroupId,
}

/// A permission granted directly to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct UserPermissionGrant {
    /// The grantee.
    pub user_id: UserId,
    /// The granted permission.
    pub permission_id: PermissionId,
}

/// A permission granted to every member of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct GroupPermissionGrant {
    /// The grantee group.
    pub group_id: GroupId,
    /// The granted permission.
    pub permission_id: PermissionId,
}
