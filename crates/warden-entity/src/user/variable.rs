//! Per-user key/value variables.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use warden_core::types::UserId;

/// One free-form value stored against a user. Keys are unique per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserVariable {
    /// Owner of the variable.
    pub user_id: UserId,
    /// Variable name.
    pub key: String,
    /// Stored value.
    pub value: String,
}
