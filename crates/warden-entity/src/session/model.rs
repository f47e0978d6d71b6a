//! Session value object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_core::types::UserId;

use crate::user::User;

/// How a session came to be established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOrigin {
    /// Email and password login.
    Password,
    /// Resumed from a remember-me token.
    RememberToken,
}

/// An authenticated principal.
///
/// Sessions are plain values; where they live between requests is up to the
/// session transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The authenticated user.
    pub user_id: UserId,
    /// Email at the time of login.
    pub email: String,
    /// Display name at the time of login.
    pub name: String,
    /// How the session was established.
    pub origin: SessionOrigin,
    /// When the session was established.
    pub established_at: DateTime<Utc>,
}

impl Session {
    /// Build a session for `user`.
    pub fn for_user(user: &User, origin: SessionOrigin, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            origin,
            established_at: now,
        }
    }
}
