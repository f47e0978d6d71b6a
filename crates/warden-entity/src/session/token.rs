//! Remember-me token value types.
//!
//! The bearer form handed to clients is `"{user_id}-{secret}"`. The secret
//! half is stored on the user row next to its expiry; issuing a new one
//! overwrites the old.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::AppError;
use warden_core::types::UserId;

/// Length of a freshly issued secret.
pub const SECRET_LENGTH: usize = 16;

/// Shortest secret accepted when parsing a presented token.
pub const MIN_SECRET_LENGTH: usize = 13;

/// A parsed remember-me bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberToken {
    /// The user the token claims to belong to.
    pub user_id: UserId,
    /// The secret half.
    pub secret: String,
}

impl RememberToken {
    /// Parse `"{user_id}-{secret}"`.
    ///
    /// Everything after the first `-` is the secret. Issued secrets are
    /// alphanumeric, so a secret containing `-` never matches a stored one.
    ///
    /// Fails with `Malformed` when the id is not a decimal number or the
    /// secret is shorter than [`MIN_SECRET_LENGTH`].
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let (id, secret) = raw
            .split_once('-')
            .ok_or_else(|| AppError::malformed("Remember token has no separator"))?;

        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::malformed("Remember token id is not numeric"));
        }
        let user_id = id
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| AppError::malformed("Remember token id is out of range"))?;

        if secret.len() < MIN_SECRET_LENGTH {
            return Err(AppError::malformed("Remember token secret is too short"));
        }

        Ok(Self {
            user_id,
            secret: secret.to_string(),
        })
    }
}

impl fmt::Display for RememberToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.user_id, self.secret)
    }
}

/// The remember credential stored on a user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RememberCredential {
    /// The stored secret.
    pub secret: String,
    /// When the credential stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl RememberCredential {
    /// Whether the credential is past its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A freshly issued token together with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedRememberToken {
    /// The bearer token.
    pub token: RememberToken,
    /// When it expires.
    pub expires_at: DateTime<Utc>,
}
