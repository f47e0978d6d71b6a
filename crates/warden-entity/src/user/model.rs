//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use warden_core::types::UserId;

use super::attempts::LoginAttemptState;
use super::status::AccountStatus;
use crate::session::RememberCredential;

/// A registered user account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier, assigned by the store.
    pub id: UserId,
    /// Login email. Unique, compared case-insensitively.
    pub email: String,
    /// Salted SHA-256 digest of the password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name.
    pub name: String,
    /// Whether the account is banned (administratively or pending verification).
    pub banned: bool,
    /// Outstanding email verification code.
    #[serde(skip_serializing)]
    pub verification_code: Option<String>,
    /// Last successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// Last time the user passed through the access gate.
    pub last_activity: Option<DateTime<Utc>>,
    /// Address of the last successful login.
    pub ip_address: Option<String>,
    /// Consecutive failed logins in the current throttle window.
    pub failed_login_attempts: i32,
    /// Time of the most recent failed login.
    pub last_login_attempt: Option<DateTime<Utc>>,
    /// Lockout deadline set by the login throttle.
    pub locked_until: Option<DateTime<Utc>>,
    /// Remember-me secret, stored as issued.
    #[serde(skip_serializing)]
    pub remember_token: Option<String>,
    /// Remember-me expiry.
    pub remember_expires_at: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the account is banned with a verification code outstanding.
    pub fn is_pending_verification(&self) -> bool {
        self.banned
            && self
                .verification_code
                .as_deref()
                .is_some_and(|code| !code.is_empty())
    }

    /// Derived account status.
    pub fn status(&self) -> AccountStatus {
        if self.is_pending_verification() {
            AccountStatus::PendingVerification
        } else if self.banned {
            AccountStatus::Banned
        } else {
            AccountStatus::Active
        }
    }

    /// The throttle state stored on this row.
    pub fn login_attempts(&self) -> LoginAttemptState {
        LoginAttemptState {
            failure_count: u32::try_from(self.failed_login_attempts).unwrap_or(0),
            last_attempt: self.last_login_attempt,
            locked_until: self.locked_until,
        }
    }

    /// The live remember credential, if one is set.
    pub fn remember_credential(&self) -> Option<RememberCredential> {
        match (&self.remember_token, self.remember_expires_at) {
            (Some(secret), Some(expires_at)) => Some(RememberCredential {
                secret: secret.clone(),
                expires_at,
            }),
            _ => None,
        }
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Login email.
    pub email: String,
    /// Initial password digest.
    pub password_hash: String,
    /// Display name.
    pub name: String,
}
