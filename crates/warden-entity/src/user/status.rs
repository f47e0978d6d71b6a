//! Account status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account status derived from the ban flag and verification code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account can log in.
    Active,
    /// Account is banned until the user confirms their email.
    PendingVerification,
    /// Account is administratively banned.
    Banned,
}

impl AccountStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PendingVerification => "pending_verification",
            Self::Banned => "banned",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
