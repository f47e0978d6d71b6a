//! Per-account login throttle state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failed-login bookkeeping kept on the user row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttemptState {
    /// Consecutive failures inside the current window.
    pub failure_count: u32,
    /// Time of the most recent failure.
    pub last_attempt: Option<DateTime<Utc>>,
    /// Logins are refused until this instant.
    pub locked_until: Option<DateTime<Utc>>,
}

impl LoginAttemptState {
    /// Whether a lockout is in force at `now`.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}
