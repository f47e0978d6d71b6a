//! Login throttle configuration.

use serde::{Deserialize, Serialize};

/// Per-account failed-login throttling.
///
/// After `max_attempts` failures inside the rolling window the account is
/// locked for `lockout_step_seconds`, one more step for every further
/// failure, never longer than `max_lockout_seconds`. A gap longer than
/// `reset_after_seconds` since the last failure starts the count over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Whether the pre-login lockout check is enforced.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Consecutive failures that trigger the first lockout.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Length of one lockout step in seconds.
    #[serde(default = "default_step")]
    pub lockout_step_seconds: u64,
    /// Quiet period after which the failure count resets.
    #[serde(default = "default_reset_after")]
    pub reset_after_seconds: u64,
    /// Upper bound for a single lockout.
    #[serde(default = "default_max_lockout")]
    pub max_lockout_seconds: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            lockout_step_seconds: default_step(),
            reset_after_seconds: default_reset_after(),
            max_lockout_seconds: default_max_lockout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_step() -> u64 {
    30
}

fn default_reset_after() -> u64 {
    600
}

fn default_max_lockout() -> u64 {
    600
}
