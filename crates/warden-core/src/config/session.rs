//! Session and remember-me configuration.

use serde::{Deserialize, Serialize};

/// Remember-me credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of a freshly issued remember credential, in days.
    #[serde(default = "default_remember_ttl")]
    pub remember_ttl_days: i64,
    /// Name of the cookie (or header) carrying the remember token.
    #[serde(default = "default_cookie_name")]
    pub remember_cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            remember_ttl_days: default_remember_ttl(),
            remember_cookie_name: default_cookie_name(),
        }
    }
}

fn default_remember_ttl() -> i64 {
    14
}

fn default_cookie_name() -> String {
    "user".to_string()
}
