//! Credential and group configuration.

use serde::{Deserialize, Serialize};

/// Credential shape rules and the distinguished group names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Maximum password length.
    #[serde(default = "default_password_max")]
    pub password_max_length: usize,
    /// Characters allowed in display names besides ASCII letters and digits.
    #[serde(default = "default_name_valid_chars")]
    pub name_valid_chars: String,
    /// Whether new accounts must confirm their email before logging in.
    #[serde(default)]
    pub verification: bool,
    /// Group every new account joins on registration.
    #[serde(default = "default_default_group")]
    pub default_group: String,
    /// Group whose members hold every permission.
    #[serde(default = "default_admin_group")]
    pub admin_group: String,
    /// Group whose grants apply to every caller, including anonymous ones.
    #[serde(default = "default_public_group")]
    pub public_group: String,
    /// Message surfaced by callers when the access gate denies an action.
    #[serde(default = "default_no_access_message")]
    pub no_access_message: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_min_length: default_password_min(),
            password_max_length: default_password_max(),
            name_valid_chars: default_name_valid_chars(),
            verification: false,
            default_group: default_default_group(),
            admin_group: default_admin_group(),
            public_group: default_public_group(),
            no_access_message: default_no_access_message(),
        }
    }
}

fn default_password_min() -> usize {
    5
}

fn default_password_max() -> usize {
    13
}

fn default_name_valid_chars() -> String {
    " '".to_string()
}

fn default_default_group() -> String {
    "default".to_string()
}

fn default_admin_group() -> String {
    "admin".to_string()
}

fn default_public_group() -> String {
    "public".to_string()
}

fn default_no_access_message() -> String {
    "You don't have access.".to_string()
}
