//! Shape checks for emails, passwords and display names.
//!
//! All checks run before any store access.

use validator::Validate;

use warden_core::config::AuthConfig;
use warden_core::error::AppError;

#[derive(Debug, Validate)]
struct EmailInput {
    #[validate(email)]
    email: String,
}

/// Validates credential input against the configured rules.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    min_length: usize,
    max_length: usize,
    name_valid_chars: String,
}

impl CredentialValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
            max_length: config.password_max_length,
            name_valid_chars: config.name_valid_chars.clone(),
        }
    }

    /// Reject anything that is not a syntactically valid email address.
    pub fn validate_email(&self, email: &str) -> Result<(), AppError> {
        EmailInput {
            email: email.to_string(),
        }
        .validate()
        .map_err(|_| AppError::validation("Invalid email address"))
    }

    /// Passwords are ASCII letters and digits only, with a bounded length.
    pub fn validate_password(&self, password: &str) -> Result<(), AppError> {
        if password.len() < self.min_length || password.len() > self.max_length {
            return Err(AppError::validation(format!(
                "Password must be between {} and {} characters long",
                self.min_length, self.max_length
            )));
        }

        if !password.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::validation(
                "Password may only contain letters and digits",
            ));
        }

        Ok(())
    }

    /// Names are optional. A non-empty name must contain at least one ASCII
    /// letter or digit and nothing besides those and the configured extra
    /// characters.
    pub fn validate_name(&self, name: &str) -> Result<(), AppError> {
        if name.is_empty() {
            return Ok(());
        }

        let remainder: Vec<char> = name
            .chars()
            .filter(|c| !self.name_valid_chars.contains(*c))
            .collect();

        if remainder.is_empty() || !remainder.iter().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::validation("Invalid name"));
        }
        Ok(())
    }

    /// The checks a login request passes before the store is consulted.
    pub fn validate_login(&self, email: &str, password: &str) -> Result<(), AppError> {
        self.validate_email(email)?;
        self.validate_password(password)
    }
}
