//! Registration and account administration.

use std::sync::Arc;

use tracing::{debug, info, warn};

use warden_core::config::AuthConfig;
use warden_core::error::AppError;
use warden_core::traits::Notifier;
use warden_core::types::UserId;
use warden_database::store::{AccessStore, UserStore};
use warden_entity::group::{Group, GroupRef};
use warden_entity::user::{CreateUser, LoginAttemptState, User, UserVariable};

use crate::password::{CredentialValidator, PasswordHasher, REGISTRATION_SALT_ID};
use crate::random::random_alphanumeric;

/// Length of an email verification code.
pub const VERIFICATION_CODE_LENGTH: usize = 16;

/// Length of a password generated by [`AccountManager::reset_password`].
pub const GENERATED_PASSWORD_LENGTH: usize = 8;

/// Creates and administers user accounts.
pub struct AccountManager {
    users: Arc<dyn UserStore>,
    access: Arc<dyn AccessStore>,
    notifier: Arc<dyn Notifier>,
    validator: CredentialValidator,
    hasher: PasswordHasher,
    default_group: String,
    verification: bool,
}

impl std::fmt::Debug for AccountManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountManager")
            .field("default_group", &self.default_group)
            .field("verification", &self.verification)
            .finish()
    }
}

impl AccountManager {
    /// Creates a manager.
    pub fn new(
        users: Arc<dyn UserStore>,
        access: Arc<dyn AccessStore>,
        notifier: Arc<dyn Notifier>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            users,
            access,
            notifier,
            validator: CredentialValidator::new(config),
            hasher: PasswordHasher::new(),
            default_group: config.default_group.clone(),
            verification: config.verification,
        }
    }

    /// Register a new account.
    ///
    /// The row is first written with a digest salted by the registration
    /// sentinel id and re-hashed as soon as the store has assigned the real
    /// id, before any later step can fail. New accounts join the default
    /// group. With verification enabled the account starts banned and a code
    /// goes out through the notifier.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<User, AppError> {
        self.validator.validate_email(email)?;
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::conflict("Email address already exists"));
        }
        self.validator.validate_password(password)?;
        self.validator.validate_name(name)?;

        let user = self
            .users
            .create(&CreateUser {
                email: email.to_string(),
                password_hash: self.hasher.hash_password(password, REGISTRATION_SALT_ID),
                name: name.to_string(),
            })
            .await?;
        self.users
            .update_password(user.id, &self.hasher.hash_password(password, user.id))
            .await?;

        match self.access.find_group_by_name(&self.default_group).await? {
            Some(group) => self.access.add_member(user.id, group.id).await?,
            None => warn!(group = %self.default_group, "Default group does not exist"),
        }

        if self.verification {
            self.users.set_banned(user.id, true).await?;
            self.send_verification(user.id).await?;
        }

        info!(user_id = %user.id, verification = self.verification, "User registered");
        self.users
            .find_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::internal(format!("User {} vanished after creation", user.id)))
    }

    /// Issue a fresh verification code and hand it to the notifier.
    pub async fn send_verification(&self, user_id: UserId) -> Result<(), AppError> {
        let user = self.require(user_id).await?;
        let code = random_alphanumeric(VERIFICATION_CODE_LENGTH);

        self.users.set_verification_code(user_id, Some(&code)).await?;
        self.notifier
            .send_verification(user_id, &user.email, &code)
            .await
    }

    /// Confirm an email address. A matching code clears the code and lifts
    /// the ban.
    pub async fn verify(&self, user_id: UserId, code: &str) -> Result<(), AppError> {
        let user = self.require(user_id).await?;

        let matches = !code.is_empty() && user.verification_code.as_deref() == Some(code);
        if !matches {
            warn!(user_id = %user_id, "Verification code mismatch");
            return Err(AppError::validation("Invalid verification code"));
        }

        self.users.set_verification_code(user_id, None).await?;
        self.users.set_banned(user_id, false).await?;
        info!(user_id = %user_id, "User verified");
        Ok(())
    }

    /// Replace the password.
    pub async fn change_password(&self, user_id: UserId, password: &str) -> Result<(), AppError> {
        self.validator.validate_password(password)?;
        self.require(user_id).await?;
        self.users
            .update_password(user_id, &self.hasher.hash_password(password, user_id))
            .await
    }

    /// Ban an account.
    pub async fn ban(&self, user_id: UserId) -> Result<(), AppError> {
        self.users.set_banned(user_id, true).await?;
        info!(user_id = %user_id, "User banned");
        Ok(())
    }

    /// Lift a ban.
    pub async fn unban(&self, user_id: UserId) -> Result<(), AppError> {
        self.users.set_banned(user_id, false).await?;
        info!(user_id = %user_id, "User unbanned");
        Ok(())
    }

    /// Whether the account is banned. Unknown accounts are `NotFound`.
    pub async fn is_banned(&self, user_id: UserId) -> Result<bool, AppError> {
        Ok(self.require(user_id).await?.banned)
    }

    /// Clear the login throttle state.
    pub async fn reset_login_attempts(&self, user_id: UserId) -> Result<(), AppError> {
        self.require(user_id).await?;
        self.users
            .update_login_attempts(user_id, &LoginAttemptState::default())
            .await
    }

    /// Delete an account with its memberships and grants.
    pub async fn delete(&self, user_id: UserId) -> Result<(), AppError> {
        self.users.delete(user_id).await?;
        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    /// Start a password reset: store a fresh code and send it to `email`.
    ///
    /// Unknown addresses succeed silently. Banned accounts, including those
    /// awaiting verification, get no code.
    pub async fn remind_password(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            debug!("Password reminder for unknown email");
            return Ok(());
        };
        if user.banned {
            debug!(user_id = %user.id, "Password reminder for banned account skipped");
            return Ok(());
        }

        let code = random_alphanumeric(VERIFICATION_CODE_LENGTH);
        self.users.set_verification_code(user.id, Some(&code)).await?;
        self.notifier
            .send_password_reset(user.id, &user.email, &code)
            .await
    }

    /// Finish a password reset. A matching code replaces the password with a
    /// generated one, clears the code and sends the new password out.
    pub async fn reset_password(&self, user_id: UserId, code: &str) -> Result<(), AppError> {
        let user = self.require(user_id).await?;
        if user.is_pending_verification() {
            return Err(AppError::not_verified("Account is not verified"));
        }
        if user.banned {
            return Err(AppError::banned("Account is banned"));
        }

        let matches = !code.is_empty() && user.verification_code.as_deref() == Some(code);
        if !matches {
            warn!(user_id = %user_id, "Password reset code mismatch");
            return Err(AppError::validation("Invalid password reset code"));
        }

        let password = random_alphanumeric(GENERATED_PASSWORD_LENGTH);
        self.users
            .update_password(user_id, &self.hasher.hash_password(&password, user_id))
            .await?;
        self.users.set_verification_code(user_id, None).await?;
        info!(user_id = %user_id, "Password reset");
        self.notifier
            .send_new_password(user_id, &user.email, &password)
            .await
    }

    /// List accounts, optionally only the members of `group`.
    pub async fn list_users(
        &self,
        group: Option<&GroupRef>,
        include_banned: bool,
    ) -> Result<Vec<User>, AppError> {
        match group {
            Some(group) => {
                let group_id = self.access.resolve_group(group).await?;
                self.users.list_members(group_id, include_banned).await
            }
            None => self.users.list(include_banned).await,
        }
    }

    /// Groups the account belongs to.
    pub async fn user_groups(&self, user_id: UserId) -> Result<Vec<Group>, AppError> {
        self.require(user_id).await?;
        self.access.user_groups(user_id).await
    }

    /// Store a per-user value under `key`, replacing any previous one.
    pub async fn set_user_var(
        &self,
        user_id: UserId,
        key: &str,
        value: &str,
    ) -> Result<(), AppError> {
        Self::validate_key(key)?;
        self.users.set_variable(user_id, key, value).await
    }

    /// Remove a per-user value. Missing keys are not an error.
    pub async fn unset_user_var(&self, user_id: UserId, key: &str) -> Result<(), AppError> {
        Self::validate_key(key)?;
        self.require(user_id).await?;
        self.users.unset_variable(user_id, key).await
    }

    /// Read a per-user value.
    pub async fn get_user_var(
        &self,
        user_id: UserId,
        key: &str,
    ) -> Result<Option<String>, AppError> {
        Self::validate_key(key)?;
        self.require(user_id).await?;
        self.users.get_variable(user_id, key).await
    }

    /// Every per-user value, ordered by key.
    pub async fn user_vars(&self, user_id: UserId) -> Result<Vec<UserVariable>, AppError> {
        self.require(user_id).await?;
        self.users.list_variables(user_id).await
    }

    fn validate_key(key: &str) -> Result<(), AppError> {
        if key.trim().is_empty() {
            return Err(AppError::validation("Variable key must not be empty"));
        }
        Ok(())
    }

    async fn require(&self, user_id: UserId) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }
}
