//! Password login, logout and the "who is calling" check.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use warden_core::error::AppError;
use warden_core::traits::Clock;
use warden_database::store::UserStore;
use warden_entity::session::{Session, SessionOrigin};
use warden_entity::user::{LoginAttemptState, User};

use crate::password::{CredentialValidator, PasswordHasher};
use crate::throttle::LoginThrottle;

use super::remember::RememberTokenManager;
use super::transport::SessionTransport;

/// Verifies email and password and establishes sessions.
pub struct CredentialAuthenticator {
    users: Arc<dyn UserStore>,
    remember: Arc<RememberTokenManager>,
    validator: CredentialValidator,
    hasher: PasswordHasher,
    throttle: LoginThrottle,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CredentialAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialAuthenticator")
            .field("validator", &self.validator)
            .field("throttle", &self.throttle)
            .finish()
    }
}

impl CredentialAuthenticator {
    /// Creates an authenticator over the given collaborators.
    pub fn new(
        users: Arc<dyn UserStore>,
        remember: Arc<RememberTokenManager>,
        validator: CredentialValidator,
        throttle: LoginThrottle,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            remember,
            validator,
            hasher: PasswordHasher::new(),
            throttle,
            clock,
        }
    }

    /// Log in with email and password.
    ///
    /// 1. Drop any remember token the caller carries
    /// 2. Check email and password shape
    /// 3. Refuse throttled and unverified accounts
    /// 4. Match the digest on a non-banned account
    /// 5. On success record the login and hand out the session (and a
    ///    remember token when asked); on failure advance the throttle
    ///
    /// Wrong passwords, unknown emails and administrative bans all come back
    /// as `InvalidCredentials`.
    pub async fn login(
        &self,
        transport: &dyn SessionTransport,
        email: &str,
        password: &str,
        remember: bool,
        ip_address: Option<&str>,
    ) -> Result<Session, AppError> {
        transport.clear_remember_token();
        self.validator.validate_login(email, password)?;

        let now = self.clock.now();
        let user = self.users.find_by_email(email).await?;

        if let Some(ref user) = user {
            if let Err(e) = self.throttle.check(&user.login_attempts(), now) {
                warn!(
                    user_id = %user.id,
                    locked_until = ?user.locked_until,
                    "Login refused, account is throttled"
                );
                return Err(e);
            }

            if user.is_pending_verification() {
                warn!(user_id = %user.id, "Login refused, account not verified");
                return Err(AppError::not_verified("Account is not verified"));
            }
        }

        let matched = user.as_ref().filter(|u| {
            !u.banned
                && self
                    .hasher
                    .verify_password(password, u.id, &u.password_hash)
        });

        let Some(account) = matched else {
            if let Some(ref user) = user {
                self.record_failure(user, now).await?;
            } else {
                debug!("Login failed for unknown email");
            }
            return Err(AppError::invalid_credentials(
                "Email or password is incorrect",
            ));
        };

        if remember {
            let issued = self.remember.issue(account.id).await?;
            transport.set_remember_token(&issued.token.to_string(), issued.expires_at);
        }

        self.users.record_login(account.id, now, ip_address).await?;
        self.users.touch_activity(account.id, now).await?;
        if account.login_attempts() != LoginAttemptState::default() {
            self.users
                .update_login_attempts(account.id, &LoginAttemptState::default())
                .await?;
        }

        let session = Session::for_user(account, SessionOrigin::Password, now);
        transport.set_principal(session.clone());

        info!(user_id = %account.id, remember, "Login successful");
        Ok(session)
    }

    /// End the caller's session.
    ///
    /// The stored remember credential survives; only the caller's copy of
    /// the token is dropped.
    pub fn logout(&self, transport: &dyn SessionTransport) {
        if let Some(id) = transport.current_principal_id() {
            info!(user_id = %id, "Logout");
        }
        transport.clear();
        transport.clear_remember_token();
    }

    /// The caller's session, resuming one from a carried remember token when
    /// no session is stored yet.
    ///
    /// Token problems (malformed, unknown, expired, banned) mean "not logged
    /// in"; store failures propagate.
    pub async fn is_logged_in(
        &self,
        transport: &dyn SessionTransport,
    ) -> Result<Option<Session>, AppError> {
        if let Some(session) = transport.current() {
            return Ok(Some(session));
        }

        let Some(token) = transport.remember_token() else {
            return Ok(None);
        };

        match self.remember.resume(&token).await {
            Ok(session) => {
                transport.set_principal(session.clone());
                Ok(Some(session))
            }
            Err(e) if e.is_store_error() => Err(e),
            Err(e) => {
                debug!(kind = %e.kind, "Remember token rejected");
                Ok(None)
            }
        }
    }

    async fn record_failure(&self, user: &User, now: DateTime<Utc>) -> Result<(), AppError> {
        let next = self.throttle.record_failure(&user.login_attempts(), now);
        self.users.update_login_attempts(user.id, &next).await?;

        warn!(
            user_id = %user.id,
            failure_count = next.failure_count,
            locked_until = ?next.locked_until,
            "Login failed"
        );
        Ok(())
    }
}
