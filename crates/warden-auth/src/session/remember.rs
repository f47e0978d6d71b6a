//! Remember-me credentials.
//!
//! A user holds at most one credential; issuing a new one replaces the
//! previous secret. The secret is stored as issued.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};

use warden_core::error::AppError;
use warden_core::traits::Clock;
use warden_core::types::UserId;
use warden_database::store::UserStore;
use warden_entity::session::token::SECRET_LENGTH;
use warden_entity::session::{
    IssuedRememberToken, RememberCredential, RememberToken, Session, SessionOrigin,
};

use crate::random::random_alphanumeric;

/// Issues and redeems remember-me tokens.
pub struct RememberTokenManager {
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl std::fmt::Debug for RememberTokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RememberTokenManager")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl RememberTokenManager {
    /// Creates a manager issuing tokens valid for `ttl`.
    pub fn new(users: Arc<dyn UserStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { users, clock, ttl }
    }

    /// Lifetime of tokens from [`issue`](Self::issue).
    pub fn default_ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token with the configured lifetime.
    pub async fn issue(&self, user_id: UserId) -> Result<IssuedRememberToken, AppError> {
        self.issue_with_ttl(user_id, self.ttl).await
    }

    /// Issue a token valid for `ttl`, replacing any earlier one.
    pub async fn issue_with_ttl(
        &self,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<IssuedRememberToken, AppError> {
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::validation("Remember-me lifetime is out of range"))?;

        let credential = RememberCredential {
            secret: random_alphanumeric(SECRET_LENGTH),
            expires_at,
        };
        self.users.set_remember(user_id, Some(&credential)).await?;

        debug!(user_id = %user_id, expires_at = %expires_at, "Issued remember token");

        Ok(IssuedRememberToken {
            token: RememberToken {
                user_id,
                secret: credential.secret,
            },
            expires_at,
        })
    }

    /// Re-establish a session from a presented token.
    ///
    /// An unknown secret clears whatever credential the claimed user holds.
    /// An expired credential is left in place. Throttle state is never
    /// touched.
    pub async fn resume(&self, raw: &str) -> Result<Session, AppError> {
        let token = RememberToken::parse(raw)?;

        let Some(user) = self
            .users
            .find_by_remember_token(token.user_id, &token.secret)
            .await?
        else {
            self.users.set_remember(token.user_id, None).await?;
            debug!(user_id = %token.user_id, "Unknown remember token, credential cleared");
            return Err(AppError::not_found("Remember token not recognised"));
        };

        let now = self.clock.now();
        let expired = user
            .remember_credential()
            .is_none_or(|credential| credential.is_expired(now));
        if expired {
            debug!(user_id = %user.id, "Remember token expired");
            return Err(AppError::expired("Remember token has expired"));
        }

        if user.is_pending_verification() {
            return Err(AppError::not_verified("Account is not verified"));
        }
        if user.banned {
            return Err(AppError::banned("Account is banned"));
        }

        info!(user_id = %user.id, "Session resumed from remember token");
        Ok(Session::for_user(&user, SessionOrigin::RememberToken, now))
    }

    /// Drop the user's remember credential.
    pub async fn revoke(&self, user_id: UserId) -> Result<(), AppError> {
        self.users.set_remember(user_id, None).await
    }
}
