//! Outbound notification hook.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::UserId;

/// Delivers account messages (verification codes, password reset codes and
/// generated passwords) to users.
///
/// Warden never sends mail itself; the embedding application plugs in a
/// transport here.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Deliver a verification code to `email`.
    async fn send_verification(&self, user_id: UserId, email: &str, code: &str) -> AppResult<()>;

    /// Deliver a password reset code to `email`.
    async fn send_password_reset(&self, user_id: UserId, email: &str, code: &str)
    -> AppResult<()>;

    /// Deliver a newly generated password to `email`.
    async fn send_new_password(&self, user_id: UserId, email: &str, password: &str)
    -> AppResult<()>;
}
