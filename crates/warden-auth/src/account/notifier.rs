//! Notifier that only writes to the log.

use async_trait::async_trait;
use tracing::info;

use warden_core::result::AppResult;
use warden_core::traits::Notifier;
use warden_core::types::UserId;

/// Emits account messages as tracing events instead of sending mail.
///
/// Meant for development: codes and generated passwords end up in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_verification(&self, user_id: UserId, email: &str, code: &str) -> AppResult<()> {
        info!(user_id = %user_id, email, code, "Verification code issued");
        Ok(())
    }

    async fn send_password_reset(
        &self,
        user_id: UserId,
        email: &str,
        code: &str,
    ) -> AppResult<()> {
        info!(user_id = %user_id, email, code, "Password reset code issued");
        Ok(())
    }

    async fn send_new_password(
        &self,
        user_id: UserId,
        email: &str,
        password: &str,
    ) -> AppResult<()> {
        info!(user_id = %user_id, email, password, "New password issued");
        Ok(())
    }
}
