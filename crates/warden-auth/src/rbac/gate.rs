//! Single allow/deny checkpoint for guarded actions.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use warden_core::error::AppError;
use warden_core::traits::Clock;
use warden_database::store::UserStore;
use warden_entity::permission::PermissionRef;
use warden_entity::session::Session;

use super::resolver::PermissionResolver;

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// The guarded action may proceed.
    Allow,
    /// The guarded action must stop; `message` is for the caller to show.
    Deny {
        /// Configured denial message.
        message: String,
    },
}

impl Decision {
    /// Whether this is [`Decision::Allow`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Guards actions behind a permission.
pub struct AccessGate {
    resolver: Arc<PermissionResolver>,
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    no_access_message: String,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("resolver", &self.resolver)
            .field("no_access_message", &self.no_access_message)
            .finish()
    }
}

impl AccessGate {
    /// Creates a gate.
    pub fn new(
        resolver: Arc<PermissionResolver>,
        users: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
        no_access_message: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            users,
            clock,
            no_access_message: no_access_message.into(),
        }
    }

    /// Check `permission` for the session's principal (anonymous when
    /// `None`). The principal's last activity is refreshed whatever the
    /// outcome.
    pub async fn check(
        &self,
        session: Option<&Session>,
        permission: &PermissionRef,
    ) -> Result<Decision, AppError> {
        let principal = session.map(|s| s.user_id);
        if let Some(user) = principal {
            self.users.touch_activity(user, self.clock.now()).await?;
        }

        if self.resolver.is_allowed(permission, principal).await? {
            return Ok(Decision::Allow);
        }

        info!(
            user_id = ?principal.map(|id| id.value()),
            permission = %permission,
            "Access denied"
        );
        Ok(Decision::Deny {
            message: self.no_access_message.clone(),
        })
    }

    /// [`check`](Self::check), turning a denial into `Forbidden`.
    pub async fn require(
        &self,
        session: Option<&Session>,
        permission: &PermissionRef,
    ) -> Result<(), AppError> {
        match self.check(session, permission).await? {
            Decision::Allow => Ok(()),
            Decision::Deny { message } => Err(AppError::forbidden(message)),
        }
    }
}
