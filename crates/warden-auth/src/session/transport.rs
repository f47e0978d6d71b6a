//! Where the current session and the remember-me bearer token live.
//!
//! A web embedding maps this onto its session store and a cookie; the CLI
//! and the tests use [`MemoryTransport`].

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use warden_core::types::UserId;
use warden_entity::session::Session;

/// Per-caller session state.
pub trait SessionTransport: Send + Sync {
    /// Store the authenticated principal.
    fn set_principal(&self, session: Session);

    /// The stored principal, if any.
    fn current(&self) -> Option<Session>;

    /// Id of the stored principal, if any.
    fn current_principal_id(&self) -> Option<UserId> {
        self.current().map(|s| s.user_id)
    }

    /// Forget the stored principal.
    fn clear(&self);

    /// The remember-me token the caller presented, if any.
    fn remember_token(&self) -> Option<String>;

    /// Hand a remember-me token to the caller.
    fn set_remember_token(&self, value: &str, expires_at: DateTime<Utc>);

    /// Tell the caller to drop its remember-me token.
    fn clear_remember_token(&self);
}

/// In-process [`SessionTransport`].
#[derive(Debug, Default)]
pub struct MemoryTransport {
    session: Mutex<Option<Session>>,
    remember: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl MemoryTransport {
    /// An empty transport: no session, no token.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport carrying a previously issued remember token.
    pub fn with_remember_token(value: &str, expires_at: DateTime<Utc>) -> Self {
        let transport = Self::new();
        transport.set_remember_token(value, expires_at);
        transport
    }

    /// The carried token together with its expiry.
    pub fn remember_cookie(&self) -> Option<(String, DateTime<Utc>)> {
        self.remember.lock().clone()
    }
}

impl SessionTransport for MemoryTransport {
    fn set_principal(&self, session: Session) {
        *self.session.lock() = Some(session);
    }

    fn current(&self) -> Option<Session> {
        self.session.lock().clone()
    }

    fn clear(&self) {
        *self.session.lock() = None;
    }

    fn remember_token(&self) -> Option<String> {
        self.remember.lock().as_ref().map(|(value, _)| value.clone())
    }

    fn set_remember_token(&self, value: &str, expires_at: DateTime<Utc>) {
        *self.remember.lock() = Some((value.to_string(), expires_at));
    }

    fn clear_remember_token(&self) {
        *self.remember.lock() = None;
    }
}
