//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use parking_lot::Mutex;

use warden_auth::{AuthSystem, MemoryTransport};
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_core::traits::{Clock, ManualClock, Notifier};
use warden_core::types::UserId;
use warden_database::MemoryStore;
use warden_database::store::AccessStore;
use warden_entity::session::Session;
use warden_entity::user::User;

/// Kind of message handed to the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Verification,
    PasswordReset,
    NewPassword,
}

/// Notifier that keeps every message it is asked to deliver.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(UserId, MessageKind, String)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    /// The last verification code sent to `user_id`.
    pub fn last_code(&self, user_id: UserId) -> Option<String> {
        self.last(user_id, MessageKind::Verification)
    }

    /// The last message of `kind` sent to `user_id`.
    pub fn last(&self, user_id: UserId, kind: MessageKind) -> Option<String> {
        self.sent
            .lock()
            .iter()
            .rev()
            .find(|(id, k, _)| *id == user_id && *k == kind)
            .map(|(_, _, payload)| payload.clone())
    }

    /// Number of messages sent.
    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Make every delivery fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, user_id: UserId, kind: MessageKind, payload: &str) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::internal("Mail transport is down"));
        }
        self.sent.lock().push((user_id, kind, payload.to_string()));
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_verification(&self, user_id: UserId, _email: &str, code: &str) -> AppResult<()> {
        self.record(user_id, MessageKind::Verification, code)
    }

    async fn send_password_reset(
        &self,
        user_id: UserId,
        _email: &str,
        code: &str,
    ) -> AppResult<()> {
        self.record(user_id, MessageKind::PasswordReset, code)
    }

    async fn send_new_password(
        &self,
        user_id: UserId,
        _email: &str,
        password: &str,
    ) -> AppResult<()> {
        self.record(user_id, MessageKind::NewPassword, password)
    }
}

/// Test application context
pub struct TestApp {
    /// Store behind both store traits
    pub store: Arc<MemoryStore>,
    /// Clock driving throttle and token expiry
    pub clock: Arc<ManualClock>,
    /// Captured verification codes
    pub notifier: Arc<RecordingNotifier>,
    /// The engine
    pub system: AuthSystem,
    /// Configuration the engine was built from
    pub config: AppConfig,
}

impl TestApp {
    /// Create an application with default configuration
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create an application with the given configuration
    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::with_groups(&["admin", "public", "default"]));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let notifier = Arc::new(RecordingNotifier::default());

        let system = AuthSystem::new(
            &config,
            store.clone(),
            store.clone(),
            clock.clone(),
            notifier.clone(),
        );

        Self {
            store,
            clock,
            notifier,
            system,
            config,
        }
    }

    /// Register an account, panicking on failure
    pub async fn register(&self, email: &str, password: &str) -> User {
        self.system
            .accounts
            .register(email, password, "")
            .await
            .expect("Failed to register test user")
    }

    /// Log in through a fresh transport
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Session> {
        let transport = MemoryTransport::new();
        self.system
            .authenticator
            .login(&transport, email, password, false, None)
            .await
    }

    /// Current test time
    pub fn clock_now(&self) -> chrono::DateTime<Utc> {
        self.clock.now()
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Create a group and return its id
    pub async fn group(&self, name: &str) -> warden_core::types::GroupId {
        self.store
            .create_group(name, None)
            .await
            .expect("Failed to create group")
            .id
    }

    /// Create a permission and return its id
    pub async fn permission(&self, name: &str) -> warden_core::types::PermissionId {
        self.store
            .create_permission(name, None)
            .await
            .expect("Failed to create permission")
            .id
    }
}
