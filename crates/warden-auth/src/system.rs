//! Wiring of every component over one pair of stores.

use std::sync::Arc;

use chrono::Duration;

use warden_core::config::AppConfig;
use warden_core::traits::{Clock, Notifier};
use warden_database::store::{AccessStore, UserStore};

use crate::account::AccountManager;
use crate::password::{CredentialValidator, PasswordHasher};
use crate::rbac::{AccessGate, PermissionResolver};
use crate::session::{CredentialAuthenticator, RememberTokenManager};
use crate::throttle::LoginThrottle;

/// All engine components built from one configuration.
#[derive(Debug)]
pub struct AuthSystem {
    /// Password hashing.
    pub hasher: PasswordHasher,
    /// Password login.
    pub authenticator: CredentialAuthenticator,
    /// Remember-me tokens.
    pub remember: Arc<RememberTokenManager>,
    /// Permission resolution.
    pub resolver: Arc<PermissionResolver>,
    /// Guarded-action checkpoint.
    pub gate: AccessGate,
    /// Registration and account administration.
    pub accounts: AccountManager,
}

impl AuthSystem {
    /// Build every component.
    pub fn new(
        config: &AppConfig,
        users: Arc<dyn UserStore>,
        access: Arc<dyn AccessStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let remember = Arc::new(RememberTokenManager::new(
            users.clone(),
            clock.clone(),
            Duration::try_days(config.session.remember_ttl_days).unwrap_or(Duration::MAX),
        ));
        let resolver = Arc::new(PermissionResolver::new(access.clone(), &config.auth));

        Self {
            hasher: PasswordHasher::new(),
            authenticator: CredentialAuthenticator::new(
                users.clone(),
                remember.clone(),
                CredentialValidator::new(&config.auth),
                LoginThrottle::new(config.throttle.clone()),
                clock.clone(),
            ),
            remember,
            gate: AccessGate::new(
                resolver.clone(),
                users.clone(),
                clock,
                config.auth.no_access_message.clone(),
            ),
            resolver,
            accounts: AccountManager::new(users, access, notifier, &config.auth),
        }
    }
}
