//! # warden-auth
//!
//! Authentication and authorization for Warden.
//!
//! ## Modules
//!
//! - `password`: salted password digests and credential shape checks
//! - `throttle`: per-account failed-login lockout
//! - `session`: password login, remember-me tokens, session transport
//! - `rbac`: group/permission resolution and the access gate
//! - `account`: registration, verification, bans

pub mod account;
pub mod password;
pub mod random;
pub mod rbac;
pub mod session;
pub mod system;
pub mod throttle;

pub use account::{AccountManager, LogNotifier};
pub use password::{CredentialValidator, PasswordHasher};
pub use rbac::{AccessGate, Decision, PermissionResolver};
pub use session::{CredentialAuthenticator, MemoryTransport, RememberTokenManager, SessionTransport};
pub use system::AuthSystem;
pub use throttle::LoginThrottle;
