//! Account lifecycle: registration, verification, bans.

pub mod manager;
pub mod notifier;

pub use manager::AccountManager;
pub use notifier::LogNotifier;
