//! Per-account failed-login throttling.

pub mod login;

pub use login::LoginThrottle;
