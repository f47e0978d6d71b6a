//! Password hashing and credential shape checks.

pub mod hasher;
pub mod validator;

pub use hasher::{PasswordHasher, REGISTRATION_SALT_ID};
pub use validator::CredentialValidator;
