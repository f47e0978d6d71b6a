//! Salted SHA-256 password digests.
//!
//! `digest = hex(SHA256(hex(MD5(user_id)) || password))`. The salt is the
//! user's numeric id, so a digest must be recomputed whenever the id it
//! was computed for changes.

use md5::Md5;
use sha2::{Digest, Sha256};

use warden_core::types::UserId;

/// Salt id used for the first write of a new account, before the store has
/// assigned the real id.
pub const REGISTRATION_SALT_ID: UserId = UserId(0);

/// Computes and checks password digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Creates a new password hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Hash `password` salted with `user_id`. Lowercase hex output.
    pub fn hash_password(&self, password: &str, user_id: UserId) -> String {
        let salt = hex::encode(Md5::digest(user_id.to_string().as_bytes()));

        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Check `password` against a stored digest.
    pub fn verify_password(&self, password: &str, user_id: UserId, digest: &str) -> bool {
        let computed = self.hash_password(password, user_id);
        computed.len() == digest.len()
            && computed
                .bytes()
                .zip(digest.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}
