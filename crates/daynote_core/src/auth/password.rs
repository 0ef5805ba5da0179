//! Password hashing seam with an Argon2 implementation.
//!
//! # Invariants
//! - Hashes are PHC strings carrying their own salt and parameters.
//! - Verification of a malformed stored hash is an error, not a mismatch.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use std::error::Error;
use std::fmt::{Display, Formatter};

const SALT_LEN: usize = 16;

/// Password hashing failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    Hash(String),
    MalformedHash(String),
}

impl Display for PasswordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash(details) => write!(f, "password hashing failed: {details}"),
            Self::MalformedHash(details) => write!(f, "stored password hash is malformed: {details}"),
        }
    }
}

impl Error for PasswordError {}

/// Hashes and verifies account passwords.
pub trait PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError>;
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError>;
}

/// Argon2id hasher with the crate's default parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|err| PasswordError::Hash(err.to_string()))?;

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordError::Hash(err.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed =
            PasswordHash::new(hash).map_err(|err| PasswordError::MalformedHash(err.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
