//! Account model used for authentication and note authorship.

use serde::{Deserialize, Serialize};

/// Storage-assigned identifier of a user account.
pub type UserId = i64;

/// Maximum username length in characters.
pub const USERNAME_MAX_CHARS: usize = 150;

/// Persisted user account.
///
/// `password_hash` holds an Argon2 PHC string and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Unix epoch milliseconds.
    pub date_joined: i64,
    /// Unix epoch milliseconds of the last successful login.
    pub last_login: Option<i64>,
}
