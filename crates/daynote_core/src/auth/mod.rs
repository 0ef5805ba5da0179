//! Credential hashing and authorship authorization.
//!
//! # Responsibility
//! - Hash and verify account passwords.
//! - Decide whether a user may mutate a note.

pub mod password;
pub mod permission;
