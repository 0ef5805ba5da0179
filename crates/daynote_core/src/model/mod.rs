//! Domain model for dated todo notes and their authors.
//!
//! # Responsibility
//! - Define the records shared by repositories, services and the HTTP layer.
//!
//! # Invariants
//! - Every record is identified by a storage-assigned integer id.
//! - Deletion is a hard delete; there are no tombstones.

pub mod todo;
pub mod user;
