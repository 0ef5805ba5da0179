//! Core use-case controllers.
//!
//! # Responsibility
//! - Orchestrate repository calls into request-level operations.
//! - Keep the HTTP layer decoupled from storage details.

pub mod auth_service;
pub mod todo_workflow;
