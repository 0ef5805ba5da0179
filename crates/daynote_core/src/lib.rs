//! Core domain logic for Daynote.
//! This crate is the single source of truth for business invariants.

pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod forms;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::password::{Argon2Hasher, PasswordError, PasswordHasher};
pub use auth::permission::can_modify;
pub use config::{AppConfig, ConfigError};
pub use context::{FlashLevel, FlashMessage, Outcome, Redirect, RequestContext, Submission};
pub use forms::auth_forms::{Credentials, LoginForm, RegisterForm};
pub use forms::note_form::NoteForm;
pub use forms::{Form, FormErrors};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::todo::{Todo, TodoFields, TodoId};
pub use model::user::{User, UserId};
pub use repo::session_repo::{SessionRecord, SessionRepository, SqliteSessionRepository};
pub use repo::todo_repo::{SqliteTodoRepository, TodoRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::auth_service::{AuthError, AuthResult, AuthService};
pub use service::todo_workflow::{
    DeleteNoticePolicy, TodoWorkflow, WorkflowError, WorkflowResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
