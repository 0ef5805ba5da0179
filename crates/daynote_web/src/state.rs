//! Shared application state handed to every handler.
//!
//! # Invariants
//! - All storage access goes through `with_conn`, one request at a time.
//! - The mutex is never held across an `.await`.

use crate::reply::ApiError;
use daynote_core::{
    AppConfig, AuthService, DeleteNoticePolicy, SqliteTodoRepository, SqliteUserRepository,
    TodoWorkflow,
};
use rusqlite::Connection;
use std::sync::Mutex;
use std::time::Duration;

pub struct AppState {
    conn: Mutex<Connection>,
    session_ttl: Duration,
    delete_notice: DeleteNoticePolicy,
}

impl AppState {
    pub fn new(conn: Connection, config: &AppConfig) -> Self {
        Self {
            conn: Mutex::new(conn),
            session_ttl: config.session_ttl,
            delete_notice: config.delete_notice,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Runs `f` with exclusive access to the database connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| ApiError::Internal("database mutex poisoned".to_string()))?;
        f(&mut conn)
    }

    /// Note workflow bound to `conn`, using the configured delete policy.
    pub fn workflow<'c>(
        &self,
        conn: &'c Connection,
    ) -> Result<TodoWorkflow<SqliteTodoRepository<'c>>, ApiError> {
        Ok(TodoWorkflow::with_policy(
            SqliteTodoRepository::try_new(conn)?,
            self.delete_notice,
        ))
    }

    pub fn auth<'c>(
        &self,
        conn: &'c Connection,
    ) -> Result<AuthService<SqliteUserRepository<'c>>, ApiError> {
        Ok(AuthService::new(SqliteUserRepository::try_new(conn)?))
    }
}
