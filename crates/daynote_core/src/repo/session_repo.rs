//! Session and flash-message repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist anonymous/authenticated sessions keyed by an opaque random key.
//! - Hold the per-session flash queue until the next page render consumes it.
//!
//! # Invariants
//! - Expired sessions behave exactly like missing ones.
//! - `take_messages` returns messages in enqueue order and clears them in the
//!   same transaction.
//! - Rotating a session keeps its pending flash messages and sweeps every
//!   expired session in the same transaction.

use crate::context::{FlashLevel, FlashMessage};
use crate::model::user::UserId;
use crate::repo::{ensure_table, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Persisted session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_key: String,
    pub user_id: Option<UserId>,
    /// Unix epoch milliseconds after which the session is ignored.
    pub expire_at: i64,
}

/// Repository interface for sessions and their flash queues.
pub trait SessionRepository {
    /// Creates a fresh session with a new random key.
    fn create_session(&self, user_id: Option<UserId>, ttl: Duration) -> RepoResult<SessionRecord>;
    /// Loads a live session. Expired or unknown keys return `None`.
    fn load_session(&self, session_key: &str) -> RepoResult<Option<SessionRecord>>;
    /// Replaces `old_key` (if any) with a new session bound to `user_id`,
    /// carrying pending flash messages over. Expired sessions are purged.
    fn rotate_session(
        &mut self,
        old_key: Option<&str>,
        user_id: Option<UserId>,
        ttl: Duration,
    ) -> RepoResult<SessionRecord>;
    /// Deletes a session and its flash queue. Unknown keys are ignored.
    fn delete_session(&self, session_key: &str) -> RepoResult<()>;
    /// Appends messages to the session's flash queue.
    fn push_messages(&mut self, session_key: &str, messages: &[FlashMessage]) -> RepoResult<()>;
    /// Drains the session's flash queue.
    fn take_messages(&mut self, session_key: &str) -> RepoResult<Vec<FlashMessage>>;
    /// Removes expired sessions and returns how many were deleted.
    fn purge_expired(&self) -> RepoResult<usize>;
}

/// SQLite-backed session repository.
pub struct SqliteSessionRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_table(conn, "sessions", &["session_key", "user_id", "expire_at"])?;
        ensure_table(
            conn,
            "flash_messages",
            &["id", "session_key", "level", "message"],
        )?;
        Ok(Self { conn })
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn create_session(&self, user_id: Option<UserId>, ttl: Duration) -> RepoResult<SessionRecord> {
        insert_session(&*self.conn, user_id, ttl)
    }

    fn load_session(&self, session_key: &str) -> RepoResult<Option<SessionRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT session_key, user_id, expire_at
                 FROM sessions
                 WHERE session_key = ?1
                   AND expire_at > ?2;",
                params![session_key, now_epoch_ms()],
                |row| {
                    Ok(SessionRecord {
                        session_key: row.get(0)?,
                        user_id: row.get(1)?,
                        expire_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn rotate_session(
        &mut self,
        old_key: Option<&str>,
        user_id: Option<UserId>,
        ttl: Duration,
    ) -> RepoResult<SessionRecord> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let record = insert_session(&tx, user_id, ttl)?;
        if let Some(old_key) = old_key {
            tx.execute(
                "UPDATE flash_messages SET session_key = ?2 WHERE session_key = ?1;",
                params![old_key, record.session_key.as_str()],
            )?;
            tx.execute("DELETE FROM sessions WHERE session_key = ?1;", [old_key])?;
        }
        let purged = delete_expired(&tx)?;
        tx.commit()?;
        if purged > 0 {
            debug!("event=session_purge module=session status=ok removed={purged} trigger=rotate");
        }
        Ok(record)
    }

    fn delete_session(&self, session_key: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM sessions WHERE session_key = ?1;", [session_key])?;
        Ok(())
    }

    fn push_messages(&mut self, session_key: &str, messages: &[FlashMessage]) -> RepoResult<()> {
        if messages.is_empty() {
            return Ok(());
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for message in messages {
            tx.execute(
                "INSERT INTO flash_messages (session_key, level, message)
                 VALUES (?1, ?2, ?3);",
                params![session_key, message.level.as_str(), message.text.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn take_messages(&mut self, session_key: &str) -> RepoResult<Vec<FlashMessage>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut messages = Vec::new();
        {
            let mut stmt = tx.prepare(
                "SELECT level, message
                 FROM flash_messages
                 WHERE session_key = ?1
                 ORDER BY id ASC;",
            )?;
            let mut rows = stmt.query([session_key])?;
            while let Some(row) = rows.next()? {
                let level_text: String = row.get(0)?;
                let level = FlashLevel::parse(&level_text).ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "invalid flash level `{level_text}` in flash_messages.level"
                    ))
                })?;
                messages.push(FlashMessage {
                    level,
                    text: row.get(1)?,
                });
            }
        }
        tx.execute(
            "DELETE FROM flash_messages WHERE session_key = ?1;",
            [session_key],
        )?;
        tx.commit()?;
        Ok(messages)
    }

    fn purge_expired(&self) -> RepoResult<usize> {
        delete_expired(&*self.conn)
    }
}

fn delete_expired(conn: &Connection) -> RepoResult<usize> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE expire_at <= ?1;",
        [now_epoch_ms()],
    )?;
    Ok(removed)
}

fn insert_session(
    conn: &Connection,
    user_id: Option<UserId>,
    ttl: Duration,
) -> RepoResult<SessionRecord> {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    let record = SessionRecord {
        session_key: Uuid::new_v4().simple().to_string(),
        user_id,
        expire_at: now_epoch_ms().saturating_add(ttl_ms),
    };
    conn.execute(
        "INSERT INTO sessions (session_key, user_id, expire_at) VALUES (?1, ?2, ?3);",
        params![record.session_key.as_str(), record.user_id, record.expire_at],
    )?;
    Ok(record)
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
