//! Account repository contract and SQLite implementation.
//!
//! # Invariants
//! - Usernames are unique; uniqueness checks ignore ASCII case.
//! - Only password hashes reach storage.

use crate::model::user::{User, UserId};
use crate::repo::{ensure_table, is_constraint_violation, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    password_hash,
    date_joined,
    last_login
FROM users";

const USER_COLUMNS: &[&str] = &[
    "id",
    "username",
    "password_hash",
    "date_joined",
    "last_login",
];

/// Repository interface for user accounts.
pub trait UserRepository {
    /// Inserts a new account. Fails with `Conflict` when the username is taken.
    fn create_user(&self, username: &str, password_hash: &str) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Exact (case-sensitive) username lookup used by credential checks.
    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Case-insensitive existence check used by registration.
    fn username_taken(&self, username: &str) -> RepoResult<bool>;
    /// Stamps `last_login` with the current time.
    fn touch_last_login(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(conn, "users", USER_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, username: &str, password_hash: &str) -> RepoResult<User> {
        let inserted = self.conn.execute(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2);",
            params![username, password_hash],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_constraint_violation(&err) => {
                return Err(RepoError::Conflict(format!(
                    "username `{username}` already exists"
                )));
            }
            Err(err) => return Err(err.into()),
        }

        let id = self.conn.last_insert_rowid();
        self.get_user(id)?.ok_or(RepoError::NotFound { entity: "user", id })
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE username = ?1;"))?;
        let mut rows = stmt.query([username])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn username_taken(&self, username: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM users WHERE username = ?1 COLLATE NOCASE
            );",
            [username],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn touch_last_login(&self, id: UserId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET last_login = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "user", id });
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        date_joined: row.get("date_joined")?,
        last_login: row.get("last_login")?,
    })
}
