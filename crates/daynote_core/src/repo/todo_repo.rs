//! Todo note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the `todos` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Listing is always ordered by `id ASC`.
//! - `update_todo` never writes `author_id`.

use crate::model::todo::{Todo, TodoFields, TodoId};
use crate::model::user::UserId;
use crate::repo::{ensure_table, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const TODO_SELECT_SQL: &str = "SELECT
    id,
    day,
    month,
    year,
    time,
    task,
    author_id
FROM todos";

const TODO_COLUMNS: &[&str] = &["id", "day", "month", "year", "time", "task", "author_id"];

/// Repository interface for todo notes.
pub trait TodoRepository {
    /// Inserts one note owned by `author` and returns its assigned id.
    fn create_todo(&self, fields: &TodoFields, author: UserId) -> RepoResult<TodoId>;
    /// Overwrites all editable fields of an existing note.
    fn update_todo(&self, id: TodoId, fields: &TodoFields) -> RepoResult<()>;
    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>>;
    /// Lists every note ordered by ascending id.
    fn list_todos(&self) -> RepoResult<Vec<Todo>>;
    /// Hard-deletes one note.
    fn delete_todo(&self, id: TodoId) -> RepoResult<()>;
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(conn, "todos", TODO_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn create_todo(&self, fields: &TodoFields, author: UserId) -> RepoResult<TodoId> {
        self.conn.execute(
            "INSERT INTO todos (day, month, year, time, task, author_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                fields.day.as_str(),
                fields.month,
                fields.year,
                fields.time,
                fields.task.as_str(),
                author,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_todo(&self, id: TodoId, fields: &TodoFields) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE todos
             SET
                day = ?2,
                month = ?3,
                year = ?4,
                time = ?5,
                task = ?6
             WHERE id = ?1;",
            params![
                id,
                fields.day.as_str(),
                fields.month,
                fields.year,
                fields.time,
                fields.task.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: "todo", id });
        }
        Ok(())
    }

    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TODO_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_todo_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_todos(&self) -> RepoResult<Vec<Todo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TODO_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut todos = Vec::new();
        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(row)?);
        }
        Ok(todos)
    }

    fn delete_todo(&self, id: TodoId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM todos WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "todo", id });
        }
        Ok(())
    }
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<Todo> {
    Ok(Todo {
        id: row.get("id")?,
        day: row.get("day")?,
        month: row.get("month")?,
        year: row.get("year")?,
        time: row.get("time")?,
        task: row.get("task")?,
        author: row.get("author_id")?,
    })
}
