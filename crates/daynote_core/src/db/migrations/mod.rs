//! Schema upgrades for the note, account and session stores.
//!
//! # Responsibility
//! - Hold the ordered list of embedded SQL upgrade scripts.
//! - Bring a connection's schema up to the newest known version in one
//!   transaction.
//!
//! # Invariants
//! - Script versions start at 1 and increase by exactly one.
//! - `PRAGMA user_version` always names the last script applied.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, Transaction};

/// One embedded upgrade script.
#[derive(Debug, Clone, Copy)]
pub struct SchemaStep {
    pub version: u32,
    pub name: &'static str,
    sql: &'static str,
}

const STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "users_and_todos",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "sessions_and_flash",
        sql: include_str!("0002_sessions.sql"),
    },
];

/// Newest schema version this build can produce.
pub fn latest_version() -> u32 {
    STEPS.len() as u32
}

/// Steps still missing from a schema at `version`, oldest first.
pub fn pending_steps(version: u32) -> DbResult<&'static [SchemaStep]> {
    check_sequence(STEPS)?;
    let latest = latest_version();
    if version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: version,
            latest_supported: latest,
        });
    }
    Ok(&STEPS[version as usize..])
}

/// Upgrades `conn` to [`latest_version`]. A current schema is left untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = schema_version(conn)?;
    let pending = pending_steps(from)?;
    let Some(last) = pending.last() else {
        return Ok(());
    };

    let tx = conn.transaction()?;
    for step in pending {
        run_step(&tx, step)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={from} to_version={}",
        last.version
    );
    Ok(())
}

/// Version recorded in `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

fn run_step(tx: &Transaction<'_>, step: &SchemaStep) -> DbResult<()> {
    tx.execute_batch(step.sql)?;
    // PRAGMA does not take bound parameters.
    tx.execute_batch(&format!("PRAGMA user_version = {};", step.version))?;
    info!(
        "event=db_migrate_step module=db status=ok version={} name={}",
        step.version, step.name
    );
    Ok(())
}

fn check_sequence(steps: &[SchemaStep]) -> DbResult<()> {
    for (index, step) in steps.iter().enumerate() {
        let expected = index as u32 + 1;
        if step.version != expected {
            return Err(DbError::BrokenMigrationSequence {
                position: index,
                expected,
                found: step.version,
            });
        }
    }
    Ok(())
}
