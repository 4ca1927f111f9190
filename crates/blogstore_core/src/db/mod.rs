//! SQLite storage bootstrap, schema migration and lifecycle entry points.
//!
//! # Responsibility
//! - Open and configure the single SQLite connection used by the process.
//! - Apply schema migrations in deterministic order.
//! - Provide the destructive development reset and the explicit close.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repositories must not read/write application data before migrations succeed.
//! - A connection is released exactly once, through `close_db` or drop.

use thiserror::Error;

pub mod migrations;
mod open;

pub use open::{close_db, open_db, open_db_in_memory, reset_db};
pub use rusqlite::Connection;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}
