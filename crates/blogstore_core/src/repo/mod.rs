//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts (create/find/update/delete).
//! - Isolate SQLite query details from the service facade.
//!
//! # Invariants
//! - Write paths validate inputs before SQL mutations.
//! - Every failure is a `RepoError` carrying a `FailureCode`.
//! - Each repository method issues exactly one SQL statement.

use crate::db::migrations::latest_version;
use rusqlite::Connection;

pub mod error;
pub mod post_repo;
pub mod user_repo;

pub use error::{FailureCode, FailureMeta, RepoError, RepoResult};

/// Rejects connections that did not go through `open_db`/`open_db_in_memory`.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
