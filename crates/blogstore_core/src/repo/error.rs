//! Structured persistence failures.
//!
//! # Responsibility
//! - Describe every repository failure as a code plus optional constraint
//!   metadata, so callers can inspect failures without string matching.
//! - Translate raw SQLite constraint errors into that shape.
//!
//! # Invariants
//! - Metadata is optional on every code; consumers must not assume it.

use crate::db::DbError;
use crate::model::{EntityId, EntityKind, ValidationError};
use rusqlite::{ffi, ErrorCode};
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

const FOREIGN_KEY_MESSAGE: &str = "FOREIGN KEY constraint failed";

/// Coarse failure code carried by every repository error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCode {
    UniqueConstraint,
    ForeignKeyConstraint,
    RecordNotFound,
    InvalidInput,
    Unknown,
}

impl FailureCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UniqueConstraint => "unique_constraint",
            Self::ForeignKeyConstraint => "foreign_key_constraint",
            Self::RecordNotFound => "record_not_found",
            Self::InvalidInput => "invalid_input",
            Self::Unknown => "unknown",
        }
    }
}

/// Fields that triggered a constraint failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureMeta {
    /// Columns covered by a violated unique constraint.
    pub target: Option<Vec<String>>,
    /// Referencing column of a violated foreign key.
    pub field_name: Option<String>,
}

/// Repository error for user/post persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{message}")]
    Constraint {
        code: FailureCode,
        meta: Option<FailureMeta>,
        message: String,
    },
    #[error("{} not found: {id}", .entity.as_str())]
    NotFound { entity: EntityKind, id: EntityId },
    #[error("connection is not ready: schema version {actual_version}, expected {expected_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("{0}")]
    Db(#[from] DbError),
}

impl RepoError {
    pub fn code(&self) -> FailureCode {
        match self {
            Self::Validation(_) => FailureCode::InvalidInput,
            Self::Constraint { code, .. } => *code,
            Self::NotFound { .. } => FailureCode::RecordNotFound,
            Self::UninitializedConnection { .. } | Self::Db(_) => FailureCode::Unknown,
        }
    }

    pub fn meta(&self) -> Option<&FailureMeta> {
        match self {
            Self::Constraint { meta, .. } => meta.as_ref(),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Maps an error raised by a write statement.
///
/// `foreign_key_field` names the referencing column the statement can
/// violate. SQLite does not report it, so the caller supplies it; `None`
/// leaves the metadata empty (e.g. a delete blocked by referencing rows).
pub(crate) fn map_write_error(
    err: rusqlite::Error,
    foreign_key_field: Option<&'static str>,
) -> RepoError {
    let Some((code, message)) = constraint_failure(&err) else {
        return RepoError::from(err);
    };

    let meta = match code {
        FailureCode::UniqueConstraint => unique_target(message.as_deref()).map(|target| FailureMeta {
            target: Some(target),
            field_name: None,
        }),
        FailureCode::ForeignKeyConstraint => foreign_key_field.map(|field| FailureMeta {
            target: None,
            field_name: Some(field.to_string()),
        }),
        _ => None,
    };

    RepoError::Constraint {
        code,
        meta,
        message: message.unwrap_or_else(|| err.to_string()),
    }
}

/// Maps a no-row result of `UPDATE/DELETE ... RETURNING` to `NotFound`.
pub(crate) fn map_returning_error(
    err: rusqlite::Error,
    entity: EntityKind,
    id: EntityId,
    foreign_key_field: Option<&'static str>,
) -> RepoError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => RepoError::NotFound { entity, id },
        other => map_write_error(other, foreign_key_field),
    }
}

fn constraint_failure(err: &rusqlite::Error) -> Option<(FailureCode, Option<String>)> {
    match err {
        rusqlite::Error::SqliteFailure(failure, message)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            let code = match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    FailureCode::UniqueConstraint
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => FailureCode::ForeignKeyConstraint,
                // `ON DELETE RESTRICT` actions report through the trigger code.
                ffi::SQLITE_CONSTRAINT_TRIGGER
                    if message
                        .as_deref()
                        .is_some_and(|text| text.starts_with(FOREIGN_KEY_MESSAGE)) =>
                {
                    FailureCode::ForeignKeyConstraint
                }
                _ => return None,
            };
            Some((code, message.clone()))
        }
        _ => None,
    }
}

/// Extracts column names from `UNIQUE constraint failed: users.email, ...`.
fn unique_target(message: Option<&str>) -> Option<Vec<String>> {
    let (_, columns) = message?.split_once("constraint failed:")?;
    let target: Vec<String> = columns
        .split(',')
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .map(|column| {
            column
                .rsplit_once('.')
                .map_or(column, |(_, name)| name)
                .to_string()
        })
        .collect();

    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}
