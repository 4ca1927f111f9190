//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - Email uniqueness violations surface as `FailureCode::UniqueConstraint`
//!   with `target = ["email"]`.
//! - Deleting a user that still has posts is rejected by the store.

use super::error::{map_returning_error, map_write_error};
use super::{ensure_connection_ready, RepoResult};
use crate::model::user::{NewUser, User, UserUpdate};
use crate::model::{EntityId, EntityKind};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_COLUMNS: &str = "id, name, email";

/// Repository interface for user CRUD and lookup operations.
pub trait UserRepository {
    fn create_user(&self, input: &NewUser) -> RepoResult<User>;
    fn get_user(&self, id: EntityId) -> RepoResult<Option<User>>;
    /// Returns all users in insertion order.
    fn list_users(&self) -> RepoResult<Vec<User>>;
    fn update_user(&self, id: EntityId, update: &UserUpdate) -> RepoResult<User>;
    /// Deletes a user and returns its last persisted state.
    fn delete_user(&self, id: EntityId) -> RepoResult<User>;
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, input: &NewUser) -> RepoResult<User> {
        input.validate()?;

        self.conn
            .query_row(
                &format!("INSERT INTO users (name, email) VALUES (?1, ?2) RETURNING {USER_COLUMNS};"),
                params![input.name.as_str(), input.email.as_str()],
                parse_user_row,
            )
            .map_err(|err| map_write_error(err, None))
    }

    fn get_user(&self, id: EntityId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1;"),
                [id],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC;"))?;
        let users = stmt
            .query_map([], parse_user_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn update_user(&self, id: EntityId, update: &UserUpdate) -> RepoResult<User> {
        update.validate()?;

        self.conn
            .query_row(
                &format!(
                    "UPDATE users
                     SET
                        name = COALESCE(?2, name),
                        email = COALESCE(?3, email)
                     WHERE id = ?1
                     RETURNING {USER_COLUMNS};"
                ),
                params![id, update.name.as_deref(), update.email.as_deref()],
                parse_user_row,
            )
            .map_err(|err| map_returning_error(err, EntityKind::User, id, None))
    }

    fn delete_user(&self, id: EntityId) -> RepoResult<User> {
        self.conn
            .query_row(
                &format!("DELETE FROM users WHERE id = ?1 RETURNING {USER_COLUMNS};"),
                [id],
                parse_user_row,
            )
            .map_err(|err| map_returning_error(err, EntityKind::User, id, None))
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1;"),
                [email],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
    })
}
