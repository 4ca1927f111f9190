//! Post repository contract and SQLite implementation.
//!
//! # Invariants
//! - `author_id` violations surface as `FailureCode::ForeignKeyConstraint`
//!   with `field_name = "author_id"`.
//! - Title lookups are exact matches and may return many rows.

use super::error::{map_returning_error, map_write_error};
use super::{ensure_connection_ready, RepoResult};
use crate::model::post::{NewPost, Post, PostUpdate};
use crate::model::{EntityId, EntityKind};
use rusqlite::{params, Connection, OptionalExtension, Row};

const POST_COLUMNS: &str = "id, title, author_id";
const AUTHOR_FIELD: &str = "author_id";

/// Repository interface for post CRUD and lookup operations.
pub trait PostRepository {
    fn create_post(&self, input: &NewPost) -> RepoResult<Post>;
    fn get_post(&self, id: EntityId) -> RepoResult<Option<Post>>;
    /// Returns all posts in insertion order.
    fn list_posts(&self) -> RepoResult<Vec<Post>>;
    fn update_post(&self, id: EntityId, update: &PostUpdate) -> RepoResult<Post>;
    /// Deletes a post and returns its last persisted state.
    fn delete_post(&self, id: EntityId) -> RepoResult<Post>;
    fn find_posts_by_title(&self, title: &str) -> RepoResult<Vec<Post>>;
    fn list_posts_by_author(&self, author_id: EntityId) -> RepoResult<Vec<Post>>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_posts(&self, sql: &str, value: impl rusqlite::ToSql) -> RepoResult<Vec<Post>> {
        let mut stmt = self.conn.prepare(sql)?;
        let posts = stmt
            .query_map([value], parse_post_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn create_post(&self, input: &NewPost) -> RepoResult<Post> {
        input.validate()?;

        self.conn
            .query_row(
                &format!(
                    "INSERT INTO posts (title, author_id) VALUES (?1, ?2) RETURNING {POST_COLUMNS};"
                ),
                params![input.title.as_str(), input.author_id],
                parse_post_row,
            )
            .map_err(|err| map_write_error(err, Some(AUTHOR_FIELD)))
    }

    fn get_post(&self, id: EntityId) -> RepoResult<Option<Post>> {
        let post = self
            .conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1;"),
                [id],
                parse_post_row,
            )
            .optional()?;
        Ok(post)
    }

    fn list_posts(&self) -> RepoResult<Vec<Post>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {POST_COLUMNS} FROM posts ORDER BY id ASC;"))?;
        let posts = stmt
            .query_map([], parse_post_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    fn update_post(&self, id: EntityId, update: &PostUpdate) -> RepoResult<Post> {
        update.validate()?;

        self.conn
            .query_row(
                &format!(
                    "UPDATE posts
                     SET
                        title = COALESCE(?2, title),
                        author_id = COALESCE(?3, author_id)
                     WHERE id = ?1
                     RETURNING {POST_COLUMNS};"
                ),
                params![id, update.title.as_deref(), update.author_id],
                parse_post_row,
            )
            .map_err(|err| map_returning_error(err, EntityKind::Post, id, Some(AUTHOR_FIELD)))
    }

    fn delete_post(&self, id: EntityId) -> RepoResult<Post> {
        self.conn
            .query_row(
                &format!("DELETE FROM posts WHERE id = ?1 RETURNING {POST_COLUMNS};"),
                [id],
                parse_post_row,
            )
            .map_err(|err| map_returning_error(err, EntityKind::Post, id, None))
    }

    fn find_posts_by_title(&self, title: &str) -> RepoResult<Vec<Post>> {
        self.query_posts(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE title = ?1 ORDER BY id ASC;"),
            title,
        )
    }

    fn list_posts_by_author(&self, author_id: EntityId) -> RepoResult<Vec<Post>> {
        self.query_posts(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE author_id = ?1 ORDER BY id ASC;"),
            author_id,
        )
    }
}

fn parse_post_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get("id")?,
        title: row.get("title")?,
        author_id: row.get("author_id")?,
    })
}
