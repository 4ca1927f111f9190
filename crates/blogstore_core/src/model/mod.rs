//! Domain model for users and their posts.
//!
//! # Responsibility
//! - Define persisted record shapes and their create/update inputs.
//! - Validate inputs before they reach persistence.
//!
//! # Invariants
//! - Identifiers are assigned by the store and only known after a create.
//! - Every write input passes `validate()` before SQL runs.

use thiserror::Error;

pub mod post;
pub mod user;

/// Store-assigned row identifier shared by every entity kind.
pub type EntityId = i64;

/// Entity kinds known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Post,
}

impl EntityKind {
    /// Lowercase name used in log events and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Post => "post",
        }
    }
}

/// Input validation failure raised before any write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("email cannot be empty")]
    EmptyEmail,
    #[error("email `{0}` is not a valid address")]
    MalformedEmail(String),
    #[error("post title cannot be blank")]
    BlankTitle,
    #[error("update for {} does not change any field", .0.as_str())]
    EmptyUpdate(EntityKind),
}
