//! Post record and write inputs.
//!
//! # Invariants
//! - `author_id` must reference an existing user when the post is written.
//! - Titles are not unique; several posts may share one.

use super::{EntityId, EntityKind, ValidationError};
use serde::{Deserialize, Serialize};

/// Persisted post row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: EntityId,
    pub title: String,
    pub author_id: EntityId,
}

/// Input for creating a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub author_id: EntityId,
}

impl NewPost {
    pub fn new(title: impl Into<String>, author_id: EntityId) -> Self {
        Self {
            title: title.into(),
            author_id,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)
    }
}

/// Partial update for a post; `None` fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub author_id: Option<EntityId>,
}

impl PostUpdate {
    /// Update that only retitles the post.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.is_none() && self.author_id.is_none() {
            return Err(ValidationError::EmptyUpdate(EntityKind::Post));
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::BlankTitle);
    }
    Ok(())
}
