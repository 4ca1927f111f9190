//! Persistence failure classification.
//!
//! # Responsibility
//! - Map a structured `RepoError` onto the small set of failure kinds the
//!   callers react to.
//! - Render one human diagnostic per classified failure.
//!
//! # Invariants
//! - Classification never panics; missing metadata yields `Unclassified`.
//! - The raw repository error is always kept as the error source.

use crate::repo::{FailureCode, FailureMeta, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

const EMAIL_FIELD: &str = "email";
const AUTHOR_FIELD: &str = "author_id";

/// Recognized failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Unique constraint on the user email was violated.
    DuplicateEmail,
    /// Post author does not reference an existing user.
    InvalidAuthorReference,
    /// Anything else; the raw failure is surfaced unchanged.
    Unclassified,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateEmail => "duplicate_email",
            Self::InvalidAuthorReference => "invalid_author_reference",
            Self::Unclassified => "unclassified",
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Determines the failure kind of a repository error.
///
/// Rules apply in priority order:
/// 1. unique constraint whose target includes `email` -> `DuplicateEmail`
/// 2. foreign key whose field name includes `author_id` -> `InvalidAuthorReference`
/// 3. otherwise -> `Unclassified`
pub fn classify(error: &RepoError) -> FailureKind {
    match error.code() {
        FailureCode::UniqueConstraint if unique_target_contains(error.meta(), EMAIL_FIELD) => {
            FailureKind::DuplicateEmail
        }
        FailureCode::ForeignKeyConstraint
            if foreign_key_field_contains(error.meta(), AUTHOR_FIELD) =>
        {
            FailureKind::InvalidAuthorReference
        }
        _ => FailureKind::Unclassified,
    }
}

fn unique_target_contains(meta: Option<&FailureMeta>, field: &str) -> bool {
    meta.and_then(|meta| meta.target.as_ref())
        .is_some_and(|target| target.iter().any(|column| column == field))
}

fn foreign_key_field_contains(meta: Option<&FailureMeta>, field: &str) -> bool {
    meta.and_then(|meta| meta.field_name.as_deref())
        .is_some_and(|name| name.contains(field))
}

/// Repository failure paired with its classification.
#[derive(Debug)]
pub struct ClassifiedError {
    kind: FailureKind,
    source: RepoError,
}

impl Display for ClassifiedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.diagnostic())
    }
}

impl Error for ClassifiedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl ClassifiedError {
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn code(&self) -> FailureCode {
        self.source.code()
    }

    pub fn repo_error(&self) -> &RepoError {
        &self.source
    }

    /// Human-readable console line for this failure.
    pub fn diagnostic(&self) -> String {
        match self.kind {
            FailureKind::DuplicateEmail => "Error: Email already in use by another user.".to_string(),
            FailureKind::InvalidAuthorReference => {
                "Error: Author does not reference an existing user.".to_string()
            }
            FailureKind::Unclassified => format!("An error occurred: {}", self.source),
        }
    }
}

impl From<RepoError> for ClassifiedError {
    fn from(source: RepoError) -> Self {
        Self {
            kind: classify(&source),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, ClassifiedError, FailureKind};
    use crate::model::{EntityKind, ValidationError};
    use crate::repo::{FailureCode, FailureMeta, RepoError};

    fn constraint(code: FailureCode, meta: Option<FailureMeta>) -> RepoError {
        RepoError::Constraint {
            code,
            meta,
            message: "constraint failed".to_string(),
        }
    }

    fn target(columns: &[&str]) -> Option<FailureMeta> {
        Some(FailureMeta {
            target: Some(columns.iter().map(|c| c.to_string()).collect()),
            field_name: None,
        })
    }

    fn field(name: &str) -> Option<FailureMeta> {
        Some(FailureMeta {
            target: None,
            field_name: Some(name.to_string()),
        })
    }

    #[test]
    fn unique_on_email_is_duplicate_email() {
        let err = constraint(FailureCode::UniqueConstraint, target(&["email"]));
        assert_eq!(classify(&err), FailureKind::DuplicateEmail);
    }

    #[test]
    fn unique_on_composite_target_with_email_is_duplicate_email() {
        let err = constraint(FailureCode::UniqueConstraint, target(&["tenant", "email"]));
        assert_eq!(classify(&err), FailureKind::DuplicateEmail);
    }

    #[test]
    fn unique_on_other_field_is_unclassified() {
        let err = constraint(FailureCode::UniqueConstraint, target(&["name"]));
        assert_eq!(classify(&err), FailureKind::Unclassified);
    }

    #[test]
    fn foreign_key_on_author_is_invalid_author_reference() {
        let err = constraint(FailureCode::ForeignKeyConstraint, field("author_id"));
        assert_eq!(classify(&err), FailureKind::InvalidAuthorReference);
    }

    #[test]
    fn foreign_key_field_name_match_is_substring_based() {
        let err = constraint(
            FailureCode::ForeignKeyConstraint,
            field("posts_author_id_fkey (index)"),
        );
        assert_eq!(classify(&err), FailureKind::InvalidAuthorReference);
    }

    #[test]
    fn missing_metadata_never_panics_and_is_unclassified() {
        let unique = constraint(FailureCode::UniqueConstraint, None);
        let foreign_key = constraint(FailureCode::ForeignKeyConstraint, None);
        let empty_meta = constraint(FailureCode::UniqueConstraint, Some(FailureMeta::default()));

        assert_eq!(classify(&unique), FailureKind::Unclassified);
        assert_eq!(classify(&foreign_key), FailureKind::Unclassified);
        assert_eq!(classify(&empty_meta), FailureKind::Unclassified);
    }

    #[test]
    fn metadata_on_the_wrong_code_does_not_cross_rules() {
        let err = constraint(FailureCode::ForeignKeyConstraint, target(&["email"]));
        assert_eq!(classify(&err), FailureKind::Unclassified);
    }

    #[test]
    fn not_found_and_validation_are_unclassified() {
        let not_found = RepoError::NotFound {
            entity: EntityKind::User,
            id: 7,
        };
        let invalid = RepoError::Validation(ValidationError::BlankTitle);

        assert_eq!(classify(&not_found), FailureKind::Unclassified);
        assert_eq!(classify(&invalid), FailureKind::Unclassified);
    }

    #[test]
    fn unclassified_diagnostic_surfaces_raw_error() {
        let classified = ClassifiedError::from(RepoError::NotFound {
            entity: EntityKind::Post,
            id: 42,
        });

        assert_eq!(classified.kind(), FailureKind::Unclassified);
        assert_eq!(classified.diagnostic(), "An error occurred: post not found: 42");
        assert_eq!(classified.to_string(), classified.diagnostic());
    }

    #[test]
    fn duplicate_email_diagnostic_is_stable() {
        let classified = ClassifiedError::from(constraint(
            FailureCode::UniqueConstraint,
            target(&["email"]),
        ));
        assert_eq!(
            classified.diagnostic(),
            "Error: Email already in use by another user."
        );
        assert_eq!(classified.code(), FailureCode::UniqueConstraint);
    }
}
