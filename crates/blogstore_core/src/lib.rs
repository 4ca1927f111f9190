//! Core domain logic for blogstore.
//! Users, posts, their SQLite persistence and the failure classification
//! that the demonstration workflow relies on.

pub mod classify;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod workflow;

pub use classify::{classify, ClassifiedError, FailureKind};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::post::{NewPost, Post, PostUpdate};
pub use model::user::{NewUser, User, UserUpdate};
pub use model::{EntityId, EntityKind, ValidationError};
pub use repo::post_repo::{PostRepository, SqlitePostRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{FailureCode, FailureMeta, RepoError, RepoResult};
pub use service::post_service::PostService;
pub use service::user_service::UserService;
pub use service::ServiceResult;
pub use workflow::{
    run_workflow, Console, Scenario, StepOutcome, StepRecord, WorkflowError, WorkflowReport,
    WorkflowResult, MISSING_AUTHOR_ID,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
