//! Entity store facade over user/post repositories.
//!
//! # Responsibility
//! - Expose one operation per entity kind and verb.
//! - Log every outcome and classify every failure.
//!
//! # Invariants
//! - Each operation issues exactly one repository call.
//! - Failures leave the facade as `ClassifiedError`, never as panics.

use crate::classify::ClassifiedError;
use crate::repo::RepoResult;
use log::{info, warn};
use std::time::Instant;

pub mod post_service;
pub mod user_service;

pub type ServiceResult<T> = Result<T, ClassifiedError>;

/// Logs one facade outcome and classifies the failure branch.
fn finish<T>(
    event: &'static str,
    started_at: Instant,
    result: RepoResult<T>,
    describe: impl FnOnce(&T) -> String,
) -> ServiceResult<T> {
    match result {
        Ok(value) => {
            info!(
                "event={} module=service status=ok duration_ms={} {}",
                event,
                started_at.elapsed().as_millis(),
                describe(&value)
            );
            Ok(value)
        }
        Err(err) => {
            let classified = ClassifiedError::from(err);
            warn!(
                "event={} module=service status=error duration_ms={} error_code={} kind={} error={}",
                event,
                started_at.elapsed().as_millis(),
                classified.code().as_str(),
                classified.kind(),
                classified.repo_error()
            );
            Err(classified)
        }
    }
}
