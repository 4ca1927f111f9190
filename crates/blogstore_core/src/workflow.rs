//! Demonstration workflow over the entity store facade.
//!
//! # Responsibility
//! - Run a fixed, sequential CRUD script against users and posts.
//! - Deliberately trigger both classified failure kinds.
//! - Print section banners, entities and diagnostics to a console.
//!
//! # Invariants
//! - Steps run strictly in order; each one completes before the next starts.
//! - A failed step never aborts the run; steps that need an id from a failed
//!   create are recorded as skipped instead.
//! - Only console output failures propagate out of `run_workflow`.

use crate::classify::FailureKind;
use crate::model::post::{NewPost, Post, PostUpdate};
use crate::model::user::{NewUser, User, UserUpdate};
use crate::model::EntityId;
use crate::repo::post_repo::PostRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::post_service::PostService;
use crate::service::user_service::UserService;
use crate::service::ServiceResult;
use log::{info, warn};
use serde::Serialize;
use std::io::{self, Write};
use thiserror::Error;

/// Author id that no seeded user can have.
pub const MISSING_AUTHOR_ID: EntityId = 9999;

const FIRST_USER: (&str, &str) = ("Kites", "i@kites.cc");
const SECOND_USER: (&str, &str) = ("Kites2", "i2@kites.cc");
const RENAMED_FIRST_USER: &str = "Kites_Updated";
const FIRST_POST_TITLE: &str = "A Post";
const SECOND_POST_TITLE: &str = "Second Post";
const EDITED_POST_TITLE: &str = "A Post (edited)";

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("failed to write workflow output: {0}")]
    Output(#[from] io::Error),
    #[error("failed to render {what}: {source}")]
    Render {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Which script to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scenario {
    /// Users only: create, duplicate, update, delete.
    Users,
    /// Users followed by posts, including searches on both.
    #[default]
    Full,
}

/// Output sinks for the transcript (`out`) and diagnostics (`err`).
pub struct Console<'a> {
    out: &'a mut dyn Write,
    err: &'a mut dyn Write,
}

impl<'a> Console<'a> {
    pub fn new(out: &'a mut dyn Write, err: &'a mut dyn Write) -> Self {
        Self { out, err }
    }

    /// Writes one transcript line outside a workflow run.
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed(FailureKind),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub name: &'static str,
    pub outcome: StepOutcome,
}

/// What happened during one workflow run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowReport {
    pub steps: Vec<StepRecord>,
    /// Users seen by the most recent successful user listing.
    pub last_users: Vec<User>,
    /// Posts seen by the most recent successful post listing.
    pub last_posts: Vec<Post>,
}

impl WorkflowReport {
    /// Outcome of the first step called `name`.
    pub fn outcome(&self, name: &str) -> Option<StepOutcome> {
        self.steps
            .iter()
            .find(|step| step.name == name)
            .map(|step| step.outcome)
    }

    pub fn count(&self, outcome: StepOutcome) -> usize {
        self.steps
            .iter()
            .filter(|step| step.outcome == outcome)
            .count()
    }
}

/// Runs `scenario` to completion and returns the per-step report.
pub fn run_workflow<U: UserRepository, P: PostRepository>(
    scenario: Scenario,
    users: &UserService<U>,
    posts: &PostService<P>,
    console: &mut Console<'_>,
) -> WorkflowResult<WorkflowReport> {
    info!("event=workflow_run module=workflow status=start scenario={scenario:?}");

    let mut driver = Driver {
        users,
        posts,
        console,
        report: WorkflowReport::default(),
    };

    let second_user = driver.run_users(scenario)?;
    if scenario == Scenario::Full {
        driver.run_posts(second_user.as_ref())?;
    }
    driver.summary()?;

    let report = driver.report;
    info!(
        "event=workflow_run module=workflow status=ok steps={} failed={} skipped={}",
        report.steps.len(),
        report.steps.len()
            - report.count(StepOutcome::Succeeded)
            - report.count(StepOutcome::Skipped),
        report.count(StepOutcome::Skipped)
    );
    Ok(report)
}

struct Driver<'a, 'c, U: UserRepository, P: PostRepository> {
    users: &'a UserService<U>,
    posts: &'a PostService<P>,
    console: &'a mut Console<'c>,
    report: WorkflowReport,
}

impl<U: UserRepository, P: PostRepository> Driver<'_, '_, U, P> {
    /// Runs the user section and hands back the second user for authoring posts.
    fn run_users(&mut self, scenario: Scenario) -> WorkflowResult<Option<User>> {
        let users = self.users;
        self.banner("Users")?;

        let first = self.record(
            "create_user_1",
            "Created user",
            users.create(&NewUser::new(FIRST_USER.0, FIRST_USER.1)),
        )?;
        let second = self.record(
            "create_user_2",
            "Created user",
            users.create(&NewUser::new(SECOND_USER.0, SECOND_USER.1)),
        )?;
        self.expect_failure(
            "create_duplicate_user",
            "Created user",
            FailureKind::DuplicateEmail,
            users.create(&NewUser::new(SECOND_USER.0, FIRST_USER.1)),
        )?;
        self.list_users("list_users")?;

        match &first {
            Some(user) => {
                self.record(
                    "update_user_1",
                    "Updated user",
                    users.update(user.id, &UserUpdate::name(RENAMED_FIRST_USER)),
                )?;
            }
            None => self.skip("update_user_1", "first user was not created")?,
        }
        self.list_users("list_users_after_update")?;

        if scenario == Scenario::Full {
            match &second {
                Some(user) => {
                    self.record(
                        "search_user_by_email",
                        "Found user",
                        users.search_by_email(&user.email),
                    )?;
                }
                None => self.skip("search_user_by_email", "second user was not created")?,
            }
        }

        match &first {
            Some(user) => {
                self.record("delete_user_1", "Deleted user", users.delete(user.id))?;
            }
            None => self.skip("delete_user_1", "first user was not created")?,
        }
        self.list_users("list_users_after_delete")?;

        Ok(second)
    }

    fn run_posts(&mut self, author: Option<&User>) -> WorkflowResult<()> {
        let posts = self.posts;
        self.banner("Posts")?;

        let (first, second) = match author {
            Some(author) => (
                self.record(
                    "create_post_1",
                    "Created post",
                    posts.create(&NewPost::new(FIRST_POST_TITLE, author.id)),
                )?,
                self.record(
                    "create_post_2",
                    "Created post",
                    posts.create(&NewPost::new(SECOND_POST_TITLE, author.id)),
                )?,
            ),
            None => {
                self.skip("create_post_1", "no author available")?;
                self.skip("create_post_2", "no author available")?;
                (None, None)
            }
        };
        self.expect_failure(
            "create_post_invalid_author",
            "Created post",
            FailureKind::InvalidAuthorReference,
            posts.create(&NewPost::new(FIRST_POST_TITLE, MISSING_AUTHOR_ID)),
        )?;
        self.list_posts("list_posts")?;

        self.record(
            "search_posts_by_title",
            "Found posts",
            posts.search_by_title(FIRST_POST_TITLE),
        )?;

        match &first {
            Some(post) => {
                self.record(
                    "update_post_1",
                    "Updated post",
                    posts.update(post.id, &PostUpdate::title(EDITED_POST_TITLE)),
                )?;
            }
            None => self.skip("update_post_1", "first post was not created")?,
        }
        self.list_posts("list_posts_after_update")?;

        match &second {
            Some(post) => {
                self.record("delete_post_2", "Deleted post", posts.delete(post.id))?;
            }
            None => self.skip("delete_post_2", "second post was not created")?,
        }
        self.list_posts("list_posts_after_delete")?;

        Ok(())
    }

    fn list_users(&mut self, step: &'static str) -> WorkflowResult<()> {
        let users = self.users;
        if let Some(users) = self.record(step, "All users", users.list())? {
            self.report.last_users = users;
        }
        Ok(())
    }

    fn list_posts(&mut self, step: &'static str) -> WorkflowResult<()> {
        let posts = self.posts;
        if let Some(posts) = self.record(step, "All posts", posts.list())? {
            self.report.last_posts = posts;
        }
        Ok(())
    }

    fn banner(&mut self, title: &str) -> WorkflowResult<()> {
        writeln!(self.console.out)?;
        writeln!(self.console.out, "=== {title} ===")?;
        Ok(())
    }

    /// Prints a successful value or the failure diagnostic, and records the step.
    fn record<T: Serialize>(
        &mut self,
        step: &'static str,
        label: &str,
        result: ServiceResult<T>,
    ) -> WorkflowResult<Option<T>> {
        match result {
            Ok(value) => {
                let rendered = serde_json::to_string(&value)
                    .map_err(|source| WorkflowError::Render { what: step, source })?;
                writeln!(self.console.out, "{label}: {rendered}")?;
                self.push(step, StepOutcome::Succeeded);
                Ok(Some(value))
            }
            Err(err) => {
                writeln!(self.console.err, "{}", err.diagnostic())?;
                self.push(step, StepOutcome::Failed(err.kind()));
                Ok(None)
            }
        }
    }

    /// Like `record`, but warns when the step does not fail as `expected`.
    fn expect_failure<T: Serialize>(
        &mut self,
        step: &'static str,
        label: &str,
        expected: FailureKind,
        result: ServiceResult<T>,
    ) -> WorkflowResult<()> {
        let actual = result.as_ref().err().map(|err| err.kind());
        if actual != Some(expected) {
            warn!(
                "event=workflow_step module=workflow status=unexpected step={} expected={} actual={}",
                step,
                expected,
                actual.map_or("success", FailureKind::as_str)
            );
        }
        self.record(step, label, result)?;
        Ok(())
    }

    fn skip(&mut self, step: &'static str, reason: &str) -> WorkflowResult<()> {
        writeln!(self.console.err, "Skipped {step}: {reason}")?;
        self.push(step, StepOutcome::Skipped);
        Ok(())
    }

    fn summary(&mut self) -> WorkflowResult<()> {
        let total = self.report.steps.len();
        let succeeded = self.report.count(StepOutcome::Succeeded);
        let skipped = self.report.count(StepOutcome::Skipped);
        self.banner("Summary")?;
        writeln!(
            self.console.out,
            "{total} steps: {succeeded} succeeded, {} failed, {skipped} skipped",
            total - succeeded - skipped
        )?;
        Ok(())
    }

    fn push(&mut self, name: &'static str, outcome: StepOutcome) {
        self.report.steps.push(StepRecord { name, outcome });
    }
}
