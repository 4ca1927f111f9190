//! Database session lifecycle for one CLI run.
//!
//! # Invariants
//! - The optional reset runs before the workflow, on the same connection.
//! - The connection is handed to `close` exactly once, whatever failed before.
//! - A failed run maps to a non-zero exit status.

use anyhow::Context;
use blogstore_core::db::{reset_db, Connection, DbResult};
use blogstore_core::{
    run_workflow, Console, PostService, Scenario, SqlitePostRepository, SqliteUserRepository,
    UserService, WorkflowReport,
};
use log::error;
use std::io::Write;

pub const RESET_NOTICE: &str = "Resetting database...";

/// What one session does with its connection.
#[derive(Debug, Clone, Copy)]
pub struct SessionPlan {
    pub reset: bool,
    pub scenario: Scenario,
}

/// Runs the optional reset and the workflow, then closes the connection.
///
/// The first error wins; a close failure is only reported when the run
/// itself succeeded.
pub fn run_session<C>(
    mut conn: Connection,
    plan: SessionPlan,
    console: &mut Console<'_>,
    close: C,
) -> anyhow::Result<WorkflowReport>
where
    C: FnOnce(Connection) -> DbResult<()>,
{
    let outcome = reset_and_run(&mut conn, plan, console);
    let closed = close(conn).context("failed to close database");
    let report = outcome?;
    closed?;
    Ok(report)
}

fn reset_and_run(
    conn: &mut Connection,
    plan: SessionPlan,
    console: &mut Console<'_>,
) -> anyhow::Result<WorkflowReport> {
    if plan.reset {
        console.line(RESET_NOTICE)?;
        reset_db(conn).context("failed to reset database")?;
    }

    let conn: &Connection = conn;
    let users = UserService::new(SqliteUserRepository::try_new(conn)?);
    let posts = PostService::new(SqlitePostRepository::try_new(conn)?);

    run_workflow(plan.scenario, &users, &posts, console).context("workflow output failed")
}

/// Reports a failed run on `err` and returns the process exit status.
pub fn exit_status(outcome: &anyhow::Result<()>, err: &mut dyn Write) -> u8 {
    match outcome {
        Ok(()) => 0,
        Err(failure) => {
            error!("event=cli_run module=cli status=error error={failure:#}");
            // Nothing left to report to if stderr itself is gone.
            let _ = writeln!(err, "An unexpected error occurred in main: {failure:#}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{exit_status, run_session, SessionPlan, RESET_NOTICE};
    use blogstore_core::db::{close_db, open_db_in_memory, Connection};
    use blogstore_core::{
        Console, FailureKind, NewUser, Scenario, SqliteUserRepository, StepOutcome,
        UserRepository,
    };
    use std::cell::Cell;
    use std::io::{self, Write};

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "console closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn seeded_connection() -> Connection {
        let conn = open_db_in_memory().unwrap();
        {
            let repo = SqliteUserRepository::try_new(&conn).unwrap();
            repo.create_user(&NewUser::new("Kites", "i@kites.cc")).unwrap();
            repo.create_user(&NewUser::new("Kites2", "i2@kites.cc"))
                .unwrap();
        }
        conn
    }

    fn plan(reset: bool) -> SessionPlan {
        SessionPlan {
            reset,
            scenario: Scenario::Full,
        }
    }

    #[test]
    fn reset_runs_before_workflow_and_connection_is_closed() {
        let closed = Cell::new(false);
        let mut out = Vec::new();
        let mut err = Vec::new();

        let report = {
            let mut console = Console::new(&mut out, &mut err);
            run_session(seeded_connection(), plan(true), &mut console, |conn| {
                closed.set(true);
                close_db(conn)
            })
            .unwrap()
        };

        assert!(closed.get());
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with(RESET_NOTICE));
        assert!(out.contains(r#"Created user: {"id":1,"name":"Kites","email":"i@kites.cc"}"#));
        assert_eq!(
            report.outcome("create_user_1"),
            Some(StepOutcome::Succeeded)
        );
        assert_eq!(report.count(StepOutcome::Skipped), 0);
    }

    #[test]
    fn without_reset_existing_rows_are_kept() {
        let closed = Cell::new(false);
        let mut out = Vec::new();
        let mut err = Vec::new();

        let report = {
            let mut console = Console::new(&mut out, &mut err);
            run_session(seeded_connection(), plan(false), &mut console, |conn| {
                closed.set(true);
                close_db(conn)
            })
            .unwrap()
        };

        assert!(closed.get());
        assert!(!String::from_utf8(out).unwrap().contains(RESET_NOTICE));
        assert_eq!(
            report.outcome("create_user_1"),
            Some(StepOutcome::Failed(FailureKind::DuplicateEmail))
        );
    }

    #[test]
    fn failed_reset_skips_workflow_and_still_closes() {
        let conn = seeded_connection();
        conn.execute_batch(
            "DROP INDEX idx_posts_title;
             CREATE TABLE idx_posts_title (id INTEGER);",
        )
        .unwrap();
        let closed = Cell::new(false);
        let mut out = Vec::new();
        let mut err = Vec::new();

        let result = {
            let mut console = Console::new(&mut out, &mut err);
            run_session(conn, plan(true), &mut console, |conn| {
                closed.set(true);
                close_db(conn)
            })
        };

        let failure = result.unwrap_err();
        assert!(closed.get());
        assert!(failure.to_string().contains("failed to reset database"));
        assert!(!String::from_utf8(out).unwrap().contains("=== Users ==="));
    }

    #[test]
    fn console_failure_still_closes_and_exits_non_zero() {
        let closed = Cell::new(false);
        let mut out = BrokenPipe;
        let mut err = Vec::new();

        let result = {
            let mut console = Console::new(&mut out, &mut err);
            run_session(seeded_connection(), plan(false), &mut console, |conn| {
                closed.set(true);
                close_db(conn)
            })
        };
        assert!(closed.get());

        let mut stderr = Vec::new();
        let status = exit_status(&result.map(|_| ()), &mut stderr);
        assert_eq!(status, 1);
        assert!(String::from_utf8(stderr)
            .unwrap()
            .starts_with("An unexpected error occurred in main: workflow output failed"));
    }

    #[test]
    fn successful_run_exits_zero_silently() {
        let mut stderr = Vec::new();
        assert_eq!(exit_status(&Ok(()), &mut stderr), 0);
        assert!(stderr.is_empty());
    }
}
