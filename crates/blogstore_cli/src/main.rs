//! CLI entry point for the blogstore walkthrough.
//!
//! # Responsibility
//! - Load configuration, initialize logging and open the database once.
//! - Run the optional development reset, then the workflow.
//! - Release the connection on every exit path and map failures to the exit code.

mod config;
mod lifecycle;

use anyhow::Context;
use blogstore_core::db::{close_db, open_db, open_db_in_memory};
use blogstore_core::{core_version, init_logging, Console};
use clap::Parser;
use config::{load_env_file, CliConfig, DatabaseTarget};
use lifecycle::{exit_status, run_session, SessionPlan};
use log::info;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = load_env_file() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }
    let config = CliConfig::parse();

    if let Err(err) = init_logging(config.log_level(), config.log_dir.as_deref()) {
        eprintln!("failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    let outcome = run(&config);
    ExitCode::from(exit_status(&outcome, &mut io::stderr()))
}

fn run(config: &CliConfig) -> anyhow::Result<()> {
    let target = config.database_target()?;
    info!(
        "event=cli_run module=cli status=start core_version={} database={}",
        core_version(),
        target
    );

    let conn = match &target {
        DatabaseTarget::File(path) => open_db(path),
        DatabaseTarget::Memory => open_db_in_memory(),
    }
    .with_context(|| format!("failed to open database `{target}`"))?;

    let plan = SessionPlan {
        reset: config.reset_requested(),
        scenario: config.scenario.into(),
    };

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    let mut console = Console::new(&mut out, &mut err);

    let report = run_session(conn, plan, &mut console, close_db)?;
    info!(
        "event=cli_run module=cli status=ok steps={} users={} posts={}",
        report.steps.len(),
        report.last_users.len(),
        report.last_posts.len()
    );
    Ok(())
}
