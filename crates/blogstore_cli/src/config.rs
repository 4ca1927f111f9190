//! Command-line and environment configuration.
//!
//! # Responsibility
//! - Parse flags with environment fallbacks (`DATABASE_URL`, `APP_ENV`, ...).
//! - Decide whether the development reset runs.
//! - Resolve the database URL into a file path or in-memory target.

use anyhow::bail;
use blogstore_core::{default_log_level, Scenario};
use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

const DEVELOPMENT_ENV: &str = "development";
const MEMORY_DATABASE: &str = ":memory:";
const URL_SCHEMES: &[&str] = &["sqlite://", "sqlite:", "file:"];

#[derive(Debug, Parser)]
#[command(name = "blogstore")]
#[command(about = "Run the users/posts CRUD walkthrough against SQLite")]
#[command(version)]
pub struct CliConfig {
    /// SQLite database URL: `file:./dev.db`, a plain path, or `:memory:`
    #[arg(long, env = "DATABASE_URL", default_value = "file:./blogstore.db")]
    pub database_url: String,

    /// Deployment environment; `development` resets the database first
    #[arg(long, env = "APP_ENV")]
    pub app_env: Option<String>,

    /// Reset the database before running, whatever the environment
    #[arg(long)]
    pub reset: bool,

    /// Which walkthrough to run
    #[arg(long, value_enum, default_value_t = ScenarioArg::Full)]
    pub scenario: ScenarioArg,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "BLOGSTORE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logs go to stderr when unset
    #[arg(long, env = "BLOGSTORE_LOG_DIR")]
    pub log_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioArg {
    /// Users only
    Users,
    /// Users and posts
    Full,
}

impl From<ScenarioArg> for Scenario {
    fn from(value: ScenarioArg) -> Self {
        match value {
            ScenarioArg::Users => Self::Users,
            ScenarioArg::Full => Self::Full,
        }
    }
}

impl CliConfig {
    /// True when `--reset` is given or `APP_ENV=development`.
    pub fn reset_requested(&self) -> bool {
        self.reset || self.app_env.as_deref().map(str::trim) == Some(DEVELOPMENT_ENV)
    }

    pub fn database_target(&self) -> anyhow::Result<DatabaseTarget> {
        parse_database_url(&self.database_url)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }
}

/// Loads `.env` from the working directory or its parents.
///
/// A missing file is normal outside development; a malformed one is an error.
pub fn load_env_file() -> anyhow::Result<Option<PathBuf>> {
    accept_env_file(dotenvy::dotenv())
}

fn accept_env_file(result: Result<PathBuf, dotenvy::Error>) -> anyhow::Result<Option<PathBuf>> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(dotenvy::Error::Io(err)) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context("failed to load .env file")),
    }
}

/// Resolved storage location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    File(PathBuf),
    Memory,
}

impl Display for DatabaseTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => f.write_str(MEMORY_DATABASE),
        }
    }
}

/// Accepts `file:` and `sqlite:` URLs as well as bare paths.
pub fn parse_database_url(url: &str) -> anyhow::Result<DatabaseTarget> {
    let trimmed = url.trim();
    let without_scheme = URL_SCHEMES
        .iter()
        .find_map(|scheme| trimmed.strip_prefix(scheme))
        .unwrap_or(trimmed);
    let location = without_scheme
        .split_once('?')
        .map_or(without_scheme, |(path, _query)| path);

    if location.is_empty() {
        bail!("database url `{url}` does not name a database");
    }
    if location == MEMORY_DATABASE {
        return Ok(DatabaseTarget::Memory);
    }
    Ok(DatabaseTarget::File(PathBuf::from(location)))
}

#[cfg(test)]
mod tests {
    use super::{accept_env_file, parse_database_url, CliConfig, DatabaseTarget, ScenarioArg};
    use blogstore_core::{default_log_level, Scenario};
    use clap::Parser;
    use std::io;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["blogstore", "--database-url", ":memory:"];
        argv.extend_from_slice(args);
        CliConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn parses_file_scheme_url() {
        assert_eq!(
            parse_database_url("file:./dev.db").unwrap(),
            DatabaseTarget::File(PathBuf::from("./dev.db"))
        );
    }

    #[test]
    fn parses_sqlx_style_url_and_drops_query() {
        assert_eq!(
            parse_database_url("sqlite://data/app.db?mode=rwc").unwrap(),
            DatabaseTarget::File(PathBuf::from("data/app.db"))
        );
    }

    #[test]
    fn parses_bare_path_and_memory() {
        assert_eq!(
            parse_database_url("/tmp/blog.db").unwrap(),
            DatabaseTarget::File(PathBuf::from("/tmp/blog.db"))
        );
        assert_eq!(
            parse_database_url("sqlite::memory:").unwrap(),
            DatabaseTarget::Memory
        );
    }

    #[test]
    fn rejects_url_without_location() {
        assert!(parse_database_url("file:").is_err());
        assert!(parse_database_url("   ").is_err());
    }

    #[test]
    fn reset_follows_flag_or_development_env() {
        assert!(parse(&["--reset"]).reset_requested());
        assert!(parse(&["--app-env", "development"]).reset_requested());
        assert!(!parse(&["--app-env", "production"]).reset_requested());
    }

    #[test]
    fn missing_env_file_is_tolerated() {
        let missing = dotenvy::Error::Io(io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(accept_env_file(Err(missing)).unwrap(), None);

        let found = PathBuf::from("/srv/blogstore/.env");
        assert_eq!(accept_env_file(Ok(found.clone())).unwrap(), Some(found));
    }

    #[test]
    fn malformed_or_unreadable_env_file_is_reported() {
        let malformed = dotenvy::Error::LineParse("DATABASE_URL file:./dev.db".to_string(), 12);
        let err = accept_env_file(Err(malformed)).unwrap_err();
        assert!(err.to_string().contains(".env"));

        let denied = dotenvy::Error::Io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(accept_env_file(Err(denied)).is_err());
    }

    #[test]
    fn explicit_log_level_wins_over_build_default() {
        assert_eq!(parse(&["--log-level", "warn"]).log_level(), "warn");

        let config = CliConfig {
            log_level: None,
            ..parse(&[])
        };
        assert_eq!(config.log_level(), default_log_level());
    }

    #[test]
    fn scenario_defaults_to_full_and_accepts_users() {
        assert_eq!(parse(&[]).scenario, ScenarioArg::Full);
        let users = parse(&["--scenario", "users"]);
        assert_eq!(Scenario::from(users.scenario), Scenario::Users);
    }
}
