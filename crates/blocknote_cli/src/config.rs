//! Process configuration for the CLI.
//!
//! # Responsibility
//! - Resolve database path, log level and log directory from flags or
//!   `BLOCKNOTE_*` environment variables.
//! - Bring up core logging before any command runs.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE_NAME: &str = "blocknote.sqlite3";

/// Settings shared by every subcommand.
#[derive(Debug, Args)]
pub struct Settings {
    /// SQLite database file
    #[arg(long, global = true, env = "BLOCKNOTE_DB")]
    pub db: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "BLOCKNOTE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "BLOCKNOTE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Acting user identity
    #[arg(long = "as", global = true, env = "BLOCKNOTE_USER", default_value = "local")]
    pub actor: String,
}

impl Settings {
    pub fn db_path(&self) -> &Path {
        self.db
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_DB_FILE_NAME))
    }

    pub fn log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or_else(|| blocknote_core::default_log_level())
    }

    /// Starts file logging when a log directory is configured.
    pub fn init_logging(&self) -> Result<()> {
        let Some(log_dir) = self.log_dir.as_deref() else {
            return Ok(());
        };
        let log_dir = log_dir
            .to_str()
            .context("log directory must be valid UTF-8")?;
        blocknote_core::init_logging(self.log_level(), log_dir).map_err(|err| anyhow!(err))
    }
}
