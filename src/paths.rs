//! Default locations for the database, config, and log files.
//!
//! Everything lives under `$HOME/.tada/` unless overridden by flags or env.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// The per-user data directory, `$HOME/.tada`.
pub fn data_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".tada"))
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("tada.db"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("config.toml"))
}

/// Log file that sits next to the database.
/// `/x/tada.db` → `/x/tada.log`, but `/x/tasks.log` → `/x/tasks.log.log`
/// so the log never lands in the database itself.
pub fn log_path_for(db_path: &Path) -> PathBuf {
    let log = db_path.with_extension("log");
    if log != db_path {
        return log;
    }
    let mut name = db_path.as_os_str().to_owned();
    name.push(".log");
    PathBuf::from(name)
}
