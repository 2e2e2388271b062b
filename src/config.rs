use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::TimeDelta;
use serde::Deserialize;

/// Upper bound for any configured period, ten years.
const MAX_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub timers: TimerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimerConfig {
    /// How often pending reminders are checked.
    pub reminder_interval_secs: u64,
    /// How often the deleted list is swept for expired tasks.
    pub retention_sweep_secs: u64,
    /// How long a deleted task stays restorable.
    pub retention_window_secs: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            reminder_interval_secs: 20,
            retention_sweep_secs: 5,
            retention_window_secs: 30,
        }
    }
}

fn seconds(secs: u64) -> TimeDelta {
    TimeDelta::seconds(secs.min(MAX_SECS) as i64)
}

impl TimerConfig {
    pub fn reminder_interval(&self) -> TimeDelta {
        seconds(self.reminder_interval_secs)
    }

    pub fn retention_sweep(&self) -> TimeDelta {
        seconds(self.retention_sweep_secs)
    }

    pub fn retention_window(&self) -> TimeDelta {
        seconds(self.retention_window_secs)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("reminder_interval_secs", self.reminder_interval_secs),
            ("retention_sweep_secs", self.retention_sweep_secs),
            ("retention_window_secs", self.retention_window_secs),
        ] {
            if value == 0 {
                bail!("timers.{name} must be greater than zero");
            }
            if value > MAX_SECS {
                bail!("timers.{name} must be at most {MAX_SECS}");
            }
        }
        if self.retention_sweep_secs > self.retention_window_secs {
            bail!(
                "timers.retention_sweep_secs ({}) must not exceed timers.retention_window_secs ({})",
                self.retention_sweep_secs,
                self.retention_window_secs
            );
        }
        Ok(())
    }
}

impl Config {
    /// Load config from `path`.
    /// Returns default config if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        config
            .timers
            .validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }
}
