use crate::error::{Result, ScanError};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_SINCE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Run settings, built once at startup and shared read-only by every stage.
#[derive(Debug, Clone)]
pub struct Config {
    /// Exact author name to keep; `None` keeps every commit.
    pub author: Option<String>,
    pub root: PathBuf,
    pub since: Duration,
    pub pull: bool,
    pub files: bool,
    pub messages: bool,
    pub workers: usize,
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            author: None,
            root: PathBuf::from("."),
            since: DEFAULT_SINCE,
            pull: false,
            files: false,
            messages: false,
            workers: DEFAULT_WORKERS,
            json: false,
        }
    }
}

impl Config {
    pub fn validate(self) -> Result<Self> {
        if self.workers == 0 {
            return Err(ScanError::InvalidConfig(
                "at least one worker is required".to_string(),
            ));
        }
        Ok(self)
    }

    /// Oldest commit time still inside the window, exclusive.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let window = chrono::Duration::from_std(self.since).map_err(|_| {
            ScanError::InvalidConfig(format!("since window too large: {:?}", self.since))
        })?;
        now.checked_sub_signed(window).ok_or_else(|| {
            ScanError::InvalidConfig(format!("since window too large: {:?}", self.since))
        })
    }

    pub fn author_matches(&self, name: &str) -> bool {
        self.author.as_deref().map_or(true, |a| a == name)
    }

    pub fn since_label(&self) -> String {
        humantime::format_duration(self.since).to_string()
    }
}
