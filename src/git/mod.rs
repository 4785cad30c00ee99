//! Boundary to the version-control layer.
//!
//! The pipeline only sees repositories through [`Backend`] and [`LogSource`];
//! [`GitBackend`] is the gix-backed implementation used by the binary.

pub mod credential;
pub mod pull;
pub mod repo;

pub use credential::Credential;
pub use repo::{GitBackend, GitRepo};

use crate::error::Result;
use crate::model::{FileStat, LogEntry, PullOutcome};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Opens repository roots during discovery.
pub trait Backend: Sync {
    /// Handle handed from the discoverer to exactly one worker.
    type Handle: Send;
    type Source: LogSource;

    /// Opens `path` as a repository root. A directory that is not one yields
    /// [`ScanError::NotARepository`](crate::error::ScanError::NotARepository).
    fn open(&self, path: &Path) -> Result<Self::Handle>;

    /// Turns a handle into a source owned by the calling worker.
    fn attach(&self, handle: Self::Handle) -> Self::Source;
}

pub type History<'a, Id> = Box<dyn Iterator<Item = Result<LogEntry<Id>>> + 'a>;

pub trait LogSource {
    type CommitId;

    /// Commits strictly newer than `since`, lazily.
    fn log(&self, since: DateTime<Utc>) -> Result<History<'_, Self::CommitId>>;

    fn statistics(&self, entry: &LogEntry<Self::CommitId>) -> Result<Vec<FileStat>>;

    fn pull(&self, credential: &Credential) -> Result<PullOutcome>;
}
