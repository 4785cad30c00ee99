#![allow(dead_code)]

use chrono::{DateTime, Utc};
use gitpulse::error::{Result, ScanError};
use gitpulse::git::{Backend, Credential, History, LogSource};
use gitpulse::model::{FileStat, LogEntry, PullOutcome};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MemCommit {
    pub author: String,
    pub message: String,
    pub at: DateTime<Utc>,
    pub stats: Vec<FileStat>,
}

impl MemCommit {
    pub fn new(author: &str, message: &str, at: DateTime<Utc>, stats: &[(&str, u32, u32)]) -> Self {
        Self {
            author: author.to_string(),
            message: message.to_string(),
            at,
            stats: stats
                .iter()
                .map(|(path, added, deleted)| FileStat::new(*path, *added, *deleted))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemRepo {
    pub commits: Vec<MemCommit>,
    pub pull_fails: bool,
    pub history_fails: bool,
}

impl LogSource for MemRepo {
    type CommitId = usize;

    fn log(&self, since: DateTime<Utc>) -> Result<History<'_, usize>> {
        if self.history_fails {
            return Err(ScanError::Git("reference HEAD points to a missing object".into()));
        }
        Ok(Box::new(
            self.commits
                .iter()
                .enumerate()
                .filter(move |(_, c)| c.at > since)
                .map(|(id, c)| {
                    Ok(LogEntry {
                        id,
                        author_name: c.author.clone(),
                        message: c.message.clone(),
                        timestamp: c.at,
                    })
                }),
        ))
    }

    fn statistics(&self, entry: &LogEntry<usize>) -> Result<Vec<FileStat>> {
        Ok(self.commits[entry.id].stats.clone())
    }

    fn pull(&self, _credential: &Credential) -> Result<PullOutcome> {
        if self.pull_fails {
            Err(ScanError::Git("could not read from remote repository".into()))
        } else {
            Ok(PullOutcome::AlreadyUpToDate)
        }
    }
}

/// Backend over a real directory tree whose repositories live in memory.
#[derive(Debug, Default)]
pub struct MemBackend {
    repos: HashMap<PathBuf, MemRepo>,
}

impl MemBackend {
    /// Registers `repo` at `root/rel` and creates the directory.
    pub fn add(&mut self, root: &Path, rel: &str, repo: MemRepo) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(&path).unwrap();
        self.repos.insert(path.clone(), repo);
        path
    }
}

impl Backend for MemBackend {
    type Handle = MemRepo;
    type Source = MemRepo;

    fn open(&self, path: &Path) -> Result<MemRepo> {
        self.repos
            .get(path)
            .cloned()
            .ok_or_else(|| ScanError::NotARepository {
                path: path.to_path_buf(),
            })
    }

    fn attach(&self, handle: MemRepo) -> MemRepo {
        handle
    }
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::days(days)
}

pub fn test_credential() -> Credential {
    Credential {
        private_key: PathBuf::from("/nonexistent/.ssh/id_rsa"),
    }
}
