use crate::util::dedup;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const SCHEMA_VERSION: u32 = 1;

/// Per-file line statistics of a single commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub path: String,
    pub added_lines: u32,
    pub deleted_lines: u32,
}

impl FileStat {
    pub fn new(path: impl Into<String>, added_lines: u32, deleted_lines: u32) -> Self {
        Self {
            path: path.into(),
            added_lines,
            deleted_lines,
        }
    }

    pub fn changes(&self) -> u64 {
        self.added_lines as u64 + self.deleted_lines as u64
    }
}

/// A commit as yielded by a history walk, before its statistics are computed.
#[derive(Debug, Clone)]
pub struct LogEntry<Id> {
    pub id: Id,
    pub author_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    Updated,
    AlreadyUpToDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAggregate {
    pub path: String,
    pub changes: u64,
    pub authors: Vec<String>,
    pub messages: Vec<String>,
}

/// Running per-file totals while one repository's history is scanned.
#[derive(Debug, Default)]
pub struct FileAccum {
    changes: u64,
    authors: Vec<String>,
    messages: Vec<String>,
}

impl FileAccum {
    pub fn add(&mut self, stat: &FileStat, author: &str, message: &str) {
        self.changes += stat.changes();
        self.authors.push(author.to_string());
        self.messages.push(message.to_string());
    }

    pub fn finish(self, path: String) -> FileAggregate {
        FileAggregate {
            path,
            changes: self.changes,
            authors: dedup(self.authors),
            messages: dedup(self.messages),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryResult {
    pub path: PathBuf,
    pub changes: u64,
    pub authors: Vec<String>,
    pub files: Vec<FileAggregate>,
}

impl RepositoryResult {
    /// Builds a result whose totals are derived from `files`.
    pub fn from_files(path: PathBuf, files: Vec<FileAggregate>) -> Self {
        let changes = files.iter().map(|f| f.changes).sum();
        let authors = dedup(files.iter().flat_map(|f| f.authors.iter().cloned()));
        Self {
            path,
            changes,
            authors,
            files,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() || self.changes == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub root: PathBuf,
    pub since: String,
    pub author: Option<String>,
    pub total_changes: u64,
    pub repositories: Vec<RepositoryResult>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accum_dedups_in_first_seen_order() {
        let mut acc = FileAccum::default();
        acc.add(&FileStat::new("x.txt", 10, 2), "bob", "fix parser");
        acc.add(&FileStat::new("x.txt", 1, 1), "alice", "tidy");
        acc.add(&FileStat::new("x.txt", 0, 3), "bob", "fix parser");

        let agg = acc.finish("x.txt".into());
        assert_eq!(agg.changes, 17);
        assert_eq!(agg.authors, vec!["bob", "alice"]);
        assert_eq!(agg.messages, vec!["fix parser", "tidy"]);
    }

    #[test]
    fn result_totals_follow_files() {
        let files = vec![
            FileAggregate {
                path: "a".into(),
                changes: 5,
                authors: vec!["carol".into(), "dave".into()],
                messages: vec![],
            },
            FileAggregate {
                path: "b".into(),
                changes: 7,
                authors: vec!["dave".into(), "erin".into()],
                messages: vec![],
            },
        ];
        let result = RepositoryResult::from_files("repo".into(), files);
        assert_eq!(result.changes, 12);
        assert_eq!(result.authors, vec!["carol", "dave", "erin"]);
        assert!(!result.is_empty());
        assert!(RepositoryResult::from_files("empty".into(), vec![]).is_empty());
    }
}
