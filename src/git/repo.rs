use super::{Backend, Credential, History, LogSource};
use crate::error::{Result, ScanError};
use crate::model::{FileStat, LogEntry, PullOutcome};
use chrono::{DateTime, Utc};
use gix::object::tree::diff::ChangeDetached;
use gix::{ObjectId, Repository, ThreadSafeRepository};
use similar::{ChangeTag, TextDiff};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Opens repositories with gix.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitBackend;

pub struct GitHandle {
    repo: ThreadSafeRepository,
    path: PathBuf,
}

impl Backend for GitBackend {
    type Handle = GitHandle;
    type Source = GitRepo;

    fn open(&self, path: &Path) -> Result<GitHandle> {
        match gix::open(path) {
            Ok(repo) => Ok(GitHandle {
                repo: repo.into_sync(),
                path: path.to_path_buf(),
            }),
            Err(gix::open::Error::NotARepository { .. }) => Err(ScanError::NotARepository {
                path: path.to_path_buf(),
            }),
            Err(err) => Err(ScanError::Open {
                path: path.to_path_buf(),
                source: Box::new(err),
            }),
        }
    }

    fn attach(&self, handle: GitHandle) -> GitRepo {
        GitRepo {
            repo: handle.repo.to_thread_local(),
            path: handle.path,
        }
    }
}

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open the repository rooted exactly at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let backend = GitBackend;
        let handle = backend.open(path.as_ref())?;
        Ok(backend.attach(handle))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_stats(&self, commit_id: ObjectId) -> Result<Vec<FileStat>> {
        let commit = self.repo.find_commit(commit_id)?;
        let commit_tree = commit.tree()?;
        let parent_tree = match commit.parent_ids().next() {
            Some(parent_id) => Some(self.repo.find_commit(parent_id)?.tree()?),
            None => None,
        };

        let changes: Vec<ChangeDetached> =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), None)?;

        let mut files = Vec::new();
        for change in changes {
            if let Some(stat) = self.handle_change(change)? {
                files.push(stat);
            }
        }
        Ok(files)
    }

    /// Line counts for one changed entry. Trees and submodule commits are
    /// not files and yield `None`.
    fn handle_change(&self, change: ChangeDetached) -> Result<Option<FileStat>> {
        let stat = match change {
            ChangeDetached::Addition {
                entry_mode,
                id,
                location,
                ..
            } => {
                if !entry_mode.is_blob_or_symlink() {
                    return Ok(None);
                }
                let obj = self.repo.find_object(id)?;
                FileStat::new(location.to_string(), count_lines(&obj), 0)
            }
            ChangeDetached::Deletion {
                entry_mode,
                id,
                location,
                ..
            } => {
                if !entry_mode.is_blob_or_symlink() {
                    return Ok(None);
                }
                let obj = self.repo.find_object(id)?;
                FileStat::new(location.to_string(), 0, count_lines(&obj))
            }
            ChangeDetached::Modification {
                previous_entry_mode,
                previous_id,
                entry_mode,
                id,
                location,
            } => {
                let path = location.to_string();
                match (
                    previous_entry_mode.is_blob_or_symlink(),
                    entry_mode.is_blob_or_symlink(),
                ) {
                    (true, true) => {
                        let old_obj = self.repo.find_object(previous_id)?;
                        let new_obj = self.repo.find_object(id)?;
                        let (added, deleted) = line_delta(&old_obj, &new_obj);
                        FileStat::new(path, added, deleted)
                    }
                    // A submodule replaced by a file, or the other way round.
                    (false, true) => {
                        let new_obj = self.repo.find_object(id)?;
                        FileStat::new(path, count_lines(&new_obj), 0)
                    }
                    (true, false) => {
                        let old_obj = self.repo.find_object(previous_id)?;
                        FileStat::new(path, 0, count_lines(&old_obj))
                    }
                    (false, false) => return Ok(None),
                }
            }
            // Renames and copies count the content delta against the source blob;
            // a pure rename contributes nothing.
            ChangeDetached::Rewrite {
                source_entry_mode,
                source_id,
                entry_mode,
                id,
                location,
                ..
            } => {
                if !(source_entry_mode.is_blob_or_symlink() && entry_mode.is_blob_or_symlink()) {
                    return Ok(None);
                }
                let old_obj = self.repo.find_object(source_id)?;
                let new_obj = self.repo.find_object(id)?;
                let (added, deleted) = line_delta(&old_obj, &new_obj);
                FileStat::new(location.to_string(), added, deleted)
            }
        };
        Ok(Some(stat))
    }
}

impl LogSource for GitRepo {
    type CommitId = ObjectId;

    fn log(&self, since: DateTime<Utc>) -> Result<History<'_, ObjectId>> {
        let mut head = self.repo.head()?;
        if head.is_unborn() {
            return Ok(Box::new(std::iter::empty()));
        }
        let head_commit = head.peel_to_commit_in_place()?;

        Ok(Box::new(Walk {
            repo: &self.repo,
            since,
            seen: HashSet::new(),
            stack: vec![head_commit.id],
        }))
    }

    fn statistics(&self, entry: &LogEntry<ObjectId>) -> Result<Vec<FileStat>> {
        self.file_stats(entry.id).map_err(|e| ScanError::Statistics {
            path: self.path.clone(),
            commit: entry.id.to_string(),
            message: e.to_string(),
        })
    }

    fn pull(&self, credential: &Credential) -> Result<PullOutcome> {
        let workdir = self.repo.workdir().ok_or_else(|| ScanError::Sync {
            path: self.path.clone(),
            message: "bare repository has no worktree".to_string(),
        })?;
        super::pull::pull(workdir, credential)
    }
}

/// Depth-first walk over every commit reachable from `HEAD`, yielding those
/// newer than `since`. Older commits are still traversed since commit times
/// are not monotonic along parent links.
struct Walk<'r> {
    repo: &'r Repository,
    since: DateTime<Utc>,
    seen: HashSet<ObjectId>,
    stack: Vec<ObjectId>,
}

impl Walk<'_> {
    fn visit(&mut self, commit_id: ObjectId) -> Result<Option<LogEntry<ObjectId>>> {
        let commit = self.repo.find_commit(commit_id)?;
        let secs = commit.time()?.seconds;
        let timestamp = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| ScanError::Git(format!("Invalid timestamp: {secs}")))?;

        let parents: Vec<ObjectId> = commit.parent_ids().map(|id| id.into()).collect();
        self.stack.extend(parents.into_iter().rev());

        if timestamp <= self.since {
            return Ok(None);
        }

        let author = commit.author()?;
        let message = commit.message()?;
        Ok(Some(LogEntry {
            id: commit_id,
            author_name: author.name.to_string(),
            message: message.title.to_string(),
            timestamp,
        }))
    }
}

impl Iterator for Walk<'_> {
    type Item = Result<LogEntry<ObjectId>>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(commit_id) = self.stack.pop() {
            if !self.seen.insert(commit_id) {
                continue;
            }
            match self.visit(commit_id) {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => continue,
                Err(e) => {
                    self.stack.clear();
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

fn is_binary(object: &gix::Object) -> bool {
    object.data.as_slice().iter().take(8192).any(|&b| b == 0)
}

fn count_lines(object: &gix::Object) -> u32 {
    if is_binary(object) {
        return 0;
    }
    String::from_utf8_lossy(object.data.as_slice()).lines().count() as u32
}

fn line_delta(old_object: &gix::Object, new_object: &gix::Object) -> (u32, u32) {
    if is_binary(old_object) || is_binary(new_object) {
        return (0, 0);
    }
    let old_text = String::from_utf8_lossy(old_object.data.as_slice());
    let new_text = String::from_utf8_lossy(new_object.data.as_slice());
    count_line_changes(&old_text, &new_text)
}

fn count_line_changes(old_text: &str, new_text: &str) -> (u32, u32) {
    let diff = TextDiff::from_lines(old_text, new_text);
    let (mut added, mut deleted) = (0u32, 0u32);
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => deleted += 1,
            ChangeTag::Equal => {}
        }
    }
    (added, deleted)
}
