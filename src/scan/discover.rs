use crate::error::{Result, ScanError, Severity};
use crate::git::Backend;
use ignore::{Walk, WalkBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// One repository root and the handle used to read it.
pub struct RepositoryUnit<H> {
    pub path: PathBuf,
    pub handle: H,
}

/// Pre-order walk yielding every repository root under a directory.
///
/// Directories that open as a repository are yielded and never descended
/// into, so nested checkouts stay part of their parent. The first error
/// other than [`ScanError::NotARepository`] is yielded and ends the walk.
pub struct Discoverer<'b, B: Backend> {
    backend: &'b B,
    root: PathBuf,
    walk: Walk,
    found: Arc<RwLock<HashSet<PathBuf>>>,
    finished: bool,
}

impl<'b, B: Backend> Discoverer<'b, B> {
    pub fn new(backend: &'b B, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let found = Arc::new(RwLock::new(HashSet::new()));
        let pruned = Arc::clone(&found);

        let mut builder = WalkBuilder::new(&root);
        builder.standard_filters(false);
        builder.follow_links(false);
        builder.sort_by_file_name(|a, b| a.cmp(b));
        // Only directories, and nothing below a repository root.
        builder.filter_entry(move |entry| {
            entry.file_type().is_some_and(|t| t.is_dir())
                && !entry
                    .path()
                    .parent()
                    .is_some_and(|parent| contains(&pruned, parent))
        });

        Self {
            backend,
            root,
            walk: builder.build(),
            found,
            finished: false,
        }
    }

    fn fail(&mut self, err: ScanError) -> Result<RepositoryUnit<B::Handle>> {
        self.finished = true;
        Err(err)
    }
}

impl<B: Backend> Iterator for Discoverer<'_, B> {
    type Item = Result<RepositoryUnit<B::Handle>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let dir = match self.walk.next()? {
                Ok(entry) => entry.into_path(),
                Err(source) => {
                    let err = ScanError::Discovery {
                        path: self.root.clone(),
                        source,
                    };
                    return Some(self.fail(err));
                }
            };

            match self.backend.open(&dir) {
                Ok(handle) => {
                    if let Ok(mut found) = self.found.write() {
                        found.insert(dir.clone());
                    }
                    return Some(Ok(RepositoryUnit { path: dir, handle }));
                }
                Err(e) if e.severity() == Severity::Skip => continue,
                Err(e) => return Some(self.fail(e)),
            }
        }
    }
}

fn contains(found: &RwLock<HashSet<PathBuf>>, dir: &Path) -> bool {
    found.read().map(|set| set.contains(dir)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{Credential, History, LogSource};
    use crate::model::{FileStat, LogEntry, PullOutcome};
    use chrono::{DateTime, Utc};
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    /// Treats directories containing a `.repo` marker file as repository roots.
    struct MarkerBackend {
        broken: HashSet<PathBuf>,
    }

    struct NoHistory;

    impl LogSource for NoHistory {
        type CommitId = ();

        fn log(&self, _since: DateTime<Utc>) -> Result<History<'_, ()>> {
            Ok(Box::new(std::iter::empty()))
        }

        fn statistics(&self, _entry: &LogEntry<()>) -> Result<Vec<FileStat>> {
            Ok(Vec::new())
        }

        fn pull(&self, _credential: &Credential) -> Result<PullOutcome> {
            Ok(PullOutcome::AlreadyUpToDate)
        }
    }

    impl Backend for MarkerBackend {
        type Handle = ();
        type Source = NoHistory;

        fn open(&self, path: &Path) -> Result<()> {
            if self.broken.contains(path) {
                return Err(ScanError::Git("corrupt config".into()));
            }
            if path.join(".repo").is_file() {
                Ok(())
            } else {
                Err(ScanError::NotARepository {
                    path: path.to_path_buf(),
                })
            }
        }

        fn attach(&self, _handle: ()) -> NoHistory {
            NoHistory
        }
    }

    fn mark(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(".repo"), "").unwrap();
    }

    #[test]
    fn finds_roots_and_skips_nested() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        mark(&root.join("alpha"));
        mark(&root.join("alpha/vendor/inner"));
        mark(&root.join("group/beta"));
        fs::create_dir_all(root.join("group/empty")).unwrap();
        fs::write(root.join("group/notes.txt"), "").unwrap();

        let backend = MarkerBackend {
            broken: HashSet::new(),
        };
        let found: Vec<PathBuf> = Discoverer::new(&backend, root)
            .map(|u| u.unwrap().path)
            .collect();

        assert_eq!(found, vec![root.join("alpha"), root.join("group/beta")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_not_followed() {
        let tmp = tempdir().unwrap();
        let outside = tempdir().unwrap();
        mark(&outside.path().join("linked"));
        mark(&tmp.path().join("real"));
        std::os::unix::fs::symlink(outside.path(), tmp.path().join("link")).unwrap();

        let backend = MarkerBackend {
            broken: HashSet::new(),
        };
        let found: Vec<PathBuf> = Discoverer::new(&backend, tmp.path())
            .map(|u| u.unwrap().path)
            .collect();
        assert_eq!(found, vec![tmp.path().join("real")]);
    }

    #[test]
    fn root_itself_can_be_a_repository() {
        let tmp = tempdir().unwrap();
        mark(tmp.path());
        mark(&tmp.path().join("sub"));

        let backend = MarkerBackend {
            broken: HashSet::new(),
        };
        let found: Vec<PathBuf> = Discoverer::new(&backend, tmp.path())
            .map(|u| u.unwrap().path)
            .collect();
        assert_eq!(found, vec![tmp.path().to_path_buf()]);
    }

    #[test]
    fn open_failure_ends_the_walk() {
        let tmp = tempdir().unwrap();
        mark(&tmp.path().join("a"));
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        mark(&tmp.path().join("c"));

        let backend = MarkerBackend {
            broken: HashSet::from([tmp.path().join("b")]),
        };
        let items: Vec<_> = Discoverer::new(&backend, tmp.path()).collect();

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(ScanError::Git(_))));
    }

    #[test]
    fn missing_root_is_fatal() {
        let tmp = tempdir().unwrap();
        let backend = MarkerBackend {
            broken: HashSet::new(),
        };
        let mut walk = Discoverer::new(&backend, tmp.path().join("nope"));
        let err = walk.next().unwrap().err().unwrap();
        assert!(matches!(err, ScanError::Discovery { .. }));
        assert!(walk.next().is_none());
    }
}
