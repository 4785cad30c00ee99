use crate::config::Config;
use crate::error::{Result, ScanError};
use crate::git::{Credential, LogSource};
use crate::model::{FileAccum, FileAggregate, PullOutcome, RepositoryResult};
use crate::util::first_line;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Credential available to a run with pulls enabled, or why it could not be loaded.
pub type CredentialSlot = std::result::Result<Credential, String>;

#[derive(Debug)]
pub struct Reduction {
    pub result: RepositoryResult,
    /// Set when the pull failed and the local history was used as is.
    pub sync_failure: Option<ScanError>,
}

/// Reduces one repository's history since `cutoff` to per-file aggregates.
///
/// `credential` is `Some` when the repository should be pulled first. Pull
/// failures never fail the reduction; history and statistics failures do.
pub fn reduce<S: LogSource>(
    source: &S,
    path: &Path,
    config: &Config,
    cutoff: DateTime<Utc>,
    credential: Option<&CredentialSlot>,
) -> Result<Reduction> {
    let sync_failure = credential.and_then(|slot| synchronize(source, path, slot).err());

    let mut per_file: HashMap<String, FileAccum> = HashMap::new();
    let history = source.log(cutoff).map_err(|e| e.in_history(path))?;
    for entry in history {
        let entry = entry.map_err(|e| e.in_history(path))?;
        if entry.timestamp <= cutoff || !config.author_matches(&entry.author_name) {
            continue;
        }

        let stats = source.statistics(&entry).map_err(|e| e.in_history(path))?;
        let message = first_line(&entry.message);
        for stat in stats.iter().filter(|s| !s.path.is_empty()) {
            per_file
                .entry(stat.path.clone())
                .or_default()
                .add(stat, &entry.author_name, message);
        }
    }

    let mut files: Vec<FileAggregate> = per_file
        .into_iter()
        .map(|(file, acc)| acc.finish(file))
        .collect();
    files.sort_by(|a, b| b.changes.cmp(&a.changes).then_with(|| a.path.cmp(&b.path)));

    let result = RepositoryResult::from_files(path.to_path_buf(), files);
    debug!(
        repo = %path.display(),
        changes = result.changes,
        files = result.files.len(),
        "reduced history"
    );
    Ok(Reduction {
        result,
        sync_failure,
    })
}

fn synchronize<S: LogSource>(source: &S, path: &Path, slot: &CredentialSlot) -> Result<()> {
    let outcome = slot
        .as_ref()
        .map_err(|reason| ScanError::Credential(reason.clone()))
        .and_then(|credential| source.pull(credential));

    match outcome {
        Ok(PullOutcome::Updated) => {
            debug!(repo = %path.display(), "pulled");
            Ok(())
        }
        Ok(PullOutcome::AlreadyUpToDate) => Ok(()),
        Err(e) => Err(ScanError::Sync {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}
