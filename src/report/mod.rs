pub mod output;

pub use output::{write_json, write_table, TableOptions};

use crate::config::Config;
use crate::model::{FileAggregate, RepositoryResult, Report, SCHEMA_VERSION};
use crate::scan::Outcome;
use chrono::Utc;
use std::cmp::Ordering;

/// Ranks repositories with activity and drops the rest.
///
/// The ordering depends only on the results themselves, never on the order
/// they arrived in: change count descending, then path ascending.
pub fn build(outcome: Outcome, config: &Config) -> Report {
    let Outcome {
        results,
        mut warnings,
    } = outcome;

    let mut repositories: Vec<RepositoryResult> =
        results.into_iter().filter(|r| !r.is_empty()).collect();
    for repo in &mut repositories {
        repo.files.sort_by(rank_files);
    }
    repositories.sort_by(rank_repositories);
    warnings.sort();

    let total_changes = repositories.iter().map(|r| r.changes).sum();

    Report {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        root: config.root.clone(),
        since: config.since_label(),
        author: config.author.clone(),
        total_changes,
        repositories,
        warnings,
    }
}

fn rank_repositories(a: &RepositoryResult, b: &RepositoryResult) -> Ordering {
    b.changes.cmp(&a.changes).then_with(|| a.path.cmp(&b.path))
}

fn rank_files(a: &FileAggregate, b: &FileAggregate) -> Ordering {
    b.changes.cmp(&a.changes).then_with(|| a.path.cmp(&b.path))
}
