use super::Credential;
use crate::error::{Result, ScanError};
use crate::model::PullOutcome;
use std::path::Path;
use std::process::Command;

/// Fast-forwards the worktree at `workdir` from its upstream using the `git` executable.
pub fn pull(workdir: &Path, credential: &Credential) -> Result<PullOutcome> {
    let output = Command::new("git")
        .args(["pull", "--ff-only"])
        .current_dir(workdir)
        .env("GIT_SSH_COMMAND", credential.ssh_command())
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("LC_ALL", "C")
        .output()
        .map_err(|e| ScanError::Sync {
            path: workdir.to_path_buf(),
            message: format!("failed to run git: {e}"),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ScanError::Sync {
            path: workdir.to_path_buf(),
            message: stderr.trim().to_string(),
        });
    }

    Ok(parse_outcome(&stdout))
}

fn parse_outcome(stdout: &str) -> PullOutcome {
    let up_to_date = stdout
        .lines()
        .any(|l| l.trim_start().starts_with("Already up to date") || l.contains("Already up-to-date"));
    if up_to_date {
        PullOutcome::AlreadyUpToDate
    } else {
        PullOutcome::Updated
    }
}
