//! Discovery, reduction and collection of repositories as a bounded pipeline.
//!
//! One discovery thread feeds a pool of workers through a rendezvous channel;
//! workers hand their results to the collecting thread through a second one.
//! Neither channel buffers, so a busy pool stalls the directory walk.
//!
//! Shutdown after a fatal error travels through channel disconnection: the
//! collector drops its receiver, each worker stops once its send fails, the
//! work channel disconnects when the last worker leaves, and discovery stops
//! at its next send.

pub mod discover;
pub mod reduce;

pub use discover::{Discoverer, RepositoryUnit};
pub use reduce::{reduce, CredentialSlot, Reduction};

use crate::config::Config;
use crate::error::{Result, ScanError};
use crate::git::Backend;
use crate::model::RepositoryResult;
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use std::panic;
use std::path::Path;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::debug;

/// Everything collected from a completed run, in arrival order.
#[derive(Debug, Default)]
pub struct Outcome {
    pub results: Vec<RepositoryResult>,
    pub warnings: Vec<String>,
}

enum Event {
    Warning(ScanError),
    Finished(RepositoryResult),
    Failed(ScanError),
}

type WorkQueue<H> = Arc<Mutex<Receiver<RepositoryUnit<H>>>>;

/// Runs the whole pipeline over `config.root` and returns the unordered results.
///
/// `credential` is `Some` when repositories are pulled before their history is read.
pub fn run<B: Backend>(
    backend: &B,
    config: &Config,
    credential: Option<&CredentialSlot>,
    progress: &ProgressBar,
) -> Result<Outcome> {
    let cutoff = config.cutoff(Utc::now())?;
    let (work_tx, work_rx) = sync_channel::<RepositoryUnit<B::Handle>>(0);
    let (event_tx, event_rx) = sync_channel::<Event>(0);
    let work_rx: WorkQueue<B::Handle> = Arc::new(Mutex::new(work_rx));

    thread::scope(|s| {
        let discovery = s.spawn(move || discover_into(backend, &config.root, work_tx));

        let workers: Vec<_> = (0..config.workers)
            .map(|id| {
                let queue = Arc::clone(&work_rx);
                let events = event_tx.clone();
                s.spawn(move || work(id, backend, config, cutoff, credential, queue, events))
            })
            .collect();
        // Only the workers may keep the queues alive from here on.
        drop(work_rx);
        drop(event_tx);

        let collected = collect(event_rx, progress);

        let discovered = join(discovery);
        for worker in workers {
            join(worker);
        }

        let outcome = collected?;
        discovered?;
        Ok(outcome)
    })
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(payload) => panic::resume_unwind(payload),
    }
}

fn discover_into<B: Backend>(
    backend: &B,
    root: &Path,
    work: SyncSender<RepositoryUnit<B::Handle>>,
) -> Result<()> {
    for unit in Discoverer::new(backend, root) {
        let unit = unit?;
        debug!(repo = %unit.path.display(), "discovered");
        if work.send(unit).is_err() {
            debug!("work queue closed, stopping discovery");
            break;
        }
    }
    Ok(())
}

fn work<B: Backend>(
    id: usize,
    backend: &B,
    config: &Config,
    cutoff: DateTime<Utc>,
    credential: Option<&CredentialSlot>,
    queue: WorkQueue<B::Handle>,
    events: SyncSender<Event>,
) {
    debug!(worker = id, "started");
    loop {
        let unit = match queue.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => break,
        };
        let Ok(unit) = unit else {
            break;
        };

        let source = backend.attach(unit.handle);
        let sent = match reduce(&source, &unit.path, config, cutoff, credential) {
            Ok(Reduction {
                result,
                sync_failure,
            }) => {
                let warned = match sync_failure {
                    Some(failure) => events.send(Event::Warning(failure)).is_ok(),
                    None => true,
                };
                warned && events.send(Event::Finished(result)).is_ok()
            }
            Err(e) => {
                let _ = events.send(Event::Failed(e));
                false
            }
        };
        if !sent {
            break;
        }
    }
    debug!(worker = id, "stopped");
}

/// Drains worker events until every worker is gone or one reports a fatal error.
fn collect(events: Receiver<Event>, progress: &ProgressBar) -> Result<Outcome> {
    let mut outcome = Outcome::default();
    for event in events.iter() {
        match event {
            Event::Warning(failure) => {
                let line = warning_line(&failure);
                progress.suspend(|| crate::diag::warn(&line));
                outcome.warnings.push(line);
            }
            Event::Finished(result) => {
                progress.inc(1);
                progress.set_message(format!("{}", result.path.display()));
                outcome.results.push(result);
            }
            Event::Failed(e) => return Err(e),
        }
    }
    Ok(outcome)
}

fn warning_line(failure: &ScanError) -> String {
    match failure {
        ScanError::Sync { path, message } => {
            format!("while pulling repo {}: {message}", path.display())
        }
        other => other.to_string(),
    }
}
