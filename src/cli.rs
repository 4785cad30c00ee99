use crate::config::{Config, DEFAULT_WORKERS};
use crate::git::{Credential, GitBackend};
use crate::report::{self, TableOptions};
use crate::scan::{self, CredentialSlot};
use anyhow::{Context, Result};
use clap::Parser;
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "gitpulse")]
#[command(about = "Rank the recent change activity of every git repository under a directory")]
#[command(version)]
pub struct Cli {
    #[arg(long, default_value = "", help = "Show only changes by this author (exact name)")]
    pub author: String,

    #[arg(long, default_value = ".", help = "Directory containing git repos")]
    pub dir: PathBuf,

    #[arg(
        long,
        default_value = "7days",
        value_parser = humantime::parse_duration,
        help = "Changes since duration ago (e.g. 36h, 2weeks)"
    )]
    pub since: Duration,

    #[arg(long, help = "Pull each repo before parsing its logs")]
    pub pull: bool,

    #[arg(long, help = "Show the per-file breakdown of each repo")]
    pub files: bool,

    #[arg(long, help = "List commit message subjects under each file (implies --files)")]
    pub messages: bool,

    #[arg(long, default_value_t = DEFAULT_WORKERS, help = "Number of repos parsed in parallel")]
    pub workers: usize,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn config(&self) -> Config {
        Config {
            author: Some(self.author.clone()).filter(|a| !a.is_empty()),
            root: self.dir.clone(),
            since: self.since,
            pull: self.pull,
            files: self.files || self.messages,
            messages: self.messages,
            workers: self.workers,
            json: self.json,
        }
    }

    pub fn execute(self) -> Result<()> {
        let config = self.config().validate()?;
        let credential: Option<CredentialSlot> = config
            .pull
            .then(|| Credential::load().map_err(|e| e.to_string()));

        let progress = progress_bar(&config);
        let outcome = scan::run(&GitBackend, &config, credential.as_ref(), &progress);
        progress.finish_and_clear();
        let outcome = outcome?;

        let report = report::build(outcome, &config);
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if config.json {
            report::write_json(&report, &mut out)?;
        } else {
            let options = TableOptions {
                files: config.files,
                messages: config.messages,
                color: console::colors_enabled(),
            };
            report::write_table(&report, options, &mut out).context("Failed to write report")?;
        }
        out.flush()?;
        Ok(())
    }
}

fn progress_bar(config: &Config) -> ProgressBar {
    if config.json || !Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {pos} repos scanned {msg:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
