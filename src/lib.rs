//! Scan a directory tree for git repositories and rank their recent change activity.

pub mod cli;
pub mod config;
pub mod diag;
pub mod error;
pub mod git;
pub mod model;
pub mod report;
pub mod scan;
pub mod util;
