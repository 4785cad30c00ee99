use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

/// How the pipeline reacts to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected during traversal, dropped without a trace.
    Skip,
    /// Reported once and the affected repository keeps going.
    Warning,
    /// Stops the whole run.
    Fatal,
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("not a git repository: {}", path.display())]
    NotARepository { path: PathBuf },
    #[error("while walking {}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },
    #[error("while opening {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: Box<gix::open::Error>,
    },
    #[error("Credential error: {0}")]
    Credential(String),
    #[error("{message}")]
    Sync { path: PathBuf, message: String },
    #[error("while parsing repo {}: {message}", path.display())]
    History { path: PathBuf, message: String },
    #[error("while parsing repo {}: commit {commit}: {message}", path.display())]
    Statistics {
        path: PathBuf,
        commit: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Git error: {0}")]
    Git(String),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Diff tree to tree error: {0}")]
    DiffTreeToTree(#[from] Box<gix::repository::diff_tree_to_tree::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::existing::Error>),
    #[error("Head peel error: {0}")]
    HeadPeel(#[from] Box<gix::head::peel::to_commit::Error>),
}

impl ScanError {
    pub fn severity(&self) -> Severity {
        match self {
            ScanError::NotARepository { .. } => Severity::Skip,
            ScanError::Sync { .. } | ScanError::Credential(_) => Severity::Warning,
            _ => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Attach the repository path to a low-level history error.
    pub fn in_history(self, path: impl Into<PathBuf>) -> Self {
        match self {
            e @ (ScanError::History { .. } | ScanError::Statistics { .. }) => e,
            other => ScanError::History {
                path: path.into(),
                message: other.to_string(),
            },
        }
    }
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::object::find::existing::Error> for ScanError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        ScanError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for ScanError {
    fn from(err: gix::object::commit::Error) -> Self {
        ScanError::Commit(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for ScanError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        ScanError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for ScanError {
    fn from(err: gix::objs::decode::Error) -> Self {
        ScanError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::repository::diff_tree_to_tree::Error> for ScanError {
    fn from(err: gix::repository::diff_tree_to_tree::Error) -> Self {
        ScanError::DiffTreeToTree(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for ScanError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        ScanError::RefFind(Box::new(err))
    }
}

impl From<gix::head::peel::to_commit::Error> for ScanError {
    fn from(err: gix::head::peel::to_commit::Error) -> Self {
        ScanError::HeadPeel(Box::new(err))
    }
}
