// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a [`RemoteStore`](crate::fetch::RemoteStore).
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The object does not exist at the remote location.
    #[error("{url} returned {status}")]
    NotFound { url: String, status: u16 },

    /// The remote could not be reached or the transfer broke off.
    #[error("could not retrieve {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The object arrived but could not be written locally.
    #[error("writing {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RemoteError {
    /// True for the kinds that get reported per year instead of aborting the run.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Unreachable { .. })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid year range {from}..{to}: start is after end")]
    InvalidRange { from: i32, to: i32 },

    #[error("invalid base url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("malformed input {path:?}: {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    #[error("I/O on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("building HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
