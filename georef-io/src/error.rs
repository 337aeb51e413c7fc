use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A malformed record, located by its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct RecordError {
    pub line: usize,
    pub reason: String,
}

impl RecordError {
    pub(crate) fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {}", .path.display(), .source)]
    Format {
        path: PathBuf,
        #[source]
        source: RecordError,
    },
    #[error("{}: {}", .path.display(), .source)]
    Mesh {
        path: PathBuf,
        #[source]
        source: georef_mesh::Error,
    },
    #[error("{}: {}", .path.display(), .reason)]
    PointCloud { path: PathBuf, reason: String },
    #[error("{}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Wraps an I/O error with the path it happened on, for use with `map_err`.
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_owned(),
            source,
        }
    }

    pub(crate) fn format(path: &Path) -> impl FnOnce(RecordError) -> Self + '_ {
        move |source| Self::Format {
            path: path.to_owned(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
