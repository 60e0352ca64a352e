//! Error types shared by the size accumulator and its collaborators.
//!
//! Every filesystem failure is tagged with the path it happened on so that a
//! diagnostic line is meaningful on its own. Most variants are recoverable:
//! the tree builder reports them and keeps going. Only
//! [`DuError::ConflictingOptions`] and [`DuError::InvalidSize`] are expected to
//! stop a run, and both are raised before any traversal starts.

use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, DuError>;

/// Errors that can occur while measuring a file hierarchy.
#[derive(Debug, Error)]
pub enum DuError {
    /// The path does not exist (or a symlink points nowhere).
    #[error("cannot access '{}': No such file or directory", path.display())]
    NotFound { path: PathBuf },

    /// Inspecting or listing the path is not allowed.
    #[error("cannot read '{}': Permission denied", path.display())]
    PermissionDenied { path: PathBuf },

    /// Any other read failure.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The filesystem statistics query failed; callers fall back to 4096 bytes.
    #[error("cannot query block size of '{}': {reason}", path.display())]
    BlockSizeProbeFailed { path: PathBuf, reason: String },

    /// A directory was reached twice through symbolic links.
    #[error("WARNING: Circular directory structure. '{}' is an ancestor of itself", path.display())]
    FilesystemLoop { path: PathBuf },

    /// Two presentation options that cannot be combined were requested.
    #[error("{0}")]
    ConflictingOptions(String),

    /// A block size or unit size was zero or could not be parsed.
    #[error("invalid size: {0}")]
    InvalidSize(String),
}

impl DuError {
    /// Classify an I/O error raised while working on `path`.
    #[must_use]
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source: err },
        }
    }

    /// The path this error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound { path }
            | Self::PermissionDenied { path }
            | Self::Io { path, .. }
            | Self::BlockSizeProbeFailed { path, .. }
            | Self::FilesystemLoop { path } => Some(path),
            Self::ConflictingOptions(_) | Self::InvalidSize(_) => None,
        }
    }
}
