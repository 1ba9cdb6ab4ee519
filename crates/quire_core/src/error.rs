//! Error types for Quire core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Quire core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] quire_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The module store could not be opened (missing, permission, corrupt header).
    #[error("cannot open module store at {}: {source}", path.display())]
    Resource {
        /// Location of the store that failed to open.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: Box<CoreError>,
    },

    /// Reading a unit failed after the store was opened.
    #[error("error reading {key}: {source}")]
    Retrieval {
        /// Name of the most specific key known when the read failed.
        key: String,
        /// Underlying failure.
        #[source]
        source: Box<CoreError>,
    },

    /// A reference could not be parsed or lies outside the versification.
    #[error("invalid reference: {message}")]
    InvalidReference {
        /// Description of the problem.
        message: String,
    },

    /// Module metadata is malformed.
    #[error("invalid module metadata: {message}")]
    InvalidMetadata {
        /// Description of the problem.
        message: String,
    },

    /// The module files do not have the expected layout.
    #[error("corrupt module: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },
}

impl CoreError {
    /// Creates a resource error for the store at `path`.
    ///
    /// An error that already is a resource error is returned unchanged.
    pub fn resource(path: impl Into<PathBuf>, source: CoreError) -> Self {
        match source {
            resource @ Self::Resource { .. } => resource,
            other => Self::Resource {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// Creates a retrieval error naming `key`.
    pub fn retrieval(key: impl Into<String>, source: CoreError) -> Self {
        Self::Retrieval {
            key: key.into(),
            source: Box::new(source),
        }
    }

    /// Creates an invalid reference error.
    pub fn invalid_reference(message: impl Into<String>) -> Self {
        Self::InvalidReference {
            message: message.into(),
        }
    }

    /// Creates an invalid metadata error.
    pub fn invalid_metadata(message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            message: message.into(),
        }
    }

    /// Creates a corrupt module error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }
}
