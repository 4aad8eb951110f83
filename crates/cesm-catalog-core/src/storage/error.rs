//! Error types for the storage layer.

use std::{error::Error, fmt, io};

use snafu::{Backtrace, prelude::*};

/// Errors produced by the storage backend implementation.
///
/// Local filesystem I/O and object store client failures are wrapped in this
/// enum so higher layers can map them into [`StorageError`] variants with
/// additional context.
#[derive(Debug)]
pub enum BackendError {
    /// A local filesystem I/O error.
    Local(io::Error),
    /// An error reported by the object store client (listing or GET).
    ObjectStore(object_store::Error),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Local(e) => write!(f, "local I/O error: {e}"),
            BackendError::ObjectStore(e) => write!(f, "object store error: {e}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackendError::Local(e) => Some(e),
            BackendError::ObjectStore(e) => Some(e),
        }
    }
}

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// The specified path or key was not found.
    #[snafu(display("Path not found: {path}"))]
    NotFound {
        /// The path that was not found.
        path: String,
        /// Underlying backend error that caused the failure.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Any other I/O failure, local or remote.
    #[snafu(display("I/O error at {path}: {source}"))]
    OtherIo {
        /// The path or key where the I/O error occurred.
        path: String,
        /// Underlying backend error with platform-specific details.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// A store location string could not be turned into a location.
    #[snafu(display("Invalid store location '{input}': {reason}"))]
    InvalidLocation {
        /// The string as given by the caller.
        input: String,
        /// Why the string was rejected.
        reason: String,
    },

    /// The object store client could not be constructed.
    #[snafu(display("Failed to open store {location}: {source}"))]
    OpenStore {
        /// Display form of the location that failed to open.
        location: String,
        /// Underlying client configuration error.
        source: object_store::Error,
    },

    /// The operation is only implemented for local locations.
    #[snafu(display("{operation} is not supported for {location}"))]
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Display form of the location.
        location: String,
    },
}

impl StorageError {
    /// Returns true when the error means the path or key does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Classify an object store error into [`StorageError::NotFound`] or
/// [`StorageError::OtherIo`].
pub(crate) fn from_object_store(path: impl Into<String>, err: object_store::Error) -> StorageError {
    let path = path.into();
    match err {
        e @ object_store::Error::NotFound { .. } => StorageError::NotFound {
            path,
            source: BackendError::ObjectStore(e),
            backtrace: Backtrace::capture(),
        },
        e => StorageError::OtherIo {
            path,
            source: BackendError::ObjectStore(e),
            backtrace: Backtrace::capture(),
        },
    }
}
