//! Error types for server-side calls.
//!
//! Every error terminates the call that produced it. [`ServiceError::to_status`]
//! maps it onto the status reported to the client; Not-Found is always kept
//! distinct from transport and I/O failures.

use filestream_core::{ChannelError, Code, Status};
use filestream_files::StorageError;
use std::io;
use thiserror::Error;

/// Errors that can occur while serving a call
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Requested file is absent from storage
    #[error("file not found: {0}")]
    NotFound(String),

    /// Request names something that is not a flat file name
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Open, read or write failure on a stored file
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// Chunk channel failed before the call completed
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Event not valid in the current session state
    #[error("invalid session state: {0}")]
    InvalidState(&'static str),
}

impl ServiceError {
    /// Status reported to the client for this error
    #[must_use]
    pub fn to_status(&self) -> Status {
        let code = match self {
            ServiceError::NotFound(_) => Code::NotFound,
            ServiceError::InvalidArgument(_) => Code::InvalidArgument,
            ServiceError::Io(_) | ServiceError::Channel(_) | ServiceError::InvalidState(_) => {
                Code::Internal
            }
        };
        Status::new(code, self.to_string())
    }

    /// Returns true if the requested file does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidName { .. } => ServiceError::InvalidArgument(err.to_string()),
            StorageError::NotFound(name) => ServiceError::NotFound(name),
            StorageError::Io(e) => ServiceError::Io(e),
        }
    }
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
