//! Client error types and their exit codes.

use filestream_core::{ChannelError, Code, Status};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Broad failure category, one per process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad command line or configuration
    Usage,
    /// Server has no such file
    NotFound,
    /// Local file could not be read or written
    LocalIo,
    /// Connection or stream failure
    Transport,
    /// Server rejected or failed the call
    Remote,
}

impl ErrorKind {
    /// Process exit code for this kind
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Usage => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::LocalIo => 4,
            ErrorKind::Transport => 5,
            ErrorKind::Remote => 6,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Usage => "usage error",
            ErrorKind::NotFound => "not found",
            ErrorKind::LocalIo => "local I/O failure",
            ErrorKind::Transport => "transport failure",
            ErrorKind::Remote => "remote failure",
        };
        f.write_str(name)
    }
}

/// Errors from a single client call
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server reported that the file does not exist (server's message)
    #[error("{0}")]
    NotFound(String),

    /// Local file I/O failed
    #[error("local I/O error on {}: {source}", .path.display())]
    LocalIo {
        /// Local path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Could not reach the server
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Server address
        addr: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Connection or frame failure mid-call
    #[error("transport error: {0}")]
    Transport(ChannelError),

    /// Server ended the call with a failure status
    #[error("server error: {0}")]
    Remote(Status),

    /// Server replied with a message that does not belong to this call
    #[error("protocol error: unexpected {0} reply")]
    Protocol(&'static str),
}

impl ClientError {
    /// Wrap a local I/O error with the path it concerns
    pub fn local_io(path: impl AsRef<Path>, source: io::Error) -> Self {
        ClientError::LocalIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convert a failure status sent by the server
    #[must_use]
    pub fn from_status(status: Status) -> Self {
        match status.code {
            Code::NotFound => ClientError::NotFound(status.message),
            _ => ClientError::Remote(status),
        }
    }

    /// Category of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::NotFound(_) => ErrorKind::NotFound,
            ClientError::LocalIo { .. } => ErrorKind::LocalIo,
            ClientError::Connect { .. } | ClientError::Transport(_) | ClientError::Protocol(_) => {
                ErrorKind::Transport
            }
            ClientError::Remote(_) => ErrorKind::Remote,
        }
    }
}

impl From<ChannelError> for ClientError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Status(status) => ClientError::from_status(status),
            other => ClientError::Transport(other),
        }
    }
}

/// Errors reported by the transfer driver
#[derive(Debug, Error)]
pub enum DriverError {
    /// Command line could not be understood
    #[error("{0}")]
    Usage(String),

    /// The selected operation failed
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl DriverError {
    /// Category of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriverError::Usage(_) => ErrorKind::Usage,
            DriverError::Client(e) => e.kind(),
        }
    }

    /// Process exit code for this error
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }
}
