//! Error types for the Filestream core protocol.

use crate::message::Status;
use std::io;
use thiserror::Error;

/// Frame-level errors
#[derive(Debug, Error)]
pub enum FrameError {
    /// Frame too short to parse
    #[error("frame too short: expected at least {expected}, got {actual}")]
    TooShort {
        /// Expected minimum size
        expected: usize,
        /// Actual size received
        actual: usize,
    },

    /// Peer speaks a different protocol version
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Invalid frame type byte
    #[error("invalid frame type: 0x{0:02X}")]
    InvalidFrameType(u8),

    /// Reserved frame type used
    #[error("reserved frame type used")]
    ReservedFrameType,

    /// Payload length exceeds the transport limit
    #[error("payload of {0} bytes exceeds maximum frame payload")]
    PayloadTooLarge(usize),

    /// Payload length exceeds packet size
    #[error("payload length exceeds packet size")]
    PayloadOverflow,

    /// Payload body could not be encoded or decoded
    #[error("malformed payload: {0}")]
    Payload(#[from] bincode::Error),
}

/// Chunk channel errors.
///
/// Every variant is terminal for the call that observes it. Logical
/// end-of-stream is never an error; it is reported as `Ok(None)` by
/// [`ChunkSource::recv_chunk`](crate::channel::ChunkSource::recv_chunk).
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Peer went away without signalling end-of-stream
    #[error("channel closed before end of stream")]
    Closed,

    /// I/O error from the underlying transport
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),

    /// Frame could not be decoded
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Peer sent a message that is not valid at this point of the call
    #[error("unexpected {0} frame")]
    Unexpected(&'static str),

    /// Peer terminated the stream with a failure status
    #[error("stream terminated by peer: {0}")]
    Status(Status),
}

impl ChannelError {
    /// Returns the peer status if the stream was terminated by one
    #[must_use]
    pub fn status(&self) -> Option<&Status> {
        match self {
            ChannelError::Status(status) => Some(status),
            _ => None,
        }
    }
}

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;
