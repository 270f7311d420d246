//! # Filestream Core
//!
//! Core protocol implementation for Filestream, a chunked streaming file
//! transfer service.
//!
//! This crate provides:
//! - Protocol message types (`Chunk`, `FileRequest`, `UploadStatus`,
//!   `FileMetadata`, `Status`)
//! - The chunk channel contract (`ChunkSource` / `ChunkSink`) and an
//!   in-process implementation
//! - Frame encoding and decoding
//! - A framed transport over any async byte stream
//! - Error types and handling
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Calls                                    │
//! │   (Upload, Download, GetMetadata - one per connection)          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                     Chunk channel                                │
//! │   (ordered chunks, explicit end-of-stream, terminal failure)    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                         Frames                                   │
//! │   (length-prefixed protocol data units)                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod error;
pub mod frame;
pub mod message;
pub mod transport;

pub use channel::{ChunkReceiver, ChunkSender, ChunkSink, ChunkSource, chunk_channel};
pub use error::{ChannelError, ChannelResult, FrameError};
pub use frame::{Frame, FrameHeader, FrameType};
pub use message::{Call, Chunk, Code, FileMetadata, FileRequest, Message, Status, UploadStatus};
pub use transport::{FramedStream, TransportStats};

/// Wire protocol version, first byte of every frame header
pub const PROTOCOL_VERSION: u8 = 1;

/// Fixed frame header size in bytes
pub const FRAME_HEADER_SIZE: usize = 8;

/// Largest payload a single frame may carry (64 MiB).
///
/// This bounds allocation on the receiving side. It is a transport limit,
/// not a chunk-size rule: chunk sizes are hints well below it.
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;
