//! # Filestream Files
//!
//! Storage and file I/O for Filestream.
//!
//! This crate provides:
//! - A flat storage root that resolves file names to paths
//! - Fixed-size segment reading for chunked transfers
//! - Scoped partial files that are removed unless committed
//! - Timestamp rendering for file metadata

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunker;
pub mod partial;
pub mod storage;
pub mod timestamp;

pub use chunker::{FileChunker, SegmentReader};
pub use partial::PartialFile;
pub use storage::{StorageError, StorageRoot, validate_file_name};
pub use timestamp::{FileTimes, format_timestamp};

/// Default chunk size (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Largest chunk size accepted by configuration (16 MiB)
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;
