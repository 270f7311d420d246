//! # Filestream Server
//!
//! Server side of the Filestream chunked file service.
//!
//! A [`Server`] accepts TCP connections and hands each one to the
//! [`FileService`], which reads the opening frame and runs one of:
//!
//! - **Upload**: an [`UploadSession`] consumes the client's chunk stream and
//!   writes it under the storage root
//! - **Download**: a [`DownloadEmitter`] streams a stored file back in
//!   fixed-size chunks
//! - **GetMetadata**: a [`MetadataLookup`] reports size and timestamps
//!
//! Failures are sent to the client as a status frame.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod download;
pub mod error;
pub mod metadata;
pub mod server;
pub mod service;
pub mod stats;
pub mod upload;

pub use config::ServerConfig;
pub use download::{DownloadEmitter, DownloadSummary};
pub use error::{Result, ServiceError};
pub use metadata::MetadataLookup;
pub use server::Server;
pub use service::FileService;
pub use stats::{ServerStats, StatsSnapshot};
pub use upload::{UploadEvent, UploadPhase, UploadSession};
