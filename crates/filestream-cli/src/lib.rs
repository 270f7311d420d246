//! # Filestream CLI
//!
//! Client side of the Filestream chunked file service: a [`FileClient`]
//! speaking the framed protocol over TCP, chunk stream helpers, and the
//! [`Driver`] behind the `filestream <command> <filename>` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod progress;
pub mod transfer;

pub use client::{Download, FileClient};
pub use config::ClientConfig;
pub use driver::{Driver, Operation, Outcome};
pub use error::{ClientError, DriverError, ErrorKind};
pub use progress::{TransferProgress, format_bytes};
pub use transfer::{Progress, receive_file, send_file};
