//! Transfer driver: one operation per invocation.
//!
//! The driver turns `<command> <filename>` into a call on [`FileClient`] and
//! returns either a printable [`Outcome`] or a [`DriverError`] whose kind
//! selects the process exit code. It never exits the process itself.

use crate::client::{Download, FileClient};
use crate::error::DriverError;
use crate::progress::format_bytes;
use crate::transfer::Progress;
use filestream_core::{FileMetadata, UploadStatus};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Operation selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Send a local file to the server
    Upload,
    /// Fetch a stored file into the download directory
    Download,
    /// Show size and timestamps of a stored file
    Metadata,
}

impl Operation {
    /// Command name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Operation::Upload => "upload",
            Operation::Download => "download",
            Operation::Metadata => "metadata",
        }
    }
}

impl FromStr for Operation {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(Operation::Upload),
            "download" => Ok(Operation::Download),
            "metadata" => Ok(Operation::Metadata),
            other => Err(DriverError::Usage(format!(
                "unknown command '{other}' (expected upload, download or metadata)"
            ))),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a successful operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Server's upload reply
    Uploaded(UploadStatus),
    /// File written locally
    Downloaded(Download),
    /// Metadata of the stored file
    Metadata(FileMetadata),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Uploaded(status) => write!(f, "{}", status.message),
            Outcome::Downloaded(download) => write!(
                f,
                "Downloaded {} ({})",
                download.path.display(),
                format_bytes(download.bytes)
            ),
            Outcome::Metadata(meta) => {
                writeln!(f, "File: {}", meta.file_name)?;
                writeln!(f, "Size: {} bytes", meta.size)?;
                writeln!(f, "Created: {}", meta.created_at)?;
                write!(f, "Modified: {}", meta.modified_at)
            }
        }
    }
}

/// Runs operations against one server
#[derive(Debug, Clone)]
pub struct Driver {
    client: FileClient,
    download_dir: PathBuf,
}

impl Driver {
    /// Create a driver that downloads into `download_dir`
    pub fn new(client: FileClient, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            download_dir: download_dir.into(),
        }
    }

    /// Underlying client
    #[must_use]
    pub fn client(&self) -> &FileClient {
        &self.client
    }

    /// Directory downloads are written to
    #[must_use]
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Run `operation` on `file_name`
    ///
    /// For uploads `file_name` is a local path; the file is stored under its
    /// base name. For downloads and metadata it is the stored name.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Client` carrying the failure kind.
    pub async fn run(
        &self,
        operation: Operation,
        file_name: &str,
        progress: Option<&mut dyn Progress>,
    ) -> Result<Outcome, DriverError> {
        tracing::debug!(%operation, file = file_name, "Running operation");

        let outcome = match operation {
            Operation::Upload => {
                Outcome::Uploaded(self.client.upload(Path::new(file_name), progress).await?)
            }
            Operation::Download => Outcome::Downloaded(
                self.client
                    .download(file_name, &self.download_dir, progress)
                    .await?,
            ),
            Operation::Metadata => Outcome::Metadata(self.client.metadata(file_name).await?),
        };
        Ok(outcome)
    }
}
