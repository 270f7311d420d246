//! TCP client for the three file operations.
//!
//! Each call opens its own connection, sends the opening frame and then
//! speaks the call's chunk protocol over [`FramedStream`].

use crate::error::ClientError;
use crate::transfer::{Progress, receive_file, send_file};
use filestream_core::{Call, FileMetadata, FileRequest, FramedStream, Message, UploadStatus};
use filestream_files::DEFAULT_CHUNK_SIZE;
use std::io;
use std::path::{Path, PathBuf};
use tokio::net::TcpStream;

/// Result of a completed download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Local file that was written
    pub path: PathBuf,
    /// Bytes written
    pub bytes: u64,
}

/// Client for a Filestream server
#[derive(Debug, Clone)]
pub struct FileClient {
    server_addr: String,
    chunk_size: usize,
}

impl FileClient {
    /// Create a client for `server_addr` (`host:port`)
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the upload chunk size
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Server address
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Upload chunk size
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    async fn open(&self, call: Call) -> Result<FramedStream<TcpStream>, ClientError> {
        let stream = TcpStream::connect(&self.server_addr)
            .await
            .map_err(|source| ClientError::Connect {
                addr: self.server_addr.clone(),
                source,
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Failed to set TCP_NODELAY: {}", e);
        }

        tracing::debug!(server = %self.server_addr, method = call.method(), "Opening call");
        let mut framed = FramedStream::new(stream);
        framed.write_message(&Message::Open(call)).await?;
        Ok(framed)
    }

    /// Upload the local file at `path`, stored under its base name
    ///
    /// # Errors
    ///
    /// Returns `ClientError::LocalIo` if the file cannot be opened or read
    /// (nothing is sent if it cannot be opened), or the error that ended
    /// the call.
    pub async fn upload(
        &self,
        path: &Path,
        progress: Option<&mut dyn Progress>,
    ) -> Result<UploadStatus, ClientError> {
        let file_name = base_name(path)?;
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ClientError::local_io(path, e))?;

        let mut framed = self.open(Call::Upload).await?;
        if let Err(e) = send_file(file, &file_name, self.chunk_size, &mut framed, progress).await {
            return Err(match e {
                // The server may have rejected the call and closed; prefer its status
                ClientError::Transport(_) => rejection(&mut framed).await.unwrap_or(e),
                other => other,
            });
        }

        match framed.expect_message().await? {
            Message::UploadStatus(status) => Ok(status),
            Message::Status(status) => Err(ClientError::from_status(status)),
            other => Err(ClientError::Protocol(other.frame_type().name())),
        }
    }

    /// Download `file_name` into `download_dir`
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the server has no such file (no
    /// local file is created), or the error that ended the call (any
    /// partially written local file is removed).
    pub async fn download(
        &self,
        file_name: &str,
        download_dir: &Path,
        progress: Option<&mut dyn Progress>,
    ) -> Result<Download, ClientError> {
        let mut framed = self
            .open(Call::Download(FileRequest::new(file_name)))
            .await?;

        let path = download_dir.join(file_name);
        let bytes = receive_file(&mut framed, &path, progress).await?;
        Ok(Download { path, bytes })
    }

    /// Fetch size and timestamps of `file_name`
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the server has no such file.
    pub async fn metadata(&self, file_name: &str) -> Result<FileMetadata, ClientError> {
        let mut framed = self
            .open(Call::GetMetadata(FileRequest::new(file_name)))
            .await?;

        match framed.expect_message().await? {
            Message::Metadata(metadata) => Ok(metadata),
            Message::Status(status) => Err(ClientError::from_status(status)),
            other => Err(ClientError::Protocol(other.frame_type().name())),
        }
    }
}

async fn rejection(framed: &mut FramedStream<TcpStream>) -> Option<ClientError> {
    match framed.read_message().await {
        Ok(Some(Message::Status(status))) => Some(ClientError::from_status(status)),
        _ => None,
    }
}

/// Name a local path is stored under on the server
///
/// # Errors
///
/// Returns `ClientError::LocalIo` if the path has no UTF-8 final component.
pub fn base_name(path: &Path) -> Result<String, ClientError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ClientError::local_io(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "path has no usable file name"),
            )
        })
}
