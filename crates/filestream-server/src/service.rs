//! File service: the three remote operations and per-connection dispatch.
//!
//! Each connection carries one call. The first frame must open the call;
//! the service then runs the matching operation against the connection and
//! reports failures to the client as a status frame.

use crate::download::{DownloadEmitter, DownloadSummary};
use crate::error::{Result, ServiceError};
use crate::metadata::MetadataLookup;
use crate::stats::ServerStats;
use crate::upload::UploadSession;
use filestream_core::{
    Call, ChannelError, ChunkSink, ChunkSource, FileMetadata, FileRequest, FramedStream, Message,
    Status, UploadStatus,
};
use filestream_files::StorageRoot;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// Server-side implementation of Upload, Download and GetMetadata
#[derive(Debug, Clone)]
pub struct FileService {
    root: StorageRoot,
    emitter: DownloadEmitter,
    lookup: MetadataLookup,
    stats: Arc<ServerStats>,
}

impl FileService {
    /// Create a service storing under `root`, emitting `chunk_size` chunks
    #[must_use]
    pub fn new(root: StorageRoot, chunk_size: usize) -> Self {
        Self::with_stats(root, chunk_size, Arc::new(ServerStats::new()))
    }

    /// Create a service that records into shared counters
    #[must_use]
    pub fn with_stats(root: StorageRoot, chunk_size: usize, stats: Arc<ServerStats>) -> Self {
        Self {
            emitter: DownloadEmitter::new(root.clone(), chunk_size),
            lookup: MetadataLookup::new(root.clone()),
            root,
            stats,
        }
    }

    /// Storage root
    #[must_use]
    pub fn root(&self) -> &StorageRoot {
        &self.root
    }

    /// Shared counters
    #[must_use]
    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    /// Receive a chunk stream and store it under the first chunk's name
    ///
    /// # Errors
    /// Returns `ServiceError` if the stream fails or the file cannot be
    /// written; nothing is left in storage in that case.
    pub async fn upload<S>(&self, source: &mut S) -> Result<UploadStatus>
    where
        S: ChunkSource + ?Sized,
    {
        let mut session = UploadSession::new(self.root.clone());
        let result = session.run(source).await;

        match &result {
            Ok(status) => {
                tracing::info!(
                    "Upload complete: {} ({})",
                    session.file_name().unwrap_or("<empty stream>"),
                    status.message
                );
                self.stats.record_upload(session.bytes_received());
            }
            Err(e) => {
                tracing::warn!("Upload failed: {}", e);
                self.stats.record_failure();
            }
        }
        result
    }

    /// Stream the requested file into `sink`
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` before any chunk is sent if the file
    /// does not exist, or another `ServiceError` if the stream fails midway.
    pub async fn download<S>(&self, request: &FileRequest, sink: &mut S) -> Result<DownloadSummary>
    where
        S: ChunkSink + ?Sized,
    {
        let result = self.emitter.run(request, sink).await;

        match &result {
            Ok(summary) => {
                tracing::info!(
                    "Download complete: {} ({} bytes in {} chunks)",
                    request.file_name,
                    summary.bytes,
                    summary.chunks
                );
                self.stats.record_download(summary.bytes);
            }
            Err(e) => {
                tracing::warn!("Download of {} failed: {}", request.file_name, e);
                self.stats.record_failure();
            }
        }
        result
    }

    /// Report size and timestamps of the requested file
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if the file does not exist.
    pub async fn get_metadata(&self, request: &FileRequest) -> Result<FileMetadata> {
        let result = self.lookup.lookup(request).await;

        match &result {
            Ok(metadata) => {
                tracing::debug!(
                    file = %metadata.file_name,
                    size = metadata.size,
                    "Metadata lookup"
                );
                self.stats.record_metadata();
            }
            Err(e) => {
                tracing::debug!("Metadata lookup for {} failed: {}", request.file_name, e);
                self.stats.record_failure();
            }
        }
        result
    }

    /// Serve the single call carried by `stream`.
    ///
    /// On failure the client is sent a status frame (when the connection is
    /// still writable) and the error is returned for logging.
    ///
    /// # Errors
    /// Returns the `ServiceError` that ended the call.
    pub async fn handle_connection<T>(&self, stream: T) -> Result<()>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut framed = FramedStream::new(stream);

        let call = match framed.read_message().await? {
            Some(Message::Open(call)) => call,
            Some(other) => {
                let name = other.frame_type().name();
                let _ = reply(
                    &mut framed,
                    &Message::Status(Status::invalid_argument(format!(
                        "expected call open, got {name}"
                    ))),
                )
                .await;
                return Err(ChannelError::Unexpected(name).into());
            }
            None => {
                tracing::debug!("Connection closed before a call was opened");
                return Ok(());
            }
        };

        let method = call.method();
        tracing::debug!(method, "Call opened");
        let result = match call {
            Call::Upload => match self.upload(&mut framed).await {
                Ok(status) => reply(&mut framed, &Message::UploadStatus(status)).await,
                Err(e) => Err(e),
            },
            Call::Download(request) => self.download(&request, &mut framed).await.map(|_| ()),
            Call::GetMetadata(request) => match self.get_metadata(&request).await {
                Ok(metadata) => reply(&mut framed, &Message::Metadata(metadata)).await,
                Err(e) => Err(e),
            },
        };

        if let Err(e) = &result {
            // The peer may already be gone; the status is best effort.
            let _ = reply(&mut framed, &Message::Status(e.to_status())).await;
        }
        let _ = framed.shutdown().await;

        let traffic = framed.stats();
        tracing::debug!(
            method,
            frames_sent = traffic.frames_sent,
            frames_received = traffic.frames_received,
            bytes_sent = traffic.bytes_sent,
            bytes_received = traffic.bytes_received,
            "Call finished"
        );
        result
    }
}

async fn reply<S>(framed: &mut FramedStream<S>, message: &Message) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    framed.write_message(message).await.map_err(|e| {
        tracing::debug!("Failed to send {}: {}", message.frame_type().name(), e);
        ServiceError::from(e)
    })
}
