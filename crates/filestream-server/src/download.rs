//! Download emitter.
//!
//! Streams a stored file to a chunk sink in fixed-size segments. Every chunk
//! carries the requested name; only the last may be shorter than the chunk
//! size. A file that cannot be opened fails the call before any chunk is
//! emitted.

use crate::error::Result;
use filestream_core::{Chunk, ChunkSink, FileRequest};
use filestream_files::{FileChunker, StorageRoot};
use tokio::io::AsyncRead;

/// Outcome of a completed download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadSummary {
    /// Content bytes emitted
    pub bytes: u64,
    /// Chunks emitted
    pub chunks: u64,
}

/// Emits stored files as chunk streams
#[derive(Debug, Clone)]
pub struct DownloadEmitter {
    root: StorageRoot,
    chunker: FileChunker,
}

impl DownloadEmitter {
    /// Create an emitter reading from `root` in `chunk_size` segments
    #[must_use]
    pub fn new(root: StorageRoot, chunk_size: usize) -> Self {
        Self {
            root,
            chunker: FileChunker::with_chunk_size(chunk_size),
        }
    }

    /// Stream the requested file into `sink` and end the stream
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if the file does not exist (nothing
    /// is sent), `ServiceError::Io` if a read fails mid-stream, or
    /// `ServiceError::Channel` if the sink rejects a chunk.
    pub async fn run<S>(&self, request: &FileRequest, sink: &mut S) -> Result<DownloadSummary>
    where
        S: ChunkSink + ?Sized,
    {
        let file = self.root.open(&request.file_name).await?;
        self.emit(&request.file_name, file, sink).await
    }

    /// Stream everything `reader` yields into `sink` as chunks named
    /// `file_name`, then end the stream.
    ///
    /// A read failure stops the stream without ending it. Chunks already
    /// sent stay sent.
    ///
    /// # Errors
    /// Returns `ServiceError::Io` if a read fails or `ServiceError::Channel`
    /// if the sink rejects a chunk.
    pub async fn emit<R, S>(
        &self,
        file_name: &str,
        reader: R,
        sink: &mut S,
    ) -> Result<DownloadSummary>
    where
        R: AsyncRead + Unpin,
        S: ChunkSink + ?Sized,
    {
        let mut segments = self.chunker.segments(reader);
        let mut chunks = 0u64;

        while let Some(segment) = segments.next_segment().await? {
            sink.send_chunk(Chunk::new(file_name, segment)).await?;
            chunks += 1;
        }
        sink.finish().await?;

        let summary = DownloadSummary {
            bytes: segments.offset(),
            chunks,
        };
        tracing::debug!(
            file = %file_name,
            bytes = summary.bytes,
            chunks = summary.chunks,
            "Download stream complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use filestream_core::{ChannelError, ChunkSource, Code, chunk_channel};
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::TempDir;
    use tokio::io::ReadBuf;

    /// Yields `data`, then fails every read
    struct FailingReader {
        data: Vec<u8>,
        pos: usize,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.pos >= self.data.len() {
                return Poll::Ready(Err(io::Error::other("device read error")));
            }
            let n = buf.remaining().min(self.data.len() - self.pos);
            let start = self.pos;
            buf.put_slice(&self.data[start..start + n]);
            self.pos += n;
            Poll::Ready(Ok(()))
        }
    }

    async fn drain(mut rx: filestream_core::ChunkReceiver) -> (Vec<Chunk>, Option<ChannelError>) {
        let mut chunks = Vec::new();
        loop {
            match rx.recv_chunk().await {
                Ok(Some(chunk)) => chunks.push(chunk),
                Ok(None) => return (chunks, None),
                Err(e) => return (chunks, Some(e)),
            }
        }
    }

    #[tokio::test]
    async fn test_emits_fixed_segments() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("big.bin"), vec![9u8; 130_000]).unwrap();

        let emitter = DownloadEmitter::new(StorageRoot::new(dir.path()), 64 * 1024);
        let (mut tx, rx) = chunk_channel(8);
        let reader = tokio::spawn(drain(rx));

        let summary = emitter
            .run(&FileRequest::new("big.bin"), &mut tx)
            .await
            .unwrap();
        assert_eq!(summary, DownloadSummary { bytes: 130_000, chunks: 2 });

        let (chunks, failure) = reader.await.unwrap();
        assert!(failure.is_none());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 65_536);
        assert_eq!(chunks[1].len(), 64_464);
        assert!(chunks.iter().all(|c| c.file_name == "big.bin"));
    }

    #[tokio::test]
    async fn test_empty_file_has_no_chunks() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("empty"), b"").unwrap();

        let emitter = DownloadEmitter::new(StorageRoot::new(dir.path()), 1024);
        let (mut tx, rx) = chunk_channel(1);
        let reader = tokio::spawn(drain(rx));

        let summary = emitter.run(&FileRequest::new("empty"), &mut tx).await.unwrap();
        assert_eq!(summary, DownloadSummary::default());

        let (chunks, failure) = reader.await.unwrap();
        assert!(chunks.is_empty());
        assert!(failure.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_sends_nothing() {
        let dir = TempDir::new().unwrap();
        let emitter = DownloadEmitter::new(StorageRoot::new(dir.path()), 1024);
        let (mut tx, rx) = chunk_channel(1);

        let err = emitter
            .run(&FileRequest::new("absent.bin"), &mut tx)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!tx.is_finished());

        drop(tx);
        let (chunks, failure) = drain(rx).await;
        assert!(chunks.is_empty());
        assert!(matches!(failure, Some(ChannelError::Closed)));
    }

    #[tokio::test]
    async fn test_sink_failure_propagates() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f"), vec![1u8; 4096]).unwrap();

        let emitter = DownloadEmitter::new(StorageRoot::new(dir.path()), 1024);
        let (mut tx, rx) = chunk_channel(1);
        drop(rx);

        let err = emitter.run(&FileRequest::new("f"), &mut tx).await.unwrap_err();
        assert!(matches!(err, ServiceError::Channel(ChannelError::Closed)));
    }

    #[tokio::test]
    async fn test_read_failure_stops_stream_unfinished() {
        let dir = TempDir::new().unwrap();
        let emitter = DownloadEmitter::new(StorageRoot::new(dir.path()), 1024);
        let (mut tx, rx) = chunk_channel(8);
        let reader = FailingReader {
            data: vec![5u8; 2048],
            pos: 0,
        };

        let err = emitter.emit("flaky.bin", reader, &mut tx).await.unwrap_err();
        assert!(matches!(err, ServiceError::Io(_)));
        assert_eq!(err.to_status().code, Code::Internal);
        assert!(!tx.is_finished());

        drop(tx);
        let (chunks, failure) = drain(rx).await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.iter().map(Chunk::len).sum::<usize>(), 2048);
        assert!(chunks.iter().all(|c| c.file_name == "flaky.bin"));
        assert!(matches!(failure, Some(ChannelError::Closed)));
    }
}
