//! Chunk stream helpers shared by the client operations.
//!
//! [`send_file`] turns a local reader into a chunk stream; [`receive_file`]
//! writes a chunk stream to a local path. Both work on any chunk channel, so
//! they are exercised in-process as well as over TCP.

use crate::error::ClientError;
use filestream_core::{Chunk, ChunkSink, ChunkSource};
use filestream_files::{FileChunker, PartialFile};
use std::path::Path;
use tokio::io::AsyncRead;

/// Observer notified as file content moves
pub trait Progress: Send {
    /// `bytes` more content bytes were transferred
    fn advance(&mut self, bytes: u64);
}

/// Stream `reader` into `sink` as chunks named `file_name`, then end the
/// stream.
///
/// Empty input is sent as a single empty chunk so the receiver still learns
/// the file name. Returns the number of content bytes sent.
///
/// # Errors
///
/// Returns `ClientError::LocalIo` if reading fails and
/// `ClientError::Transport` if the sink rejects a chunk.
pub async fn send_file<R, S>(
    reader: R,
    file_name: &str,
    chunk_size: usize,
    sink: &mut S,
    mut progress: Option<&mut dyn Progress>,
) -> Result<u64, ClientError>
where
    R: AsyncRead + Unpin + Send,
    S: ChunkSink + ?Sized,
{
    let mut segments = FileChunker::with_chunk_size(chunk_size).segments(reader);
    let mut chunks = 0u64;

    while let Some(segment) = segments
        .next_segment()
        .await
        .map_err(|e| ClientError::local_io(file_name, e))?
    {
        let len = segment.len() as u64;
        sink.send_chunk(Chunk::new(file_name, segment)).await?;
        chunks += 1;
        if let Some(progress) = progress.as_deref_mut() {
            progress.advance(len);
        }
    }

    if chunks == 0 {
        sink.send_chunk(Chunk::new(file_name, Vec::new())).await?;
        chunks = 1;
    }
    sink.finish().await?;

    tracing::debug!(
        file = file_name,
        bytes = segments.offset(),
        chunks,
        "Chunk stream sent"
    );
    Ok(segments.offset())
}

/// Write the chunk stream from `source` to `destination`.
///
/// The destination is created on the first chunk, or on a clean end of an
/// empty stream, so a stream that fails before any content leaves nothing
/// behind. A stream that fails later removes the partial file. Returns the
/// number of bytes written.
///
/// # Errors
///
/// Returns `ClientError::NotFound`/`ClientError::Remote` if the server ends
/// the stream with a status, `ClientError::Transport` if the stream breaks,
/// and `ClientError::LocalIo` if the destination cannot be written.
pub async fn receive_file<S>(
    source: &mut S,
    destination: &Path,
    mut progress: Option<&mut dyn Progress>,
) -> Result<u64, ClientError>
where
    S: ChunkSource + ?Sized,
{
    let mut output: Option<PartialFile> = None;

    while let Some(chunk) = source.recv_chunk().await? {
        if output.is_none() {
            output = Some(create(destination).await?);
        }
        if let Some(file) = output.as_mut() {
            file.write_all(&chunk.content)
                .await
                .map_err(|e| ClientError::local_io(destination, e))?;
        }
        if let Some(progress) = progress.as_deref_mut() {
            progress.advance(chunk.len() as u64);
        }
    }

    let file = match output {
        Some(file) => file,
        None => create(destination).await?,
    };
    let written = file.written();
    file.commit()
        .await
        .map_err(|e| ClientError::local_io(destination, e))?;

    tracing::debug!(
        path = %destination.display(),
        bytes = written,
        "Chunk stream received"
    );
    Ok(written)
}

async fn create(destination: &Path) -> Result<PartialFile, ClientError> {
    PartialFile::create(destination)
        .await
        .map_err(|e| ClientError::local_io(destination, e))
}
