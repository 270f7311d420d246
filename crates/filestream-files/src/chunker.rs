//! File chunking.

use crate::DEFAULT_CHUNK_SIZE;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Chunk a file into fixed-size pieces
#[derive(Debug, Clone, Copy)]
pub struct FileChunker {
    chunk_size: usize,
}

impl FileChunker {
    /// Create a new chunker with default chunk size
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Create a new chunker with custom chunk size. Zero is raised to one.
    pub fn with_chunk_size(size: usize) -> Self {
        Self {
            chunk_size: size.max(1),
        }
    }

    /// Get chunk size
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Calculate number of chunks for a file
    pub fn chunk_count(&self, file_size: u64) -> u64 {
        file_size.div_ceil(self.chunk_size as u64)
    }

    /// Read `inner` as a sequence of segments of this chunker's size
    pub fn segments<R: AsyncRead + Unpin>(&self, inner: R) -> SegmentReader<R> {
        SegmentReader {
            inner,
            chunk_size: self.chunk_size,
            offset: 0,
            exhausted: false,
        }
    }
}

impl Default for FileChunker {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequential fixed-size segment reader.
///
/// Every segment is exactly `chunk_size` bytes except the last, which holds
/// the remainder. Short reads from the underlying reader are absorbed, so
/// segment boundaries depend only on the file length.
pub struct SegmentReader<R> {
    inner: R,
    chunk_size: usize,
    offset: u64,
    exhausted: bool,
}

impl<R: AsyncRead + Unpin> SegmentReader<R> {
    /// Read the next segment, or `None` once the reader is exhausted
    ///
    /// # Errors
    /// Returns any I/O error from the underlying reader.
    pub async fn next_segment(&mut self) -> io::Result<Option<Vec<u8>>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.inner.read(&mut buf[filled..]).await?;
            if n == 0 {
                self.exhausted = true;
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }

        buf.truncate(filled);
        self.offset += filled as u64;
        Ok(Some(buf))
    }

    /// Bytes read so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Segment size
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}
