//! Scoped destination files.
//!
//! A [`PartialFile`] owns the handle of a file being written. Unless
//! [`PartialFile::commit`] succeeds, dropping it closes the handle and
//! removes the file, so an aborted or cancelled transfer never leaves a
//! truncated file behind.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// A file under construction, removed on drop unless committed
#[derive(Debug)]
pub struct PartialFile {
    path: PathBuf,
    file: Option<File>,
    written: u64,
}

impl PartialFile {
    /// Create (or truncate) the file at `path`
    ///
    /// # Errors
    /// Returns the I/O error if the file cannot be opened for writing.
    pub async fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Some(file),
            written: 0,
        })
    }

    /// Append `data` at the current end of the file
    ///
    /// # Errors
    /// Returns the I/O error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(closed)?;
        file.write_all(data).await?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush outstanding writes, close the handle and keep the file
    ///
    /// # Errors
    /// Returns the I/O error if flushing fails; the file is then removed.
    pub async fn commit(mut self) -> io::Result<PathBuf> {
        let mut file = self.file.take().ok_or_else(closed)?;
        if let Err(e) = file.flush().await {
            // Put the handle back so Drop closes and removes it
            self.file = Some(file);
            return Err(e);
        }
        drop(file);

        Ok(std::mem::take(&mut self.path))
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        // Committed files leave an empty path behind
        if self.path.as_os_str().is_empty() {
            return;
        }

        self.file.take();
        // Drop cannot await, so the unlink blocks the current worker briefly.
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed partial file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove partial file"
            ),
        }
    }
}

fn closed() -> io::Error {
    io::Error::other("partial file already closed")
}
