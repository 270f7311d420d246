//! Metadata lookup.

use crate::error::Result;
use filestream_core::{FileMetadata, FileRequest};
use filestream_files::{FileTimes, StorageRoot};

/// Reports size and timestamps of stored files
#[derive(Debug, Clone)]
pub struct MetadataLookup {
    root: StorageRoot,
}

impl MetadataLookup {
    /// Create a lookup over `root`
    #[must_use]
    pub fn new(root: StorageRoot) -> Self {
        Self { root }
    }

    /// Look up the requested file
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if the file does not exist or is not
    /// a regular file.
    pub async fn lookup(&self, request: &FileRequest) -> Result<FileMetadata> {
        let metadata = self.root.stat(&request.file_name).await?;
        let times = FileTimes::from_metadata(&metadata)?;

        Ok(FileMetadata {
            file_name: request.file_name.clone(),
            size: metadata.len(),
            created_at: times.created,
            modified_at: times.modified,
        })
    }
}
