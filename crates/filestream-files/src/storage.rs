//! Flat storage root.
//!
//! All stored files live directly under one directory and are addressed by
//! name. A file's on-disk name equals its requested name verbatim; names are
//! only checked to be flat (no separators, no `.`/`..`). Concurrent writers
//! to the same name are not serialized.

use crate::partial::PartialFile;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// File name is empty or not a single flat entry
    #[error("invalid file name {name:?}: {reason}")]
    InvalidName {
        /// Offending name
        name: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// File does not exist under the storage root
    #[error("file not found: {0}")]
    NotFound(String),

    /// Any other I/O failure
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Check that `name` denotes a single flat entry
///
/// # Errors
/// Returns `StorageError::InvalidName` for empty names, `.`/`..`, and names
/// containing path separators or NUL bytes.
pub fn validate_file_name(name: &str) -> Result<(), StorageError> {
    let reason = if name.is_empty() {
        "empty name"
    } else if name == "." || name == ".." {
        "relative directory reference"
    } else if name.contains(['/', '\\']) {
        "contains a path separator"
    } else if name.contains('\0') {
        "contains a NUL byte"
    } else {
        return Ok(());
    };

    Err(StorageError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// The directory under which all files are addressed by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    root: PathBuf,
}

impl StorageRoot {
    /// Use `root` as the storage directory
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Storage directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create the storage directory if it does not exist
    ///
    /// # Errors
    /// Returns the I/O error if the directory cannot be created.
    pub async fn ensure_exists(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Resolve a file name to its path under the root
    ///
    /// # Errors
    /// Returns `StorageError::InvalidName` if the name is not flat.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_file_name(name)?;
        Ok(self.root.join(name))
    }

    /// Create or truncate `name` for writing
    ///
    /// # Errors
    /// Returns `StorageError` if the name is invalid or the file cannot be
    /// opened.
    pub async fn create(&self, name: &str) -> Result<PartialFile, StorageError> {
        let path = self.resolve(name)?;
        Ok(PartialFile::create(path).await?)
    }

    /// Open an existing file for reading
    ///
    /// # Errors
    /// Returns `StorageError::NotFound` if `name` does not exist or is not a
    /// regular file.
    pub async fn open(&self, name: &str) -> Result<File, StorageError> {
        let path = self.resolve(name)?;
        let file = File::open(&path)
            .await
            .map_err(|e| not_found_or_io(name, e))?;

        if !file.metadata().await?.is_file() {
            return Err(StorageError::NotFound(name.to_string()));
        }
        Ok(file)
    }

    /// Stat an existing regular file
    ///
    /// # Errors
    /// Returns `StorageError::NotFound` if `name` does not exist or is not a
    /// regular file.
    pub async fn stat(&self, name: &str) -> Result<Metadata, StorageError> {
        let path = self.resolve(name)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| not_found_or_io(name, e))?;

        if !metadata.is_file() {
            return Err(StorageError::NotFound(name.to_string()));
        }
        Ok(metadata)
    }
}

fn not_found_or_io(name: &str, e: io::Error) -> StorageError {
    if e.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(name.to_string())
    } else {
        StorageError::Io(e)
    }
}
