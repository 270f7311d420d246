//! Timestamp rendering for file metadata.
//!
//! Timestamps are RFC 3339 in UTC with second precision, e.g.
//! `2024-05-01T12:00:00Z`.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::Metadata;
use std::io;
use std::time::SystemTime;

/// Render a system time as RFC 3339 (UTC, seconds)
#[must_use]
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Creation and modification times of a file, already rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTimes {
    /// Creation (birth) time
    pub created: String,
    /// Last modification time
    pub modified: String,
}

impl FileTimes {
    /// Extract times from filesystem metadata.
    ///
    /// Platforms or filesystems without a birth time report the
    /// modification time for both fields.
    ///
    /// # Errors
    /// Returns the I/O error if the modification time is unavailable.
    pub fn from_metadata(metadata: &Metadata) -> io::Result<Self> {
        let modified = metadata.modified()?;
        let created = metadata.created().unwrap_or(modified);

        Ok(Self {
            created: format_timestamp(created),
            modified: format_timestamp(modified),
        })
    }
}
