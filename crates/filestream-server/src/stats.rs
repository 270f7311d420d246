//! Server counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live call counters shared by all connection tasks
#[derive(Debug, Default)]
pub struct ServerStats {
    connections: AtomicU64,
    uploads: AtomicU64,
    downloads: AtomicU64,
    metadata_lookups: AtomicU64,
    failed_calls: AtomicU64,
    bytes_received: AtomicU64,
    bytes_sent: AtomicU64,
}

/// Point-in-time copy of [`ServerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Accepted connections
    pub connections: u64,
    /// Completed uploads
    pub uploads: u64,
    /// Completed downloads
    pub downloads: u64,
    /// Completed metadata lookups
    pub metadata_lookups: u64,
    /// Calls that ended with an error status
    pub failed_calls: u64,
    /// File content bytes stored by uploads
    pub bytes_received: u64,
    /// File content bytes streamed by downloads
    pub bytes_sent: u64,
}

impl ServerStats {
    /// Create zeroed counters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_connection(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_upload(&self, bytes: u64) {
        self.uploads.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_download(&self, bytes: u64) {
        self.downloads.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_metadata(&self) {
        self.metadata_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connections: self.connections.load(Ordering::Relaxed),
            uploads: self.uploads.load(Ordering::Relaxed),
            downloads: self.downloads.load(Ordering::Relaxed),
            metadata_lookups: self.metadata_lookups.load(Ordering::Relaxed),
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }
}
