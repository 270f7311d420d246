//! Running-server fixture for end-to-end tests
//!
//! Starts a [`Server`] on an ephemeral loopback port with its own temporary
//! storage root, plus separate temporary directories for local source files
//! and downloads.
//!
//! # Example
//!
//! ```no_run
//! use filestream_integration_tests::ServerFixture;
//!
//! # async fn demo() {
//! let fixture = ServerFixture::start().await.unwrap();
//! let path = fixture.write_local("hello.txt", b"hello");
//! fixture.client().upload(&path, None).await.unwrap();
//! fixture.shutdown().await.unwrap();
//! # }
//! ```

use filestream_cli::FileClient;
use filestream_core::FramedStream;
use filestream_files::{DEFAULT_CHUNK_SIZE, StorageRoot};
use filestream_server::{FileService, Server, ServerStats, StatsSnapshot};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A server running in the background for the lifetime of a test
pub struct ServerFixture {
    /// Address the server listens on
    pub addr: SocketAddr,
    storage: TempDir,
    local: TempDir,
    downloads: TempDir,
    stats: Arc<ServerStats>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<io::Result<()>>>,
}

impl ServerFixture {
    /// Start a server emitting default-sized download chunks
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directories or listener cannot be
    /// created.
    pub async fn start() -> io::Result<Self> {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE).await
    }

    /// Start a server emitting `chunk_size` download chunks
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directories or listener cannot be
    /// created.
    pub async fn with_chunk_size(chunk_size: usize) -> io::Result<Self> {
        let storage = TempDir::new()?;
        let local = TempDir::new()?;
        let downloads = TempDir::new()?;

        let stats = Arc::new(ServerStats::new());
        let service = FileService::with_stats(
            StorageRoot::new(storage.path()),
            chunk_size,
            Arc::clone(&stats),
        );
        let server = Server::bind(SocketAddr::from(([127, 0, 0, 1], 0)), service).await?;
        let addr = server.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.run_until(async move {
            let _ = shutdown_rx.await;
        }));

        Ok(Self {
            addr,
            storage,
            local,
            downloads,
            stats,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Client pointed at this server with default upload chunk size
    #[must_use]
    pub fn client(&self) -> FileClient {
        FileClient::new(self.addr.to_string())
    }

    /// Open a raw framed connection to the server
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(&self) -> io::Result<FramedStream<TcpStream>> {
        Ok(FramedStream::new(TcpStream::connect(self.addr).await?))
    }

    /// Server storage directory
    #[must_use]
    pub fn storage_path(&self) -> &Path {
        self.storage.path()
    }

    /// Path of `name` under the server storage directory
    #[must_use]
    pub fn stored(&self, name: &str) -> PathBuf {
        self.storage.path().join(name)
    }

    /// Directory downloads should be written to
    #[must_use]
    pub fn download_dir(&self) -> &Path {
        self.downloads.path()
    }

    /// Write a local source file and return its path
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn write_local(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.local.path().join(name);
        std::fs::write(&path, contents).expect("write local test file");
        path
    }

    /// Current server counters
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Wait until `done` holds for the server counters, up to two seconds
    ///
    /// Returns the last snapshot observed.
    pub async fn wait_for_stats<F>(&self, done: F) -> StatsSnapshot
    where
        F: Fn(&StatsSnapshot) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let snapshot = self.stats();
            if done(&snapshot) || tokio::time::Instant::now() >= deadline {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Stop the server and wait for the accept loop to exit
    ///
    /// # Errors
    ///
    /// Returns the server's error, if any.
    pub async fn shutdown(mut self) -> io::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.handle.take() {
            Some(handle) => handle.await.map_err(io::Error::other)?,
            None => Ok(()),
        }
    }
}

impl Drop for ServerFixture {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
