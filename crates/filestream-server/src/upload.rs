//! Upload session state machine.
//!
//! An upload consumes a stream of chunks and ends in exactly one of two
//! terminal phases:
//!
//! ```text
//!  AwaitingFirstChunk --chunk--> Receiving --chunk--> Receiving
//!          |                        |
//!          |end                     |end
//!          v                        v
//!      Finalized <------------------+
//!
//!  any non-terminal phase --failure--> Aborted
//! ```
//!
//! The destination is named by the first chunk. Names carried by later
//! chunks are ignored. A destination opened by the session is removed again
//! if the session is aborted or dropped before finalizing.

use crate::error::{Result, ServiceError};
use filestream_core::{Chunk, ChunkSource, UploadStatus};
use filestream_files::{PartialFile, StorageRoot};

/// Upload session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadPhase {
    /// No chunk received yet
    AwaitingFirstChunk,
    /// Destination open, appending chunk contents
    Receiving,
    /// End of stream seen, destination complete
    Finalized,
    /// Session failed, destination removed
    Aborted,
}

impl UploadPhase {
    /// Returns true for `Finalized` and `Aborted`
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadPhase::Finalized | UploadPhase::Aborted)
    }
}

/// Input to an upload session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// Next chunk of the stream
    Chunk(Chunk),
    /// Client closed its side normally
    EndOfStream,
}

/// Server-side state of one upload call
#[derive(Debug)]
pub struct UploadSession {
    root: StorageRoot,
    phase: UploadPhase,
    file_name: Option<String>,
    destination: Option<PartialFile>,
    bytes_received: u64,
    chunks_received: u64,
}

impl UploadSession {
    /// Start a session that stores into `root`
    #[must_use]
    pub fn new(root: StorageRoot) -> Self {
        Self {
            root,
            phase: UploadPhase::AwaitingFirstChunk,
            file_name: None,
            destination: None,
            bytes_received: 0,
            chunks_received: 0,
        }
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    /// Destination name, once the first chunk has arrived
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Content bytes written so far
    #[must_use]
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Chunks accepted so far
    #[must_use]
    pub fn chunks_received(&self) -> u64 {
        self.chunks_received
    }

    /// Check if a transition to `to` is valid
    #[must_use]
    pub fn can_transition(&self, to: UploadPhase) -> bool {
        matches!(
            (self.phase, to),
            (
                UploadPhase::AwaitingFirstChunk | UploadPhase::Receiving,
                UploadPhase::Receiving | UploadPhase::Finalized | UploadPhase::Aborted,
            )
        )
    }

    fn transition_to(&mut self, to: UploadPhase) -> Result<()> {
        if !self.can_transition(to) {
            return Err(ServiceError::InvalidState("upload already completed"));
        }

        let from = self.phase;
        self.phase = to;
        if from != to {
            tracing::debug!("Upload phase transition: {:?} -> {:?}", from, to);
        }
        Ok(())
    }

    /// Feed one event into the session.
    ///
    /// Returns `Some(status)` once the stream has ended and the destination
    /// is complete. Any error aborts the session.
    ///
    /// # Errors
    /// Returns `ServiceError::InvalidArgument` if the first chunk names an
    /// invalid file, `ServiceError::Io` on write failure, and
    /// `ServiceError::InvalidState` for events after a terminal phase.
    pub async fn apply(&mut self, event: UploadEvent) -> Result<Option<UploadStatus>> {
        let result = match event {
            UploadEvent::Chunk(chunk) => self.on_chunk(chunk).await.map(|()| None),
            UploadEvent::EndOfStream => self.on_end().await.map(Some),
        };

        if result.is_err() && !self.phase.is_terminal() {
            self.abort();
        }
        result
    }

    async fn on_chunk(&mut self, chunk: Chunk) -> Result<()> {
        let Chunk { content, file_name } = chunk;

        match self.phase {
            UploadPhase::AwaitingFirstChunk => {
                let destination = self.root.create(&file_name).await?;
                self.transition_to(UploadPhase::Receiving)?;
                tracing::debug!(file = %file_name, "Upload destination opened");
                self.file_name = Some(file_name);
                self.destination = Some(destination);
            }
            UploadPhase::Receiving => {
                if self.file_name.as_deref() != Some(file_name.as_str()) {
                    tracing::debug!(
                        expected = ?self.file_name,
                        got = %file_name,
                        "Ignoring file name on subsequent chunk"
                    );
                }
            }
            UploadPhase::Finalized | UploadPhase::Aborted => {
                return Err(ServiceError::InvalidState("chunk after upload completed"));
            }
        }

        let destination = self
            .destination
            .as_mut()
            .ok_or(ServiceError::InvalidState("no upload destination"))?;
        destination.write_all(&content).await?;

        self.bytes_received += content.len() as u64;
        self.chunks_received += 1;
        Ok(())
    }

    async fn on_end(&mut self) -> Result<UploadStatus> {
        match self.phase {
            UploadPhase::AwaitingFirstChunk => {}
            UploadPhase::Receiving => {
                let destination = self
                    .destination
                    .take()
                    .ok_or(ServiceError::InvalidState("no upload destination"))?;
                destination.commit().await?;
            }
            UploadPhase::Finalized | UploadPhase::Aborted => {
                return Err(ServiceError::InvalidState("upload already completed"));
            }
        }

        self.transition_to(UploadPhase::Finalized)?;
        Ok(UploadStatus::received(self.bytes_received))
    }

    /// Abort the session, removing any partially written destination
    pub fn abort(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        // Dropping the partial file removes it from storage.
        self.destination.take();
        self.phase = UploadPhase::Aborted;
        tracing::debug!(
            file = ?self.file_name,
            bytes = self.bytes_received,
            "Upload aborted"
        );
    }

    /// Drive the session from `source` until the stream ends or fails
    ///
    /// # Errors
    /// Returns `ServiceError::Channel` if the source fails before end of
    /// stream, or any error produced by [`UploadSession::apply`]. The
    /// destination is removed in both cases.
    pub async fn run<S>(&mut self, source: &mut S) -> Result<UploadStatus>
    where
        S: ChunkSource + ?Sized,
    {
        loop {
            let event = match source.recv_chunk().await {
                Ok(Some(chunk)) => UploadEvent::Chunk(chunk),
                Ok(None) => UploadEvent::EndOfStream,
                Err(e) => {
                    self.abort();
                    return Err(e.into());
                }
            };

            if let Some(status) = self.apply(event).await? {
                return Ok(status);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filestream_core::{ChannelError, ChunkSink, chunk_channel};
    use tempfile::TempDir;

    fn session(dir: &TempDir) -> UploadSession {
        UploadSession::new(StorageRoot::new(dir.path()))
    }

    #[test]
    fn test_transition_table() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        assert!(s.can_transition(UploadPhase::Receiving));
        assert!(s.can_transition(UploadPhase::Finalized));
        assert!(!s.can_transition(UploadPhase::AwaitingFirstChunk));

        s.phase = UploadPhase::Finalized;
        assert!(!s.can_transition(UploadPhase::Receiving));
        assert!(!s.can_transition(UploadPhase::Aborted));

        s.phase = UploadPhase::Aborted;
        assert!(!s.can_transition(UploadPhase::Finalized));
    }

    #[tokio::test]
    async fn test_chunks_appended_in_order() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);

        assert_eq!(
            s.apply(UploadEvent::Chunk(Chunk::new("x.bin", b"A".to_vec())))
                .await
                .unwrap(),
            None
        );
        assert_eq!(s.phase(), UploadPhase::Receiving);
        s.apply(UploadEvent::Chunk(Chunk::new("x.bin", b"B".to_vec())))
            .await
            .unwrap();

        let status = s.apply(UploadEvent::EndOfStream).await.unwrap().unwrap();
        assert!(status.success);
        assert_eq!(status.message, "Received 2 bytes");
        assert_eq!(s.phase(), UploadPhase::Finalized);
        assert_eq!(s.chunks_received(), 2);
        assert_eq!(std::fs::read(dir.path().join("x.bin")).unwrap(), b"AB");
    }

    #[tokio::test]
    async fn test_later_names_ignored() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);

        s.apply(UploadEvent::Chunk(Chunk::new("first.txt", b"12".to_vec())))
            .await
            .unwrap();
        s.apply(UploadEvent::Chunk(Chunk::new("other.txt", b"34".to_vec())))
            .await
            .unwrap();
        s.apply(UploadEvent::EndOfStream).await.unwrap();

        assert_eq!(s.file_name(), Some("first.txt"));
        assert_eq!(std::fs::read(dir.path().join("first.txt")).unwrap(), b"1234");
        assert!(!dir.path().join("other.txt").exists());
    }

    #[tokio::test]
    async fn test_zero_chunks_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);

        let status = s.apply(UploadEvent::EndOfStream).await.unwrap().unwrap();
        assert!(status.success);
        assert_eq!(status.message, "Received 0 bytes");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_named_chunk_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);

        s.apply(UploadEvent::Chunk(Chunk::new("empty.dat", Vec::new())))
            .await
            .unwrap();
        let status = s.apply(UploadEvent::EndOfStream).await.unwrap().unwrap();

        assert_eq!(status.message, "Received 0 bytes");
        assert_eq!(std::fs::metadata(dir.path().join("empty.dat")).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_invalid_first_name_aborts() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);

        let err = s
            .apply(UploadEvent::Chunk(Chunk::new("../escape", b"x".to_vec())))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
        assert_eq!(s.phase(), UploadPhase::Aborted);

        let err = s.apply(UploadEvent::EndOfStream).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_event_after_finalize_rejected() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        s.apply(UploadEvent::EndOfStream).await.unwrap();

        let err = s
            .apply(UploadEvent::Chunk(Chunk::new("late.bin", b"x".to_vec())))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(s.phase(), UploadPhase::Finalized);
        assert!(!dir.path().join("late.bin").exists());
    }

    #[tokio::test]
    async fn test_abort_removes_partial_destination() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);

        s.apply(UploadEvent::Chunk(Chunk::new("partial.bin", vec![7; 100])))
            .await
            .unwrap();
        assert!(dir.path().join("partial.bin").exists());

        s.abort();
        assert_eq!(s.phase(), UploadPhase::Aborted);
        assert!(!dir.path().join("partial.bin").exists());
    }

    #[tokio::test]
    async fn test_run_until_end() {
        let dir = TempDir::new().unwrap();
        let (mut tx, mut rx) = chunk_channel(4);

        tokio::spawn(async move {
            tx.send_chunk(Chunk::new("run.bin", vec![1; 10])).await.unwrap();
            tx.send_chunk(Chunk::new("run.bin", vec![2; 5])).await.unwrap();
            tx.finish().await.unwrap();
        });

        let status = session(&dir).run(&mut rx).await.unwrap();
        assert_eq!(status.message, "Received 15 bytes");
        assert_eq!(std::fs::metadata(dir.path().join("run.bin")).unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_run_source_failure_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let (mut tx, mut rx) = chunk_channel(4);

        tokio::spawn(async move {
            tx.send_chunk(Chunk::new("broken.bin", vec![1; 10])).await.unwrap();
            tx.fail(ChannelError::Closed).await;
        });

        let err = session(&dir).run(&mut rx).await.unwrap_err();
        assert!(matches!(err, ServiceError::Channel(ChannelError::Closed)));
        assert!(!dir.path().join("broken.bin").exists());
    }

    #[tokio::test]
    async fn test_dropped_session_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        s.apply(UploadEvent::Chunk(Chunk::new("dropped.bin", vec![3; 8])))
            .await
            .unwrap();
        drop(s);
        assert!(!dir.path().join("dropped.bin").exists());
    }
}
