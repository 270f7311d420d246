//! Chunk channel contract.
//!
//! A chunk channel is an ordered, lossless, one-directional conduit of
//! [`Chunk`] values for the lifetime of a single call. Receivers observe
//! chunks in exactly the order they were sent. Logical end-of-stream is
//! reported as `Ok(None)` and is always distinct from delivery failure,
//! which is reported as an `Err` and is terminal for the call.
//!
//! Two implementations exist: the in-process [`chunk_channel`] defined here,
//! and [`FramedStream`](crate::transport::FramedStream) over any byte
//! stream.

use crate::error::{ChannelError, ChannelResult};
use crate::message::Chunk;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Receiving end of a chunk channel
#[async_trait]
pub trait ChunkSource: Send {
    /// Receive the next chunk.
    ///
    /// Returns `Ok(None)` once the sender has signalled end-of-stream.
    ///
    /// # Errors
    /// Returns `ChannelError` if the stream failed or the peer went away
    /// without signalling end-of-stream.
    async fn recv_chunk(&mut self) -> ChannelResult<Option<Chunk>>;
}

/// Sending end of a chunk channel
#[async_trait]
pub trait ChunkSink: Send {
    /// Send one chunk. May wait on transport backpressure.
    ///
    /// # Errors
    /// Returns `ChannelError` if the chunk cannot be delivered.
    async fn send_chunk(&mut self, chunk: Chunk) -> ChannelResult<()>;

    /// Signal logical end-of-stream. No chunk may be sent afterwards.
    ///
    /// # Errors
    /// Returns `ChannelError` if the end marker cannot be delivered.
    async fn finish(&mut self) -> ChannelResult<()>;
}

enum Delivery {
    Chunk(Chunk),
    End,
    Failed(ChannelError),
}

/// Create an in-process chunk channel holding at most `capacity` undelivered
/// chunks. Senders wait when the buffer is full.
pub fn chunk_channel(capacity: usize) -> (ChunkSender, ChunkReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        ChunkSender { tx: Some(tx) },
        ChunkReceiver {
            rx,
            finished: false,
        },
    )
}

/// Sending half of [`chunk_channel`].
///
/// Dropping the sender without calling [`ChunkSink::finish`] is observed by
/// the receiver as [`ChannelError::Closed`].
pub struct ChunkSender {
    tx: Option<mpsc::Sender<Delivery>>,
}

impl ChunkSender {
    /// Terminate the stream with a delivery failure
    pub async fn fail(mut self, error: ChannelError) {
        if let Some(tx) = self.tx.take() {
            // Receiver may already be gone; nothing left to report to.
            let _ = tx.send(Delivery::Failed(error)).await;
        }
    }

    /// True once `finish` has been called
    pub fn is_finished(&self) -> bool {
        self.tx.is_none()
    }
}

#[async_trait]
impl ChunkSink for ChunkSender {
    async fn send_chunk(&mut self, chunk: Chunk) -> ChannelResult<()> {
        let tx = self.tx.as_ref().ok_or(ChannelError::Unexpected("chunk after end"))?;
        tx.send(Delivery::Chunk(chunk))
            .await
            .map_err(|_| ChannelError::Closed)
    }

    async fn finish(&mut self) -> ChannelResult<()> {
        match self.tx.take() {
            Some(tx) => tx
                .send(Delivery::End)
                .await
                .map_err(|_| ChannelError::Closed),
            None => Ok(()),
        }
    }
}

/// Receiving half of [`chunk_channel`]
pub struct ChunkReceiver {
    rx: mpsc::Receiver<Delivery>,
    finished: bool,
}

#[async_trait]
impl ChunkSource for ChunkReceiver {
    async fn recv_chunk(&mut self) -> ChannelResult<Option<Chunk>> {
        if self.finished {
            return Ok(None);
        }

        match self.rx.recv().await {
            Some(Delivery::Chunk(chunk)) => Ok(Some(chunk)),
            Some(Delivery::End) => {
                self.finished = true;
                Ok(None)
            }
            Some(Delivery::Failed(error)) => Err(error),
            None => Err(ChannelError::Closed),
        }
    }
}
