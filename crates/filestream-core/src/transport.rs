//! Framed message transport over an async byte stream.
//!
//! [`FramedStream`] turns any `AsyncRead + AsyncWrite` stream (a TCP
//! connection, an in-memory duplex pipe) into a sequence of protocol
//! [`Message`]s and implements both halves of the chunk channel contract
//! on top of it.

use crate::FRAME_HEADER_SIZE;
use crate::channel::{ChunkSink, ChunkSource};
use crate::error::{ChannelError, ChannelResult};
use crate::frame::{Frame, FrameHeader};
use crate::message::{Chunk, Message};
use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Per-connection frame statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Total bytes sent, headers included
    pub bytes_sent: u64,
    /// Total bytes received, headers included
    pub bytes_received: u64,
    /// Frames sent
    pub frames_sent: u64,
    /// Frames received
    pub frames_received: u64,
}

impl TransportStats {
    /// Record a sent frame
    pub fn record_send(&mut self, bytes: usize) {
        self.bytes_sent += bytes as u64;
        self.frames_sent += 1;
    }

    /// Record a received frame
    pub fn record_recv(&mut self, bytes: usize) {
        self.bytes_received += bytes as u64;
        self.frames_received += 1;
    }
}

/// Message-oriented wrapper around a byte stream.
///
/// One `FramedStream` carries exactly one call.
pub struct FramedStream<S> {
    stream: S,
    stats: TransportStats,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            stats: TransportStats::default(),
        }
    }

    /// Read the next message.
    ///
    /// Returns `Ok(None)` if the peer closed the stream cleanly at a frame
    /// boundary.
    ///
    /// # Errors
    /// Returns `ChannelError::Io` if the stream fails or ends inside a frame,
    /// and `ChannelError::Frame` if the frame cannot be decoded.
    pub async fn read_message(&mut self) -> ChannelResult<Option<Message>> {
        let mut header_buf = [0u8; FRAME_HEADER_SIZE];
        let mut filled = 0;
        while filled < FRAME_HEADER_SIZE {
            let n = self.stream.read(&mut header_buf[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            filled += n;
        }

        let header = FrameHeader::parse(&header_buf)?;
        let mut payload = vec![0u8; header.payload_len()];
        self.stream.read_exact(&mut payload).await?;

        let frame = Frame::new(header.frame_type(), payload)?;
        self.stats.record_recv(frame.encoded_len());
        tracing::trace!(
            frame = frame.frame_type().name(),
            len = frame.payload().len(),
            "frame received"
        );

        Ok(Some(Message::from_frame(&frame)?))
    }

    /// Read the next message, treating a clean close as a failure
    ///
    /// # Errors
    /// Returns `ChannelError::Closed` if the peer closed the stream.
    pub async fn expect_message(&mut self) -> ChannelResult<Message> {
        self.read_message().await?.ok_or(ChannelError::Closed)
    }

    /// Write one message and flush it to the stream
    ///
    /// # Errors
    /// Returns `ChannelError` if encoding or the write fails.
    pub async fn write_message(&mut self, message: &Message) -> ChannelResult<()> {
        let frame = message.to_frame()?;
        let bytes = frame.encode();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.stats.record_send(bytes.len());
        tracing::trace!(
            frame = frame.frame_type().name(),
            len = frame.payload().len(),
            "frame sent"
        );
        Ok(())
    }

    /// Shut down the write half of the stream
    ///
    /// # Errors
    /// Returns `ChannelError::Io` if the shutdown fails.
    pub async fn shutdown(&mut self) -> ChannelResult<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Frame statistics for this connection
    pub fn stats(&self) -> &TransportStats {
        &self.stats
    }
}

#[async_trait]
impl<S> ChunkSource for FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn recv_chunk(&mut self) -> ChannelResult<Option<Chunk>> {
        match self.expect_message().await? {
            Message::Chunk(chunk) => Ok(Some(chunk)),
            Message::End => Ok(None),
            Message::Status(status) => Err(ChannelError::Status(status)),
            other => Err(ChannelError::Unexpected(other.frame_type().name())),
        }
    }
}

#[async_trait]
impl<S> ChunkSink for FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_chunk(&mut self, chunk: Chunk) -> ChannelResult<()> {
        self.write_message(&Message::Chunk(chunk)).await
    }

    async fn finish(&mut self) -> ChannelResult<()> {
        self.write_message(&Message::End).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Call, FileRequest, Status};

    #[tokio::test]
    async fn test_message_exchange() {
        let (a, b) = tokio::io::duplex(1024);
        let mut client = FramedStream::new(a);
        let mut server = FramedStream::new(b);

        let open = Message::Open(Call::Download(FileRequest::new("notes.txt")));
        client.write_message(&open).await.unwrap();
        assert_eq!(server.expect_message().await.unwrap(), open);

        assert_eq!(client.stats().frames_sent, 1);
        assert_eq!(server.stats().frames_received, 1);
        assert_eq!(client.stats().bytes_sent, server.stats().bytes_received);
    }

    #[tokio::test]
    async fn test_chunk_stream_over_duplex() {
        let (a, b) = tokio::io::duplex(64);
        let mut sender = FramedStream::new(a);
        let mut receiver = FramedStream::new(b);

        let producer = tokio::spawn(async move {
            for i in 0..10u8 {
                sender.send_chunk(Chunk::new("f", vec![i; 100])).await.unwrap();
            }
            sender.finish().await.unwrap();
        });

        let mut received = Vec::new();
        while let Some(chunk) = receiver.recv_chunk().await.unwrap() {
            received.push(chunk.content[0]);
        }
        producer.await.unwrap();
        assert_eq!(received, (0..10u8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_clean_close_without_end_is_failure() {
        let (a, b) = tokio::io::duplex(64);
        let mut receiver = FramedStream::new(b);
        drop(a);

        assert!(receiver.read_message().await.unwrap().is_none());
        assert!(matches!(
            receiver.recv_chunk().await,
            Err(ChannelError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_close_inside_frame_is_io_error() {
        let (mut a, b) = tokio::io::duplex(64);
        let mut receiver = FramedStream::new(b);
        let bytes = Message::End.to_frame().unwrap().encode();
        a.write_all(&bytes[..3]).await.unwrap();
        drop(a);

        assert!(matches!(
            receiver.read_message().await,
            Err(ChannelError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_status_terminates_chunk_stream() {
        let (a, b) = tokio::io::duplex(256);
        let mut server = FramedStream::new(a);
        let mut client = FramedStream::new(b);

        server
            .write_message(&Message::Status(Status::not_found("gone.bin")))
            .await
            .unwrap();

        let err = client.recv_chunk().await.unwrap_err();
        assert!(err.status().unwrap().is_not_found());
    }

    #[tokio::test]
    async fn test_unexpected_message_in_chunk_stream() {
        let (a, b) = tokio::io::duplex(256);
        let mut peer = FramedStream::new(a);
        let mut local = FramedStream::new(b);

        peer.write_message(&Message::Open(Call::Upload)).await.unwrap();
        assert!(matches!(
            local.recv_chunk().await,
            Err(ChannelError::Unexpected("open"))
        ));
    }
}
