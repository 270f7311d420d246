//! Frame encoding and decoding for the Filestream wire protocol.
//!
//! Every message on a connection is one frame: a fixed 8-byte header
//! followed by a length-prefixed payload. All multi-byte fields are
//! big-endian (network byte order).
//!
//! ```text
//! 0      1      2      3      4      5      6      7      8
//! +------+------+------+------+------+------+------+------+------ ...
//! | ver  | type |   reserved  |     payload length (u32)  | payload
//! +------+------+------+------+------+------+------+------+------ ...
//! ```

use crate::error::FrameError;
use crate::{FRAME_HEADER_SIZE, MAX_PAYLOAD_SIZE, PROTOCOL_VERSION};

/// Frame types as defined by the wire protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    /// Reserved (invalid)
    Reserved = 0x00,
    /// Call initiation, selects the operation
    Open = 0x01,
    /// File content tagged with a file name
    Chunk = 0x02,
    /// Logical end of a chunk stream
    End = 0x03,
    /// Upload completion status
    UploadStatus = 0x04,
    /// Metadata lookup reply
    Metadata = 0x05,
    /// Terminal failure status
    Status = 0x06,
}

impl FrameType {
    /// Human-readable name, used in logs and errors
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Reserved => "reserved",
            Self::Open => "open",
            Self::Chunk => "chunk",
            Self::End => "end",
            Self::UploadStatus => "upload-status",
            Self::Metadata => "metadata",
            Self::Status => "status",
        }
    }
}

impl TryFrom<u8> for FrameType {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Err(FrameError::ReservedFrameType),
            0x01 => Ok(Self::Open),
            0x02 => Ok(Self::Chunk),
            0x03 => Ok(Self::End),
            0x04 => Ok(Self::UploadStatus),
            0x05 => Ok(Self::Metadata),
            0x06 => Ok(Self::Status),
            0x07..=0x0F => Err(FrameError::ReservedFrameType),
            _ => Err(FrameError::InvalidFrameType(value)),
        }
    }
}

/// Decoded fixed-size frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    frame_type: FrameType,
    payload_len: usize,
}

impl FrameHeader {
    /// Parse a header from the first [`FRAME_HEADER_SIZE`] bytes of `data`
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        if data.len() < FRAME_HEADER_SIZE {
            return Err(FrameError::TooShort {
                expected: FRAME_HEADER_SIZE,
                actual: data.len(),
            });
        }

        if data[0] != PROTOCOL_VERSION {
            return Err(FrameError::UnsupportedVersion(data[0]));
        }

        let frame_type = FrameType::try_from(data[1])?;
        let payload_len = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;

        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge(payload_len));
        }

        Ok(Self {
            frame_type,
            payload_len,
        })
    }

    /// Get the frame type
    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    /// Get the payload length announced by the header
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// Serialize the header
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut buf = [0u8; FRAME_HEADER_SIZE];
        buf[0] = PROTOCOL_VERSION;
        buf[1] = self.frame_type as u8;
        // buf[2..4] reserved
        buf[4..8].copy_from_slice(&(self.payload_len as u32).to_be_bytes());
        buf
    }
}

/// An owned protocol frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    frame_type: FrameType,
    payload: Vec<u8>,
}

impl Frame {
    /// Create a frame, rejecting payloads above the transport limit
    pub fn new(frame_type: FrameType, payload: Vec<u8>) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge(payload.len()));
        }
        Ok(Self {
            frame_type,
            payload,
        })
    }

    /// Create a frame with no payload
    pub fn empty(frame_type: FrameType) -> Self {
        Self {
            frame_type,
            payload: Vec::new(),
        }
    }

    /// Parse a complete frame from a buffer. Bytes past the announced
    /// payload are ignored.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        let header = FrameHeader::parse(data)?;
        let end = FRAME_HEADER_SIZE + header.payload_len();

        if end > data.len() {
            return Err(FrameError::PayloadOverflow);
        }

        Ok(Self {
            frame_type: header.frame_type(),
            payload: data[FRAME_HEADER_SIZE..end].to_vec(),
        })
    }

    /// Header describing this frame
    pub fn header(&self) -> FrameHeader {
        FrameHeader {
            frame_type: self.frame_type,
            payload_len: self.payload.len(),
        }
    }

    /// Get the frame type
    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    /// Get the payload slice
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Total encoded size (header + payload)
    pub fn encoded_len(&self) -> usize {
        FRAME_HEADER_SIZE + self.payload.len()
    }

    /// Encode the frame into a byte buffer
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.header().to_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }
}
