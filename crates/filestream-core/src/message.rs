//! Protocol messages and their mapping onto frames.
//!
//! Payload bodies are `bincode`-encoded; the frame type selects which
//! message body follows the header.

use crate::error::FrameError;
use crate::frame::{Frame, FrameType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One ordered unit of file bytes tagged with the file it belongs to.
///
/// Chunks carry no sequence number: the order in which they travel over a
/// channel is the order in which their contents are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Segment bytes. Sized by the sender's chunk-size hint, never enforced.
    pub content: Vec<u8>,
    /// Name of the file this chunk belongs to
    pub file_name: String,
}

impl Chunk {
    /// Create a chunk
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            content,
            file_name: file_name.into(),
        }
    }

    /// Number of content bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// True if the chunk carries no content
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Names a stored file for download or metadata lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRequest {
    /// Flat file name under the storage root
    pub file_name: String,
}

impl FileRequest {
    /// Create a request for `file_name`
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

/// Outcome of an upload, produced once when the chunk stream closes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadStatus {
    /// Whether the file was stored
    pub success: bool,
    /// Human-readable summary
    pub message: String,
}

impl UploadStatus {
    /// Successful status for an upload of `bytes` bytes
    #[must_use]
    pub fn received(bytes: u64) -> Self {
        Self {
            success: true,
            message: format!("Received {bytes} bytes"),
        }
    }
}

/// Size and timestamps of a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// File name as requested
    pub file_name: String,
    /// Size in bytes
    pub size: u64,
    /// Creation time, RFC 3339
    pub created_at: String,
    /// Last modification time, RFC 3339
    pub modified_at: String,
}

/// Status codes a server reports when a call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Code {
    /// Request was malformed (empty or non-flat file name, bad call)
    InvalidArgument,
    /// Requested file does not exist
    NotFound,
    /// Server-side I/O or channel failure
    Internal,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Code::InvalidArgument => "invalid argument",
            Code::NotFound => "not found",
            Code::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Terminal failure record sent in place of a normal reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Failure category
    pub code: Code,
    /// Detail message
    pub message: String,
}

impl Status {
    /// Create a status
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// `NotFound` status
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    /// `Internal` status
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    /// `InvalidArgument` status
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        self.code == Code::NotFound
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// The operation a connection was opened for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Call {
    /// Client-streaming upload
    Upload,
    /// Server-streaming download
    Download(FileRequest),
    /// Single request/response metadata lookup
    GetMetadata(FileRequest),
}

impl Call {
    /// RPC method name
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Call::Upload => "Upload",
            Call::Download(_) => "Download",
            Call::GetMetadata(_) => "GetMetadata",
        }
    }
}

/// Any message that can travel in a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Call initiation
    Open(Call),
    /// File content
    Chunk(Chunk),
    /// End of a chunk stream
    End,
    /// Upload reply
    UploadStatus(UploadStatus),
    /// Metadata reply
    Metadata(FileMetadata),
    /// Failure reply
    Status(Status),
}

impl Message {
    /// Frame type carrying this message
    pub fn frame_type(&self) -> FrameType {
        match self {
            Message::Open(_) => FrameType::Open,
            Message::Chunk(_) => FrameType::Chunk,
            Message::End => FrameType::End,
            Message::UploadStatus(_) => FrameType::UploadStatus,
            Message::Metadata(_) => FrameType::Metadata,
            Message::Status(_) => FrameType::Status,
        }
    }

    /// Encode into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let payload = match self {
            Message::Open(call) => bincode::serialize(call)?,
            Message::Chunk(chunk) => bincode::serialize(chunk)?,
            Message::End => return Ok(Frame::empty(FrameType::End)),
            Message::UploadStatus(status) => bincode::serialize(status)?,
            Message::Metadata(metadata) => bincode::serialize(metadata)?,
            Message::Status(status) => bincode::serialize(status)?,
        };
        Frame::new(self.frame_type(), payload)
    }

    /// Decode from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        let payload = frame.payload();
        let message = match frame.frame_type() {
            FrameType::Reserved => return Err(FrameError::ReservedFrameType),
            FrameType::Open => Message::Open(bincode::deserialize(payload)?),
            FrameType::Chunk => Message::Chunk(bincode::deserialize(payload)?),
            FrameType::End => Message::End,
            FrameType::UploadStatus => Message::UploadStatus(bincode::deserialize(payload)?),
            FrameType::Metadata => Message::Metadata(bincode::deserialize(payload)?),
            FrameType::Status => Message::Status(bincode::deserialize(payload)?),
        };
        Ok(message)
    }
}
