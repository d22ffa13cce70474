use propstore_core::PropertyError;
use thiserror::Error;

/// Errors that can occur while writing or reading a propstore stream
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The next chunk in the stream does not have the expected id
    #[error("Unexpected chunk in stream: expected chunk {expected:#x}, found {found:#x}")]
    ChunkMismatch { expected: u32, found: u32 },

    /// A stored data type name does not resolve to a data type of the running build
    #[error("Stored data type '{0}' is not supported by this build")]
    UnknownDataType(String),

    #[error("Stream contains a string that is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The file was written by a newer version of the format
    #[error("Unsupported file format version {0}")]
    UnsupportedVersion(u32),

    /// Structurally invalid stream content, e.g. a length that exceeds its enclosing chunk
    #[error("Corrupt property stream: {0}")]
    Corrupt(String),

    /// The stream content is well-formed, but violates a property or container invariant
    #[error(transparent)]
    Property(#[from] PropertyError),
}

pub type Result<T> = std::result::Result<T, StreamError>;
