use thiserror::Error;

use crate::header::ChunkId;

/// Result type for Relic Chunky operations
pub type Result<T> = std::result::Result<T, ChunkyError>;

/// Errors that can occur when reading or writing Relic Chunky containers
#[derive(Debug, Error)]
pub enum ChunkyError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file magic
    #[error("invalid file magic: expected \"Relic Chunky\", found {found:?}")]
    InvalidMagic {
        /// The bytes actually present at the start of the file
        found: [u8; 16],
    },

    /// Container format version this library does not understand
    #[error("unsupported container version {0}")]
    UnsupportedContainerVersion(u32),

    /// Chunk version this library has no decoder for
    #[error("unsupported version {version} for chunk {id}")]
    UnsupportedVersion {
        /// Chunk type identifier
        id: ChunkId,
        /// Version found in the chunk header
        version: u32,
    },

    /// Unexpected end of file
    #[error("unexpected end of file")]
    UnexpectedEof,

    /// Chunk type identifier does not start with FOLD or DATA
    #[error("invalid chunk kind {found:?}")]
    InvalidChunkKind {
        /// First four bytes of the type identifier
        found: [u8; 4],
    },

    /// Declared chunk size does not match the encoded content
    #[error("chunk {id} declares {declared} bytes but content spans {actual}")]
    SizeMismatch {
        /// Chunk type identifier
        id: ChunkId,
        /// Size from the chunk header
        declared: u32,
        /// Bytes actually consumed or produced
        actual: u64,
    },

    /// A specific chunk was required at this position
    #[error("expected chunk {expected}, found {found}")]
    UnexpectedChunk {
        /// The chunk the schema requires here
        expected: ChunkId,
        /// The chunk actually present
        found: ChunkId,
    },

    /// A length-prefixed string or chunk name is not valid UTF-8
    #[error("string data is not valid UTF-8")]
    InvalidString,

    /// Attempted to open a child chunk under a data chunk
    #[error("data chunk {0} cannot contain child chunks")]
    ChildOfDataChunk(ChunkId),

    /// `end_chunk` was called with no chunk open
    #[error("no chunk is open")]
    NoOpenChunk,

    /// The writer was finished while chunks were still open
    #[error("chunk {0} was never closed")]
    UnclosedChunk(ChunkId),
}

impl ChunkyError {
    /// Whether this error indicates a structurally broken container rather
    /// than an unknown-but-well-formed one.
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::InvalidMagic { .. }
            | Self::UnexpectedEof
            | Self::InvalidChunkKind { .. }
            | Self::SizeMismatch { .. }
            | Self::InvalidString => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}
