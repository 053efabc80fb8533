use thiserror::Error;

/// Result type for texture operations
pub type Result<T> = std::result::Result<T, TexError>;

/// Errors that can occur when reading or writing texture containers
#[derive(Debug, Error)]
pub enum TexError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container-layer error
    #[error(transparent)]
    Chunky(#[from] dow_chunky::ChunkyError),

    /// A chunk the schema requires is absent
    #[error("missing required chunk {0}")]
    MissingChunk(String),

    /// The byte stream is not a DDS file
    #[error("not a DDS file")]
    NotDds,

    /// DDS compression this library does not handle
    #[error("unsupported DDS fourCC {}", String::from_utf8_lossy(.0))]
    UnknownFourCc([u8; 4]),

    /// Image format id in a DATAATTR chunk this library does not know
    #[error("unknown image format {0}")]
    UnknownImageFormat(u32),

    /// Image type id in a DATAHEAD chunk this library does not know
    #[error("unknown image type {0}")]
    UnknownImageType(u32),

    /// Team colour layer id outside the known set
    #[error("unknown team colour layer id {0}")]
    UnknownPatternLayer(u32),

    /// The byte stream is not an uncompressed TGA file this library handles
    #[error("unsupported TGA image type {0}")]
    UnsupportedTga(u8),

    /// Pixel data does not match the declared dimensions
    #[error("{name} image holds {actual} bytes, dimensions require {expected}")]
    ImageSize {
        /// Which image is malformed
        name: String,
        /// Bytes the declared dimensions require
        expected: usize,
        /// Bytes actually present
        actual: usize,
    },
}
