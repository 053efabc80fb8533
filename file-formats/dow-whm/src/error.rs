use thiserror::Error;

use dow_chunky::ChunkId;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, WhmError>;

/// Errors that can occur when reading or writing model containers
#[derive(Debug, Error)]
pub enum WhmError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container-layer error
    #[error(transparent)]
    Chunky(#[from] dow_chunky::ChunkyError),

    /// Texture-layer error
    #[error(transparent)]
    Tex(#[from] dow_tex::TexError),

    /// A chunk the schema requires is absent
    #[error("missing required chunk {0}")]
    MissingChunk(&'static str),

    /// A bone reference points outside the skeleton
    #[error("bone index {index} out of range, skeleton has {count} bones")]
    BoneIndexOutOfRange {
        /// The referenced index
        index: i64,
        /// Bones actually present
        count: usize,
    },

    /// A skinned vertex names a bone the wire format cannot address
    #[error("mesh {mesh} is weighted to bone {bone}, only the first 256 bones can be skinned to")]
    BoneNotAddressable {
        /// The offending mesh
        mesh: String,
        /// Name of the bone, or its global index when it has no name
        bone: String,
    },

    /// Animation channel record with a mode discriminator this library
    /// does not know
    #[error("unknown animation channel mode {0}")]
    UnknownChannelMode(i32),

    /// UV animation record type outside the known set
    #[error("unknown UV animation record type {0}")]
    UnknownUvRecordType(i32),

    /// The root folder chunk is missing or not a model root
    #[error("expected a FOLDRSGM model root, found {0}")]
    NotAModelRoot(ChunkId),
}
