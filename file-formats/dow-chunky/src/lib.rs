//! # dow-chunky
//!
//! Reader and writer for the Relic Chunky binary container format used by
//! Warhammer 40,000: Dawn of War.
//!
//! A container starts with a 24-byte prologue (`Relic Chunky\r\n\x1a\0`,
//! version, platform) followed by a sequence of chunks. Every chunk carries
//! an eight-byte type identifier, a version, a size and an optional name.
//! `FOLD` chunks nest further chunks and their size spans the whole subtree;
//! `DATA` chunks carry raw payload bytes. All integers are little-endian.
//!
//! This crate handles the container layer only. Payload schemas for models,
//! textures and team colour patterns live in `dow-whm` and `dow-tex`.
//!
//! ## Usage
//!
//! Inspect the chunk structure of a file:
//!
//! ```no_run
//! use dow_chunky::ChunkyFile;
//!
//! let data = std::fs::read("guard_squad.whm")?;
//! let file = ChunkyFile::from_bytes(&data)?;
//! for chunk in &file.chunks {
//!     println!("{} v{} {}", chunk.id, chunk.version, chunk.name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Stream chunks without materializing the tree:
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! use dow_chunky::{ChunkId, ChunkReader, ReadExt};
//!
//! let mut reader = ChunkReader::open(BufReader::new(File::open("guard_squad.whm")?))?;
//! let root = reader.expect(ChunkId::fold(b"RSGM"))?;
//! let end = reader.chunk_end(&root)?;
//! while let Some(header) = reader.read_header_within(end)? {
//!     println!("{}: {} bytes", header.id, header.size);
//!     reader.skip_chunk(&header)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod header;
mod io_ext;
mod reader;
mod tree;
mod writer;

pub use error::{ChunkyError, Result};
pub use header::{
    ChunkHeader, ChunkId, ChunkKind, FileHeader, CONTAINER_VERSION, MAGIC, PLATFORM_PC,
};
pub use io_ext::{ReadExt, WriteExt};
pub use reader::ChunkReader;
pub use tree::{Chunk, ChunkBody, ChunkyFile};
pub use writer::ChunkWriter;
