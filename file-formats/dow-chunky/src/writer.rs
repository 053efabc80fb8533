//! Streaming chunk writer.
//!
//! Chunk sizes are not known until a chunk is finished, so
//! [`ChunkWriter`] writes a zero size field when a chunk is opened and
//! patches it on [`ChunkWriter::end_chunk`] by seeking back. Chunks nest
//! through a stack of open chunks; payload bytes go through the writer's
//! [`Write`] impl and are only legal while a data chunk is open.

use std::io::{Seek, SeekFrom, Write};

use crate::error::{ChunkyError, Result};
use crate::header::{ChunkHeader, ChunkId, FileHeader};
use crate::io_ext::WriteExt;

struct OpenChunk {
    id: ChunkId,
    /// Offset of the size field to patch
    size_field: u64,
    /// Offset of the first content byte
    content_start: u64,
}

/// Writer producing a Relic Chunky container
pub struct ChunkWriter<W: Write + Seek> {
    inner: W,
    stack: Vec<OpenChunk>,
}

impl<W: Write + Seek> ChunkWriter<W> {
    /// Start a container by writing the prologue
    pub fn create(mut inner: W, file_header: FileHeader) -> Result<Self> {
        file_header.write(&mut inner)?;
        Ok(Self {
            inner,
            stack: Vec::new(),
        })
    }

    /// Open a chunk.
    ///
    /// Folder chunks may nest further chunks, data chunks take payload
    /// bytes. Opening a chunk inside a data chunk is an error.
    pub fn begin_chunk(&mut self, id: ChunkId, version: u32, name: &str) -> Result<()> {
        if let Some(open) = self.stack.last() {
            if open.id.is_data() {
                return Err(ChunkyError::ChildOfDataChunk(open.id));
            }
        }
        let start = self.inner.stream_position()?;
        ChunkHeader {
            id,
            version,
            size: 0,
            name: name.to_string(),
        }
        .write(&mut self.inner)?;
        let content_start = self.inner.stream_position()?;
        self.stack.push(OpenChunk {
            id,
            // id and version precede the size field
            size_field: start + 12,
            content_start,
        });
        Ok(())
    }

    /// Close the innermost open chunk and patch its size field
    pub fn end_chunk(&mut self) -> Result<()> {
        let open = self.stack.pop().ok_or(ChunkyError::NoOpenChunk)?;
        let end = self.inner.stream_position()?;
        let size = u32::try_from(end - open.content_start).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("chunk {} exceeds 4 GiB", open.id),
            )
        })?;
        self.inner.seek(SeekFrom::Start(open.size_field))?;
        self.inner.write_u32_le(size)?;
        self.inner.seek(SeekFrom::Start(end))?;
        Ok(())
    }

    /// Identifier of the innermost open chunk
    pub fn current_chunk(&self) -> Option<ChunkId> {
        self.stack.last().map(|open| open.id)
    }

    /// Finish the container, requiring every chunk to be closed
    pub fn finish(mut self) -> Result<W> {
        if let Some(open) = self.stack.last() {
            return Err(ChunkyError::UnclosedChunk(open.id));
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write + Seek> Write for ChunkWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.stack.last() {
            Some(open) if open.id.is_data() => self.inner.write(buf),
            Some(open) => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("folder chunk {} holds no payload bytes", open.id),
            )),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "payload bytes outside any chunk",
            )),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
