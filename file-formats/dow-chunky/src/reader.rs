//! Streaming chunk reader.
//!
//! [`ChunkReader`] wraps any `Read + Seek` source, validates the file
//! prologue and hands out [`ChunkHeader`]s one at a time. Payload decoding
//! stays with the caller, which reads payload bytes directly off the reader
//! via [`ReadExt`](crate::ReadExt).
//!
//! Folder chunks count their entire subtree in the header size field, so a
//! folder is iterated by remembering its end offset and pulling headers with
//! [`ChunkReader::read_header_within`] until the offset is reached.

use std::io::{Read, Seek, SeekFrom};

use log::debug;

use crate::error::{ChunkyError, Result};
use crate::header::{ChunkHeader, ChunkId, FileHeader};

/// Reader over a Relic Chunky container
#[derive(Debug)]
pub struct ChunkReader<R> {
    inner: R,
    file_header: FileHeader,
}

impl<R: Read + Seek> ChunkReader<R> {
    /// Open a container, reading and validating the prologue
    pub fn open(mut inner: R) -> Result<Self> {
        let file_header = FileHeader::read(&mut inner)?;
        Ok(Self { inner, file_header })
    }

    /// The prologue read during [`ChunkReader::open`]
    pub fn file_header(&self) -> FileHeader {
        self.file_header
    }

    /// Consume the reader, returning the underlying source
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Current stream offset
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Read the next chunk header, `None` at a clean end of stream
    pub fn read_header(&mut self) -> Result<Option<ChunkHeader>> {
        ChunkHeader::read(&mut self.inner)
    }

    /// Read the next chunk header inside a folder that ends at `end`.
    ///
    /// Returns `None` once the folder content is exhausted. A stream that
    /// ends before `end` is a truncated container.
    pub fn read_header_within(&mut self, end: u64) -> Result<Option<ChunkHeader>> {
        if self.inner.stream_position()? >= end {
            return Ok(None);
        }
        match ChunkHeader::read(&mut self.inner)? {
            Some(header) => Ok(Some(header)),
            None => Err(ChunkyError::UnexpectedEof),
        }
    }

    /// Read the next chunk header and require a specific identifier
    pub fn expect(&mut self, id: ChunkId) -> Result<ChunkHeader> {
        match self.read_header()? {
            Some(header) if header.id == id => Ok(header),
            Some(header) => Err(ChunkyError::UnexpectedChunk {
                expected: id,
                found: header.id,
            }),
            None => Err(ChunkyError::UnexpectedEof),
        }
    }

    /// First offset past the content of the chunk whose header was just read
    pub fn chunk_end(&mut self, header: &ChunkHeader) -> Result<u64> {
        Ok(self.inner.stream_position()? + u64::from(header.size))
    }

    /// Skip the content of the chunk whose header was just read.
    ///
    /// Folder sizes cover the whole subtree, so this works for folders and
    /// data chunks alike.
    pub fn skip_chunk(&mut self, header: &ChunkHeader) -> Result<()> {
        self.inner
            .seek(SeekFrom::Current(i64::from(header.size)))?;
        Ok(())
    }

    /// Settle the stream at the end of a chunk after decoding its content.
    ///
    /// Content the decoder left unread is skipped; a decoder that read past
    /// the declared size means the size field lied.
    pub fn finish_chunk(&mut self, header: &ChunkHeader, end: u64) -> Result<()> {
        let pos = self.inner.stream_position()?;
        if pos > end {
            return Err(ChunkyError::SizeMismatch {
                id: header.id,
                declared: header.size,
                actual: u64::from(header.size) + (pos - end),
            });
        }
        if pos < end {
            debug!(
                "{} bytes of {} left unread, skipping",
                end - pos,
                header.id
            );
            self.inner.seek(SeekFrom::Start(end))?;
        }
        Ok(())
    }
}

impl<R: Read> Read for ChunkReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Seek> Seek for ChunkReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use crate::io_ext::WriteExt;

    use super::*;

    /// Prologue, a FOLDMSGR holding DATADATA (4 bytes) and DATABVOL
    /// (2 bytes), then a top-level DATAMARK (1 byte).
    fn sample_container() -> Vec<u8> {
        let mut buf = Vec::new();
        FileHeader::default().write(&mut buf).unwrap();

        // folder size: two child headers (20 each) plus their payloads
        ChunkHeader {
            id: ChunkId::fold(b"MSGR"),
            version: 1,
            size: 20 + 4 + 20 + 2,
            name: "mesh".to_string(),
        }
        .write(&mut buf)
        .unwrap();
        ChunkHeader {
            id: ChunkId::data(b"DATA"),
            version: 1,
            size: 4,
            name: String::new(),
        }
        .write(&mut buf)
        .unwrap();
        buf.write_u32_le(0xAABBCCDD).unwrap();
        ChunkHeader {
            id: ChunkId::data(b"BVOL"),
            version: 2,
            size: 2,
            name: String::new(),
        }
        .write(&mut buf)
        .unwrap();
        buf.extend_from_slice(&[1, 2]);

        ChunkHeader {
            id: ChunkId::data(b"MARK"),
            version: 1,
            size: 1,
            name: String::new(),
        }
        .write(&mut buf)
        .unwrap();
        buf.push(9);
        buf
    }

    #[test]
    fn test_open_validates_prologue() {
        let reader = ChunkReader::open(Cursor::new(sample_container())).unwrap();
        assert_eq!(reader.file_header(), FileHeader::default());

        let err = ChunkReader::open(Cursor::new(vec![0u8; 32])).unwrap_err();
        assert!(matches!(err, ChunkyError::InvalidMagic { .. }));
    }

    #[test]
    fn test_folder_iteration_is_bounded() {
        let mut reader = ChunkReader::open(Cursor::new(sample_container())).unwrap();
        let folder = reader.expect(ChunkId::fold(b"MSGR")).unwrap();
        assert_eq!(folder.name, "mesh");
        let end = reader.chunk_end(&folder).unwrap();

        let first = reader.read_header_within(end).unwrap().unwrap();
        assert_eq!(first.id, ChunkId::data(b"DATA"));
        reader.skip_chunk(&first).unwrap();

        let second = reader.read_header_within(end).unwrap().unwrap();
        assert_eq!(second.id, ChunkId::data(b"BVOL"));
        reader.skip_chunk(&second).unwrap();

        assert!(reader.read_header_within(end).unwrap().is_none());

        // the sibling after the folder is still intact
        let mark = reader.read_header().unwrap().unwrap();
        assert_eq!(mark.id, ChunkId::data(b"MARK"));
    }

    #[test]
    fn test_skip_chunk_covers_whole_subtree() {
        let mut reader = ChunkReader::open(Cursor::new(sample_container())).unwrap();
        let folder = reader.read_header().unwrap().unwrap();
        reader.skip_chunk(&folder).unwrap();

        let mark = reader.read_header().unwrap().unwrap();
        assert_eq!(mark.id, ChunkId::data(b"MARK"));
        reader.skip_chunk(&mark).unwrap();
        assert!(reader.read_header().unwrap().is_none());
    }

    #[test]
    fn test_expect_mismatch() {
        let mut reader = ChunkReader::open(Cursor::new(sample_container())).unwrap();
        let err = reader.expect(ChunkId::data(b"SSHR")).unwrap_err();
        assert!(matches!(
            err,
            ChunkyError::UnexpectedChunk { expected, found }
                if expected == ChunkId::data(b"SSHR") && found == ChunkId::fold(b"MSGR")
        ));
    }

    #[test]
    fn test_finish_chunk_skips_unread_tail() {
        let mut reader = ChunkReader::open(Cursor::new(sample_container())).unwrap();
        let folder = reader.read_header().unwrap().unwrap();
        let end = reader.chunk_end(&folder).unwrap();
        // decode nothing at all, then settle
        reader.finish_chunk(&folder, end).unwrap();
        let mark = reader.read_header().unwrap().unwrap();
        assert_eq!(mark.id, ChunkId::data(b"MARK"));
    }

    #[test]
    fn test_finish_chunk_detects_overrun() {
        let mut reader = ChunkReader::open(Cursor::new(sample_container())).unwrap();
        let folder = reader.read_header().unwrap().unwrap();
        let end = reader.chunk_end(&folder).unwrap();
        reader.seek(SeekFrom::Start(end + 3)).unwrap();
        let err = reader.finish_chunk(&folder, end).unwrap_err();
        assert!(matches!(err, ChunkyError::SizeMismatch { .. }));
    }

    #[test]
    fn test_truncated_folder_content() {
        let mut bytes = sample_container();
        bytes.truncate(FileHeader::SIZE + 30);
        let mut reader = ChunkReader::open(Cursor::new(bytes)).unwrap();
        let folder = reader.read_header().unwrap().unwrap();
        let end = reader.chunk_end(&folder).unwrap();
        let err = reader.read_header_within(end).unwrap_err();
        assert!(matches!(err, ChunkyError::UnexpectedEof));
    }
}
