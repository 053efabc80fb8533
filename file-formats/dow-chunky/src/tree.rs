//! Fully materialized chunk trees.
//!
//! [`ChunkyFile`] loads an entire container into memory without
//! interpreting any payload. Format crates decode payloads with their own
//! schema readers; this representation exists for inspection tools, tests
//! and structure-preserving rewrites.

use std::io::{Cursor, Read, Seek, Write};

use crate::error::{ChunkyError, Result};
use crate::header::{read_exact_or_eof, ChunkHeader, ChunkId, FileHeader};
use crate::reader::ChunkReader;
use crate::writer::ChunkWriter;

/// Content of a chunk, matching its FOLD/DATA kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkBody {
    /// Child chunks of a folder chunk
    Folder(Vec<Chunk>),
    /// Raw payload of a data chunk
    Data(Vec<u8>),
}

/// One chunk with all nested content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk type identifier
    pub id: ChunkId,
    /// Format version from the header
    pub version: u32,
    /// Chunk name, empty when unnamed
    pub name: String,
    /// Children or payload
    pub body: ChunkBody,
}

impl Chunk {
    /// Build a folder chunk
    pub fn folder(tag: &[u8; 4], version: u32, name: &str, children: Vec<Chunk>) -> Self {
        Self {
            id: ChunkId::fold(tag),
            version,
            name: name.to_string(),
            body: ChunkBody::Folder(children),
        }
    }

    /// Build a data chunk
    pub fn data(tag: &[u8; 4], version: u32, name: &str, payload: Vec<u8>) -> Self {
        Self {
            id: ChunkId::data(tag),
            version,
            name: name.to_string(),
            body: ChunkBody::Data(payload),
        }
    }

    /// Child chunks, empty for data chunks
    pub fn children(&self) -> &[Chunk] {
        match &self.body {
            ChunkBody::Folder(children) => children,
            ChunkBody::Data(_) => &[],
        }
    }

    /// Payload bytes, empty for folder chunks
    pub fn payload(&self) -> &[u8] {
        match &self.body {
            ChunkBody::Folder(_) => &[],
            ChunkBody::Data(payload) => payload,
        }
    }

    /// First child with the given identifier
    pub fn find_child(&self, id: ChunkId) -> Option<&Chunk> {
        self.children().iter().find(|child| child.id == id)
    }

    /// All children with the given identifier
    pub fn find_children<'a>(&'a self, id: ChunkId) -> impl Iterator<Item = &'a Chunk> {
        self.children().iter().filter(move |child| child.id == id)
    }

    /// Size the header's size field will hold when encoded
    pub fn content_size(&self) -> u64 {
        match &self.body {
            ChunkBody::Folder(children) => children.iter().map(Chunk::encoded_size).sum(),
            ChunkBody::Data(payload) => payload.len() as u64,
        }
    }

    /// Full encoded size including the header
    pub fn encoded_size(&self) -> u64 {
        let name_len = if self.name.is_empty() {
            0
        } else {
            self.name.len() as u64 + 1
        };
        20 + name_len + self.content_size()
    }

    fn read_from<R: Read + Seek>(
        reader: &mut ChunkReader<R>,
        header: ChunkHeader,
    ) -> Result<Self> {
        let end = reader.chunk_end(&header)?;
        let body = if header.id.is_folder() {
            let mut children = Vec::new();
            while let Some(child) = reader.read_header_within(end)? {
                children.push(Self::read_from(reader, child)?);
            }
            let pos = reader.position()?;
            if pos != end {
                return Err(ChunkyError::SizeMismatch {
                    id: header.id,
                    declared: header.size,
                    actual: u64::from(header.size) + (pos - end),
                });
            }
            ChunkBody::Folder(children)
        } else {
            let mut payload = vec![0u8; header.size as usize];
            read_exact_or_eof(reader, &mut payload)?;
            ChunkBody::Data(payload)
        };
        Ok(Self {
            id: header.id,
            version: header.version,
            name: header.name,
            body,
        })
    }

    /// Encode this chunk and its subtree
    pub fn write_to<W: Write + Seek>(&self, writer: &mut ChunkWriter<W>) -> Result<()> {
        writer.begin_chunk(self.id, self.version, &self.name)?;
        match &self.body {
            ChunkBody::Folder(children) => {
                for child in children {
                    child.write_to(writer)?;
                }
            }
            ChunkBody::Data(payload) => writer.write_all(payload).map_err(ChunkyError::Io)?,
        }
        writer.end_chunk()
    }
}

/// A whole container as prologue plus top-level chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkyFile {
    /// The 24-byte prologue
    pub header: FileHeader,
    /// Top-level chunks in file order
    pub chunks: Vec<Chunk>,
}

impl ChunkyFile {
    /// Read an entire container
    pub fn read<R: Read + Seek>(source: R) -> Result<Self> {
        let mut reader = ChunkReader::open(source)?;
        let header = reader.file_header();
        let mut chunks = Vec::new();
        while let Some(chunk_header) = reader.read_header()? {
            chunks.push(Chunk::read_from(&mut reader, chunk_header)?);
        }
        Ok(Self { header, chunks })
    }

    /// Read a container from a byte slice
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read(Cursor::new(bytes))
    }

    /// Write the container to a sink
    pub fn write<W: Write + Seek>(&self, sink: W) -> Result<W> {
        let mut writer = ChunkWriter::create(sink, self.header)?;
        for chunk in &self.chunks {
            chunk.write_to(&mut writer)?;
        }
        writer.finish()
    }

    /// Encode the container into a byte vector
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write(Cursor::new(Vec::new()))?.into_inner())
    }

    /// First top-level chunk with the given identifier
    pub fn find(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.iter().find(|chunk| chunk.id == id)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::io_ext::WriteExt;

    use super::*;

    fn sample_file() -> ChunkyFile {
        ChunkyFile {
            header: FileHeader::default(),
            chunks: vec![
                Chunk::data(b"FBIF", 1, "FileBurnInfo", vec![0; 12]),
                Chunk::folder(
                    b"RSGM",
                    3,
                    "marine",
                    vec![
                        Chunk::data(b"SSHR", 2, "", b"\x04\x00\x00\x00guns".to_vec()),
                        Chunk::folder(
                            b"MSGR",
                            1,
                            "",
                            vec![Chunk::data(b"BVOL", 2, "", vec![1; 61])],
                        ),
                    ],
                ),
            ],
        }
    }

    #[test]
    fn test_tree_round_trip() {
        let file = sample_file();
        let bytes = file.to_bytes().unwrap();
        let parsed = ChunkyFile::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, file);
    }

    #[test]
    fn test_encoded_size_matches_output() {
        let file = sample_file();
        let bytes = file.to_bytes().unwrap();
        let total: u64 = file.chunks.iter().map(Chunk::encoded_size).sum();
        assert_eq!(bytes.len() as u64, FileHeader::SIZE as u64 + total);
    }

    #[test]
    fn test_find_child() {
        let file = sample_file();
        let root = file.find(ChunkId::fold(b"RSGM")).unwrap();
        assert!(root.find_child(ChunkId::data(b"SSHR")).is_some());
        assert!(root.find_child(ChunkId::data(b"MARK")).is_none());
        assert_eq!(root.find_children(ChunkId::data(b"SSHR")).count(), 1);
    }

    #[test]
    fn test_folder_size_must_cover_children() {
        let mut buf = Vec::new();
        FileHeader::default().write(&mut buf).unwrap();
        // folder claims 10 bytes of content but its child occupies 24
        ChunkHeader {
            id: ChunkId::fold(b"MSGR"),
            version: 1,
            size: 10,
            name: String::new(),
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
        buf.write_u32_le(0).unwrap();

        let err = ChunkyFile::from_bytes(&buf).unwrap_err();
        assert!(matches!(err, ChunkyError::SizeMismatch { .. }));
    }

    #[test]
    fn test_truncated_payload() {
        let mut buf = Vec::new();
        FileHeader::default().write(&mut buf).unwrap();
        ChunkHeader {
            id: ChunkId::data(b"PTLD"),
            version: 1,
            size: 100,
            name: String::new(),
        }
        .write(&mut buf)
        .unwrap();
        buf.extend_from_slice(&[0u8; 10]);

        let err = ChunkyFile::from_bytes(&buf).unwrap_err();
        assert!(matches!(err, ChunkyError::UnexpectedEof));
    }
}
