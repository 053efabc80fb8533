//! File and chunk header types.

use std::fmt;
use std::io::{Read, Write};

use crate::error::{ChunkyError, Result};
use crate::io_ext::{ReadExt, WriteExt};

/// Magic bytes at the start of every Relic Chunky file.
///
/// The trailing `\r\n\x1a\0` catches files damaged by text-mode transfers,
/// the same trick the PNG signature uses.
pub const MAGIC: [u8; 16] = *b"Relic Chunky\r\n\x1A\x00";

/// The only container version Dawn of War ships
pub const CONTAINER_VERSION: u32 = 1;

/// Platform field written by the game's own tools
pub const PLATFORM_PC: u32 = 1;

/// Reads exactly `buf.len()` bytes, mapping a short read to
/// [`ChunkyError::UnexpectedEof`].
pub(crate) fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ChunkyError::UnexpectedEof
        } else {
            ChunkyError::Io(e)
        }
    })
}

/// Whether a chunk holds child chunks or raw payload bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    /// `FOLD` chunk containing other chunks
    Folder,
    /// `DATA` chunk containing payload bytes
    Data,
}

/// Eight-byte chunk type identifier, e.g. `FOLDMSGR` or `DATASSHR`.
///
/// The first four bytes are always `FOLD` or `DATA` and decide whether the
/// chunk nests children or carries payload. The last four are the format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId([u8; 8]);

impl ChunkId {
    /// Create a folder chunk identifier from its four-byte tag
    pub const fn fold(tag: &[u8; 4]) -> Self {
        Self([b'F', b'O', b'L', b'D', tag[0], tag[1], tag[2], tag[3]])
    }

    /// Create a data chunk identifier from its four-byte tag
    pub const fn data(tag: &[u8; 4]) -> Self {
        Self([b'D', b'A', b'T', b'A', tag[0], tag[1], tag[2], tag[3]])
    }

    /// Validate raw bytes as a chunk identifier
    pub fn from_bytes(bytes: [u8; 8]) -> Result<Self> {
        match &bytes[..4] {
            b"FOLD" | b"DATA" => Ok(Self(bytes)),
            _ => Err(ChunkyError::InvalidChunkKind {
                found: [bytes[0], bytes[1], bytes[2], bytes[3]],
            }),
        }
    }

    /// The folder/data discriminant
    pub fn kind(self) -> ChunkKind {
        if self.0.starts_with(b"FOLD") {
            ChunkKind::Folder
        } else {
            ChunkKind::Data
        }
    }

    /// Whether this identifies a folder chunk
    pub fn is_folder(self) -> bool {
        self.kind() == ChunkKind::Folder
    }

    /// Whether this identifies a data chunk
    pub fn is_data(self) -> bool {
        self.kind() == ChunkKind::Data
    }

    /// The four-byte format tag after the FOLD/DATA prefix
    pub fn tag(self) -> [u8; 4] {
        [self.0[4], self.0[5], self.0[6], self.0[7]]
    }

    /// The raw eight bytes as stored on disk
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// The 24-byte prologue at the start of every container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Container format version, always 1
    pub version: u32,
    /// Origin platform, 1 for PC
    pub platform: u32,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            version: CONTAINER_VERSION,
            platform: PLATFORM_PC,
        }
    }
}

impl FileHeader {
    /// Encoded size of the prologue in bytes
    pub const SIZE: usize = 24;

    /// Read and validate the prologue
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 16];
        read_exact_or_eof(reader, &mut magic)?;
        if magic != MAGIC {
            return Err(ChunkyError::InvalidMagic { found: magic });
        }
        let version = reader.read_u32_le()?;
        if version != CONTAINER_VERSION {
            return Err(ChunkyError::UnsupportedContainerVersion(version));
        }
        let platform = reader.read_u32_le()?;
        Ok(Self { version, platform })
    }

    /// Write the prologue
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&MAGIC)?;
        writer.write_u32_le(self.version)?;
        writer.write_u32_le(self.platform)?;
        Ok(())
    }
}

/// Header preceding every chunk.
///
/// On disk: eight-byte identifier, `u32` version, `u32` payload size and a
/// length-prefixed name. The size field counts payload bytes only, never the
/// header itself. The name length includes a trailing NUL when a name is
/// present and is zero for unnamed chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Chunk type identifier
    pub id: ChunkId,
    /// Format version of the payload
    pub version: u32,
    /// Payload size in bytes
    pub size: u32,
    /// Optional chunk name, empty when unnamed
    pub name: String,
}

impl ChunkHeader {
    /// Read the next chunk header.
    ///
    /// Returns `Ok(None)` at a clean end of stream, an error if the stream
    /// ends partway through a header.
    pub fn read<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let mut id_bytes = [0u8; 8];
        let mut filled = 0;
        while filled < id_bytes.len() {
            let n = reader.read(&mut id_bytes[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(ChunkyError::UnexpectedEof);
            }
            filled += n;
        }
        let id = ChunkId::from_bytes(id_bytes)?;

        let mut rest = [0u8; 12];
        read_exact_or_eof(reader, &mut rest)?;
        let version = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
        let size = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]);
        let name_len = i32::from_le_bytes([rest[8], rest[9], rest[10], rest[11]]);
        if name_len < 0 {
            return Err(ChunkyError::InvalidString);
        }

        let mut name_bytes = vec![0u8; name_len as usize];
        read_exact_or_eof(reader, &mut name_bytes)?;
        while name_bytes.last() == Some(&0) {
            name_bytes.pop();
        }
        let name = String::from_utf8(name_bytes).map_err(|_| ChunkyError::InvalidString)?;

        Ok(Some(Self {
            id,
            version,
            size,
            name,
        }))
    }

    /// Write the chunk header
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.id.as_bytes())?;
        writer.write_u32_le(self.version)?;
        writer.write_u32_le(self.size)?;
        if self.name.is_empty() {
            writer.write_u32_le(0)?;
        } else {
            let len = u32::try_from(self.name.len() + 1)
                .map_err(|_| ChunkyError::InvalidString)?;
            writer.write_u32_le(len)?;
            writer.write_all(self.name.as_bytes())?;
            writer.write_u8(0)?;
        }
        Ok(())
    }

    /// Encoded size of this header in bytes
    pub fn encoded_len(&self) -> u64 {
        let name_len = if self.name.is_empty() {
            0
        } else {
            self.name.len() as u64 + 1
        };
        20 + name_len
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_chunk_id_display() {
        assert_eq!(ChunkId::fold(b"MSGR").to_string(), "FOLDMSGR");
        assert_eq!(ChunkId::data(b"SSHR").to_string(), "DATASSHR");
    }

    #[test]
    fn test_chunk_id_kind() {
        assert!(ChunkId::fold(b"RSGM").is_folder());
        assert!(ChunkId::data(b"SKEL").is_data());
        assert_eq!(ChunkId::data(b"SKEL").tag(), *b"SKEL");
    }

    #[test]
    fn test_chunk_id_rejects_unknown_prefix() {
        let err = ChunkId::from_bytes(*b"MVERxxxx").unwrap_err();
        assert!(matches!(err, ChunkyError::InvalidChunkKind { found } if found == *b"MVER"));
    }

    #[test]
    fn test_file_header_round_trip() {
        let mut buf = Vec::new();
        FileHeader::default().write(&mut buf).unwrap();
        assert_eq!(buf.len(), FileHeader::SIZE);
        assert_eq!(&buf[..12], b"Relic Chunky");
        assert_eq!(&buf[12..16], &[0x0D, 0x0A, 0x1A, 0x00]);

        let header = FileHeader::read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(header, FileHeader::default());
    }

    #[test]
    fn test_file_header_bad_magic() {
        let err = FileHeader::read(&mut Cursor::new(vec![0u8; 24])).unwrap_err();
        assert!(matches!(err, ChunkyError::InvalidMagic { .. }));
    }

    #[test]
    fn test_file_header_unsupported_version() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        let err = FileHeader::read(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, ChunkyError::UnsupportedContainerVersion(2)));
    }

    #[test]
    fn test_chunk_header_round_trip_named() {
        let header = ChunkHeader {
            id: ChunkId::fold(b"TXTR"),
            version: 1,
            size: 512,
            name: "art/ebps/space_marine".to_string(),
        };
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, header.encoded_len());

        // name length counts the trailing NUL
        assert_eq!(&buf[16..20], &22u32.to_le_bytes());
        assert_eq!(buf[buf.len() - 1], 0);

        let parsed = ChunkHeader::read(&mut Cursor::new(buf)).unwrap().unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_chunk_header_round_trip_unnamed() {
        let header = ChunkHeader {
            id: ChunkId::data(b"DATA"),
            version: 2,
            size: 16,
            name: String::new(),
        };
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        assert_eq!(buf.len(), 20);
        assert_eq!(&buf[16..20], &0u32.to_le_bytes());

        let parsed = ChunkHeader::read(&mut Cursor::new(buf)).unwrap().unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_chunk_header_clean_eof() {
        let parsed = ChunkHeader::read(&mut Cursor::new(Vec::new())).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_chunk_header_truncated() {
        let err = ChunkHeader::read(&mut Cursor::new(b"DATA".to_vec())).unwrap_err();
        assert!(matches!(err, ChunkyError::UnexpectedEof));
    }
}
