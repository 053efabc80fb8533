//! DDS header handling.
//!
//! RSH containers store DXT-compressed images as a bare payload with the
//! 128-byte DDS header stripped; dimensions, mip count and compression live
//! in the surrounding chunks instead. This module rebuilds the header the
//! way the game's own toolchain lays it out.

use std::io::Read;

use bitflags::bitflags;

use crate::error::{Result, TexError};

bitflags! {
    /// DDSD surface description flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DdsFlags: u32 {
        /// Caps field is valid
        const CAPS = 0x1;
        /// Height field is valid
        const HEIGHT = 0x2;
        /// Width field is valid
        const WIDTH = 0x4;
        /// Pixel format block is valid
        const PIXEL_FORMAT = 0x1000;
        /// Mipmap count field is valid
        const MIPMAP_COUNT = 0x2_0000;
        /// Pitch field holds the linear size of the top mip
        const LINEAR_SIZE = 0x8_0000;
    }
}

bitflags! {
    /// DDSCAPS surface capability flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DdsCaps: u32 {
        /// Surface has more than one layer
        const COMPLEX = 0x8;
        /// Surface is a texture
        const TEXTURE = 0x1000;
        /// Surface carries mipmaps
        const MIPMAP = 0x40_0000;
    }
}

/// DXT compression variant of a stored image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DxtFormat {
    /// BC1, opaque or 1-bit alpha
    Dxt1,
    /// BC2, explicit alpha
    Dxt3,
    /// BC3, interpolated alpha
    Dxt5,
}

impl DxtFormat {
    /// The fourCC stored in the DDS pixel format block
    pub fn four_cc(self) -> [u8; 4] {
        match self {
            Self::Dxt1 => *b"DXT1",
            Self::Dxt3 => *b"DXT3",
            Self::Dxt5 => *b"DXT5",
        }
    }

    /// Parse a DDS fourCC
    pub fn from_four_cc(four_cc: [u8; 4]) -> Result<Self> {
        match &four_cc {
            b"DXT1" => Ok(Self::Dxt1),
            b"DXT3" => Ok(Self::Dxt3),
            b"DXT5" => Ok(Self::Dxt5),
            _ => Err(TexError::UnknownFourCc(four_cc)),
        }
    }

    /// Compressed bytes per 4x4 block
    pub fn block_size(self) -> u32 {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt3 | Self::Dxt5 => 16,
        }
    }

    /// Compressed size of one mip level
    pub fn linear_size(self, width: u32, height: u32) -> u32 {
        width.div_ceil(4).max(1) * height.div_ceil(4).max(1) * self.block_size()
    }
}

/// The fields of a DDS header the game's formats care about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdsHeader {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Payload size declared in the linear-size field
    pub data_size: u32,
    /// Number of mip levels
    pub mip_count: u32,
    /// Compression variant
    pub format: DxtFormat,
}

impl DdsHeader {
    /// Encoded header size in bytes
    pub const SIZE: usize = 128;

    /// Parse a DDS header, ignoring fields the game never varies
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; Self::SIZE];
        reader.read_exact(&mut raw)?;
        if &raw[0..4] != b"DDS " {
            return Err(TexError::NotDds);
        }
        let u32_at = |offset: usize| {
            u32::from_le_bytes([raw[offset], raw[offset + 1], raw[offset + 2], raw[offset + 3]])
        };
        let height = u32_at(12);
        let width = u32_at(16);
        let data_size = u32_at(20);
        let mip_count = u32_at(28);
        let format = DxtFormat::from_four_cc([raw[84], raw[85], raw[86], raw[87]])?;
        Ok(Self {
            width,
            height,
            data_size,
            mip_count,
            format,
        })
    }

    /// Encode the 128-byte header.
    ///
    /// Matches the game toolchain byte for byte: height precedes width, the
    /// linear-size field holds the whole payload size and the caps always
    /// advertise a complex mipmapped texture.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut raw = [0u8; Self::SIZE];
        let mut put_u32 = |offset: usize, value: u32| {
            raw[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        };
        put_u32(4, 124);
        put_u32(8, DdsFlags::all().bits());
        put_u32(12, self.height);
        put_u32(16, self.width);
        put_u32(20, self.data_size);
        put_u32(28, self.mip_count);
        put_u32(76, 32);
        put_u32(80, 0x4); // fourCC pixel format
        put_u32(108, DdsCaps::all().bits());
        raw[0..4].copy_from_slice(b"DDS ");
        raw[84..88].copy_from_slice(&self.format.four_cc());
        raw
    }

    /// Rebuild a standalone DDS file from a stripped payload
    pub fn assemble(&self, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE + payload.len());
        out.extend_from_slice(&self.to_bytes());
        out.extend_from_slice(payload);
        out
    }
}

/// Split a DDS file into its parsed header and raw payload
pub fn split_dds(bytes: &[u8]) -> Result<(DdsHeader, &[u8])> {
    let mut cursor = bytes;
    let header = DdsHeader::read(&mut cursor)?;
    Ok((header, &bytes[DdsHeader::SIZE..]))
}
