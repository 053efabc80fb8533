//! TGA header handling.
//!
//! WTP containers store team colour layers as uncompressed TGA pixel data
//! with the 18-byte header stripped. Rebuilding a viewable file only needs
//! the dimensions from the pattern's DATAINFO chunk.

use crate::error::{Result, TexError};

/// Header for the two uncompressed TGA shapes the game format uses:
/// 8-bit grayscale masks and 32-bit RGBA images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TgaHeader {
    /// Image width in pixels
    pub width: u16,
    /// Image height in pixels
    pub height: u16,
    /// 8-bit grayscale when set, 32-bit RGBA otherwise
    pub grayscale: bool,
}

impl TgaHeader {
    /// Encoded header size in bytes
    pub const SIZE: usize = 18;

    /// Bytes per pixel for this image shape
    pub fn bytes_per_pixel(self) -> usize {
        if self.grayscale { 1 } else { 4 }
    }

    /// Pixel data size for the full image
    pub fn data_size(self) -> usize {
        usize::from(self.width) * usize::from(self.height) * self.bytes_per_pixel()
    }

    /// Encode the 18-byte header.
    ///
    /// The colour map entry size byte is 32 even though no colour map is
    /// present, matching the game toolchain output.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut raw = [0u8; Self::SIZE];
        raw[2] = if self.grayscale { 3 } else { 2 };
        raw[7] = 32;
        raw[12..14].copy_from_slice(&self.width.to_le_bytes());
        raw[14..16].copy_from_slice(&self.height.to_le_bytes());
        raw[16] = if self.grayscale { 8 } else { 32 };
        raw
    }

    /// Rebuild a standalone TGA file from stripped pixel data
    pub fn assemble(&self, pixels: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE + pixels.len());
        out.extend_from_slice(&self.to_bytes());
        out.extend_from_slice(pixels);
        out
    }
}

/// Split a TGA file into its parsed header and pixel data.
///
/// Skips the image ID block when present. Only uncompressed grayscale and
/// truecolour images are accepted.
pub fn split_tga(bytes: &[u8]) -> Result<(TgaHeader, &[u8])> {
    if bytes.len() < TgaHeader::SIZE {
        return Err(TexError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "TGA header truncated",
        )));
    }
    let id_length = usize::from(bytes[0]);
    let image_type = bytes[2];
    let grayscale = match image_type {
        2 => false,
        3 => true,
        other => return Err(TexError::UnsupportedTga(other)),
    };
    let width = u16::from_le_bytes([bytes[12], bytes[13]]);
    let height = u16::from_le_bytes([bytes[14], bytes[15]]);
    let header = TgaHeader {
        width,
        height,
        grayscale,
    };
    let data_start = TgaHeader::SIZE + id_length;
    if bytes.len() < data_start {
        return Err(TexError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "TGA image ID truncated",
        )));
    }
    Ok((header, &bytes[data_start..]))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_grayscale_header_layout() {
        let header = TgaHeader {
            width: 512,
            height: 512,
            grayscale: true,
        };
        let raw = header.to_bytes();
        assert_eq!(raw[2], 3);
        assert_eq!(raw[7], 32);
        assert_eq!(raw[16], 8);
        assert_eq!(&raw[12..16], &[0, 2, 0, 2]);
        assert_eq!(header.data_size(), 512 * 512);
    }

    #[test]
    fn test_rgba_header_layout() {
        let header = TgaHeader {
            width: 64,
            height: 96,
            grayscale: false,
        };
        let raw = header.to_bytes();
        assert_eq!(raw[2], 2);
        assert_eq!(raw[16], 32);
        assert_eq!(header.data_size(), 64 * 96 * 4);
    }

    #[test]
    fn test_split_round_trip() {
        let header = TgaHeader {
            width: 4,
            height: 2,
            grayscale: true,
        };
        let pixels: Vec<u8> = (0..8).collect();
        let file = header.assemble(&pixels);
        let (parsed, stripped) = split_tga(&file).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(stripped, pixels.as_slice());
    }

    #[test]
    fn test_split_skips_image_id() {
        let header = TgaHeader {
            width: 1,
            height: 1,
            grayscale: true,
        };
        let mut file = header.to_bytes().to_vec();
        file[0] = 4;
        file.extend_from_slice(b"name");
        file.push(0x7F);
        let (_, stripped) = split_tga(&file).unwrap();
        assert_eq!(stripped, &[0x7F]);
    }

    #[test]
    fn test_compressed_tga_rejected() {
        let mut raw = [0u8; 18];
        raw[2] = 10; // RLE truecolour
        let err = split_tga(&raw).unwrap_err();
        assert!(matches!(err, TexError::UnsupportedTga(10)));
    }
}
