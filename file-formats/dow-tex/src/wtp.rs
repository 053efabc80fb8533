//! WTP team colour pattern containers.
//!
//! A `.wtp` file carries the paintable masks for one unit texture: a
//! FOLDTPAT root with the pattern dimensions, one grayscale DATAPTLD chunk
//! per tintable layer, an optional pre-combined RGBA image and optional
//! badge/banner placement records. All pixel data is stored raw, TGA
//! headers stripped.

use std::io::{Read, Seek, Write};

use log::{debug, warn};

use dow_chunky::{
    ChunkHeader, ChunkId, ChunkReader, ChunkWriter, ChunkyError, FileHeader, ReadExt, WriteExt,
};

use crate::error::{Result, TexError};
use crate::layers::PatternLayer;
use crate::tga::TgaHeader;

const FOLD_TPAT: ChunkId = ChunkId::fold(b"TPAT");
const FOLD_IMAG: ChunkId = ChunkId::fold(b"IMAG");
const DATA_INFO: ChunkId = ChunkId::data(b"INFO");
const DATA_PTLD: ChunkId = ChunkId::data(b"PTLD");
const DATA_ATTR: ChunkId = ChunkId::data(b"ATTR");
const DATA_DATA: ChunkId = ChunkId::data(b"DATA");
const DATA_PTBD: ChunkId = ChunkId::data(b"PTBD");
const DATA_PTBN: ChunkId = ChunkId::data(b"PTBN");

/// Default badge display size in pattern pixels
pub const BADGE_DISPLAY_SIZE: [f32; 2] = [64.0, 64.0];
/// Default banner display size in pattern pixels
pub const BANNER_DISPLAY_SIZE: [f32; 2] = [64.0, 96.0];

/// Placement of a badge or banner on the pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotPlacement {
    /// Top-left position in pattern pixels
    pub position: [f32; 2],
    /// Displayed size in pattern pixels
    pub display_size: [f32; 2],
}

impl SlotPlacement {
    /// Badge placement at the origin with the default size
    pub fn badge_default() -> Self {
        Self {
            position: [0.0, 0.0],
            display_size: BADGE_DISPLAY_SIZE,
        }
    }

    /// Banner placement at the origin with the default size
    pub fn banner_default() -> Self {
        Self {
            position: [0.0, 0.0],
            display_size: BANNER_DISPLAY_SIZE,
        }
    }
}

/// One grayscale tint mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternImage {
    /// Which tintable layer this mask drives
    pub layer: PatternLayer,
    /// 8-bit pixels, one byte per pattern texel
    pub data: Vec<u8>,
}

/// A parsed `.wtp` team colour pattern container
#[derive(Debug, Clone, PartialEq)]
pub struct WtpFile {
    /// Pattern name from the FOLDTPAT chunk name, `default` in game files
    pub name: String,
    /// Pattern width in pixels
    pub width: u32,
    /// Pattern height in pixels
    pub height: u32,
    /// Tint masks present, in file order
    pub layers: Vec<PatternImage>,
    /// Optional pre-combined RGBA image, 4 bytes per texel
    pub combined: Option<Vec<u8>>,
    /// Optional badge placement
    pub badge: Option<SlotPlacement>,
    /// Optional banner placement
    pub banner: Option<SlotPlacement>,
}

impl WtpFile {
    /// Read a container
    pub fn read<R: Read + Seek>(source: R) -> Result<Self> {
        let mut reader = ChunkReader::open(source)?;
        let root = reader.expect(FOLD_TPAT)?;
        if root.version != 3 {
            return Err(ChunkyError::UnsupportedVersion {
                id: root.id,
                version: root.version,
            }
            .into());
        }
        let end = reader.chunk_end(&root)?;

        let mut file = Self {
            name: root.name.clone(),
            width: 0,
            height: 0,
            layers: Vec::new(),
            combined: None,
            badge: None,
            banner: None,
        };
        while let Some(child) = reader.read_header_within(end)? {
            match child.id {
                id if id == DATA_INFO => {
                    let child_end = reader.chunk_end(&child)?;
                    file.width = reader.read_u32_le()?;
                    file.height = reader.read_u32_le()?;
                    reader.finish_chunk(&child, child_end)?;
                }
                id if id == DATA_PTLD => {
                    let child_end = reader.chunk_end(&child)?;
                    let layer_id = reader.read_u32_le()?;
                    let size = reader.read_u32_le()?;
                    match PatternLayer::from_id(layer_id) {
                        Ok(layer) => {
                            let data = reader.read_bytes(size as usize)?;
                            file.layers.push(PatternImage { layer, data });
                        }
                        Err(_) => {
                            warn!("skipping DATAPTLD with unknown layer id {layer_id}");
                        }
                    }
                    reader.finish_chunk(&child, child_end)?;
                }
                id if id == FOLD_IMAG => {
                    file.combined = Self::read_imag(&mut reader, &child)?;
                }
                id if id == DATA_PTBD => {
                    file.badge = Some(Self::read_placement(&mut reader, &child)?);
                }
                id if id == DATA_PTBN => {
                    file.banner = Some(Self::read_placement(&mut reader, &child)?);
                }
                _ => {
                    debug!("skipping {} inside FOLDTPAT", child.id);
                    reader.skip_chunk(&child)?;
                }
            }
        }
        reader.finish_chunk(&root, end)?;

        for layer in &file.layers {
            let expected = file.texel_count();
            if expected != 0 && layer.data.len() != expected {
                warn!(
                    "{} layer holds {} bytes, pattern dimensions require {}",
                    layer.layer,
                    layer.data.len(),
                    expected
                );
            }
        }
        Ok(file)
    }

    fn read_imag<R: Read + Seek>(
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
    ) -> Result<Option<Vec<u8>>> {
        let end = reader.chunk_end(header)?;
        let mut data = None;
        while let Some(child) = reader.read_header_within(end)? {
            match child.id {
                // DATAATTR repeats the pattern dimensions
                id if id == DATA_ATTR => reader.skip_chunk(&child)?,
                id if id == DATA_DATA => {
                    data = Some(reader.read_bytes(child.size as usize)?);
                }
                _ => {
                    debug!("skipping {} inside FOLDIMAG", child.id);
                    reader.skip_chunk(&child)?;
                }
            }
        }
        reader.finish_chunk(header, end)?;
        Ok(data)
    }

    fn read_placement<R: Read + Seek>(
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
    ) -> Result<SlotPlacement> {
        let end = reader.chunk_end(header)?;
        let placement = SlotPlacement {
            position: [reader.read_f32_le()?, reader.read_f32_le()?],
            display_size: [reader.read_f32_le()?, reader.read_f32_le()?],
        };
        reader.finish_chunk(header, end)?;
        Ok(placement)
    }

    /// Write the container
    pub fn write<W: Write + Seek>(&self, sink: W) -> Result<W> {
        self.validate()?;
        let mut writer = ChunkWriter::create(sink, FileHeader::default())?;
        writer.begin_chunk(FOLD_TPAT, 3, &self.name)?;

        writer.begin_chunk(DATA_INFO, 1, "")?;
        writer.write_u32_le(self.width)?;
        writer.write_u32_le(self.height)?;
        writer.end_chunk()?;

        let mut layers: Vec<&PatternImage> = self.layers.iter().collect();
        layers.sort_by_key(|image| image.layer.id());
        for image in layers {
            writer.begin_chunk(DATA_PTLD, 1, "")?;
            writer.write_u32_le(image.layer.id())?;
            writer.write_u32_le(image.data.len() as u32)?;
            writer.write_all(&image.data).map_err(ChunkyError::Io)?;
            writer.end_chunk()?;
        }

        if let Some(combined) = &self.combined {
            writer.begin_chunk(FOLD_IMAG, 1, "")?;
            writer.begin_chunk(DATA_ATTR, 2, "")?;
            writer.write_u32_le(0)?; // TGA format id
            writer.write_u32_le(self.width)?;
            writer.write_u32_le(self.height)?;
            writer.write_u32_le(1)?; // mip count
            writer.end_chunk()?;
            writer.begin_chunk(DATA_DATA, 2, "")?;
            writer.write_all(combined).map_err(ChunkyError::Io)?;
            writer.end_chunk()?;
            writer.end_chunk()?;
        }

        for (placement, id) in [(self.badge, DATA_PTBD), (self.banner, DATA_PTBN)] {
            let Some(placement) = placement else { continue };
            writer.begin_chunk(id, 1, "")?;
            writer.write_f32_le(placement.position[0])?;
            writer.write_f32_le(placement.position[1])?;
            writer.write_f32_le(placement.display_size[0])?;
            writer.write_f32_le(placement.display_size[1])?;
            writer.end_chunk()?;
        }

        writer.end_chunk()?;
        Ok(writer.finish()?)
    }

    /// Check that every stored image matches the declared dimensions
    pub fn validate(&self) -> Result<()> {
        let texels = self.texel_count();
        for image in &self.layers {
            if image.data.len() != texels {
                return Err(TexError::ImageSize {
                    name: image.layer.to_string(),
                    expected: texels,
                    actual: image.data.len(),
                });
            }
        }
        if let Some(combined) = &self.combined {
            if combined.len() != texels * 4 {
                return Err(TexError::ImageSize {
                    name: "combined".to_string(),
                    expected: texels * 4,
                    actual: combined.len(),
                });
            }
        }
        Ok(())
    }

    /// Read a container from a byte slice
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read(std::io::Cursor::new(bytes))
    }

    /// Encode the container into a byte vector
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write(std::io::Cursor::new(Vec::new()))?.into_inner())
    }

    /// Pixels per layer image
    pub fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Mask for a tintable layer
    pub fn layer(&self, layer: PatternLayer) -> Option<&PatternImage> {
        self.layers.iter().find(|image| image.layer == layer)
    }

    /// Rebuild a grayscale TGA file for a tint mask
    pub fn layer_tga(&self, layer: PatternLayer) -> Option<Vec<u8>> {
        self.layer(layer).map(|image| {
            TgaHeader {
                width: self.width as u16,
                height: self.height as u16,
                grayscale: true,
            }
            .assemble(&image.data)
        })
    }

    /// Rebuild an RGBA TGA file for the pre-combined image
    pub fn combined_tga(&self) -> Option<Vec<u8>> {
        self.combined.as_ref().map(|combined| {
            TgaHeader {
                width: self.width as u16,
                height: self.height as u16,
                grayscale: false,
            }
            .assemble(combined)
        })
    }
}
