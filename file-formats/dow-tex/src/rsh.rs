//! RSH shader texture containers.
//!
//! An `.rsh` file bundles the textures of one material: a FOLDSHRF root
//! holding one FOLDTXTR per image role plus a FOLDSHDR describing the six
//! channel slots. Channel records carry the declared path of the texture
//! they use, which is how roles are recovered on read; files missing the
//! shader section fall back to path suffix inference.

use std::io::{Read, Seek, Write};

use log::{debug, warn};

use dow_chunky::{
    ChunkHeader, ChunkId, ChunkReader, ChunkWriter, ChunkyError, FileHeader, ReadExt, WriteExt,
};

use crate::error::{Result, TexError};
use crate::layers::{ImageFormat, LayerRole};

const FOLD_SHRF: ChunkId = ChunkId::fold(b"SHRF");
const FOLD_TXTR: ChunkId = ChunkId::fold(b"TXTR");
const FOLD_IMAG: ChunkId = ChunkId::fold(b"IMAG");
const FOLD_SHDR: ChunkId = ChunkId::fold(b"SHDR");
const DATA_HEAD: ChunkId = ChunkId::data(b"HEAD");
const DATA_INFO: ChunkId = ChunkId::data(b"INFO");
const DATA_ATTR: ChunkId = ChunkId::data(b"ATTR");
const DATA_DATA: ChunkId = ChunkId::data(b"DATA");
const DATA_CHAN: ChunkId = ChunkId::data(b"CHAN");

/// One stored image with its container header stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    /// Pixel data encoding
    pub format: ImageFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Mip levels contained in the payload
    pub mip_count: u32,
    /// Raw payload bytes, DDS or TGA data without the file header
    pub data: Vec<u8>,
}

impl TextureImage {
    /// Decode a FOLDTXTR subtree whose header was just read
    pub fn read_from<R: Read + Seek>(
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
    ) -> Result<Self> {
        let end = reader.chunk_end(header)?;
        let mut head_type = None;
        let mut image = None;
        while let Some(child) = reader.read_header_within(end)? {
            match child.id {
                id if id == DATA_HEAD => {
                    let child_end = reader.chunk_end(&child)?;
                    head_type = Some(ImageFormat::from_image_type(reader.read_u32_le()?)?);
                    reader.finish_chunk(&child, child_end)?;
                }
                // texture-level DATAINFO repeats DATAHEAD plus dimensions
                id if id == DATA_INFO => reader.skip_chunk(&child)?,
                id if id == FOLD_IMAG => {
                    image = Some(Self::read_imag(reader, &child)?);
                }
                _ => {
                    debug!("skipping {} inside {}", child.id, header.id);
                    reader.skip_chunk(&child)?;
                }
            }
        }
        reader.finish_chunk(header, end)?;

        let image = image.ok_or_else(|| TexError::MissingChunk("FOLDIMAG".to_string()))?;
        if let Some(head_type) = head_type {
            if head_type != image.format {
                warn!(
                    "{}: DATAHEAD says {:?} but DATAATTR says {:?}, trusting DATAATTR",
                    header.name, head_type, image.format
                );
            }
        }
        Ok(image)
    }

    fn read_imag<R: Read + Seek>(
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
    ) -> Result<Self> {
        let end = reader.chunk_end(header)?;
        let mut attr = None;
        let mut data = None;
        while let Some(child) = reader.read_header_within(end)? {
            match child.id {
                id if id == DATA_ATTR => {
                    let child_end = reader.chunk_end(&child)?;
                    let format = ImageFormat::from_format_id(reader.read_u32_le()?)?;
                    let width = reader.read_u32_le()?;
                    let height = reader.read_u32_le()?;
                    let mip_count = reader.read_u32_le()?;
                    attr = Some((format, width, height, mip_count));
                    reader.finish_chunk(&child, child_end)?;
                }
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

        let (format, width, height, mip_count) =
            attr.ok_or_else(|| TexError::MissingChunk("DATAATTR".to_string()))?;
        let data = data.ok_or_else(|| TexError::MissingChunk("DATADATA".to_string()))?;
        Ok(Self {
            format,
            width,
            height,
            mip_count,
            data,
        })
    }

    /// Encode this image as a FOLDTXTR subtree.
    ///
    /// `oe_compatible` adds the texture-level DATAINFO chunk that Object
    /// Editor requires but the game itself ignores.
    pub fn write_to<W: Write + Seek>(
        &self,
        writer: &mut ChunkWriter<W>,
        declared_path: &str,
        oe_compatible: bool,
    ) -> Result<()> {
        writer.begin_chunk(FOLD_TXTR, 1, declared_path)?;
        writer.begin_chunk(DATA_HEAD, 1, "")?;
        writer.write_u32_le(self.format.image_type())?;
        writer.write_u32_le(1)?; // image count
        writer.end_chunk()?;
        if oe_compatible {
            writer.begin_chunk(DATA_INFO, 3, "")?;
            writer.write_u32_le(self.format.image_type())?;
            writer.write_u32_le(self.width)?;
            writer.write_u32_le(self.height)?;
            writer.write_u32_le(1)?;
            writer.end_chunk()?;
        }
        writer.begin_chunk(FOLD_IMAG, 1, "")?;
        writer.begin_chunk(DATA_ATTR, 2, "")?;
        writer.write_u32_le(self.format.format_id())?;
        writer.write_u32_le(self.width)?;
        writer.write_u32_le(self.height)?;
        writer.write_u32_le(self.mip_count)?;
        writer.end_chunk()?;
        writer.begin_chunk(DATA_DATA, 2, "")?;
        writer.write_all(&self.data).map_err(ChunkyError::Io)?;
        writer.end_chunk()?;
        writer.end_chunk()?; // FOLDIMAG
        writer.end_chunk()?; // FOLDTXTR
        Ok(())
    }

    /// Rebuild a standalone image file, DDS for DXT payloads and TGA
    /// otherwise
    pub fn to_file_bytes(&self) -> Vec<u8> {
        match self.format.dxt() {
            Some(dxt) => crate::dds::DdsHeader {
                width: self.width,
                height: self.height,
                data_size: self.data.len() as u32,
                mip_count: self.mip_count,
                format: dxt,
            }
            .assemble(&self.data),
            None => crate::tga::TgaHeader {
                width: self.width as u16,
                height: self.height as u16,
                grayscale: false,
            }
            .assemble(&self.data),
        }
    }

    /// File extension matching [`TextureImage::to_file_bytes`]
    pub fn file_extension(&self) -> &'static str {
        if self.format.dxt().is_some() {
            "dds"
        } else {
            "tga"
        }
    }
}

/// One texture of an RSH material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RshLayer {
    /// Image role of this texture
    pub role: LayerRole,
    /// Path declared in the FOLDTXTR name, role suffix included
    pub declared_path: String,
    /// The stored image
    pub image: TextureImage,
}

/// Encoding options for [`RshFile::write`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RshWriteOptions {
    /// Emit the texture-level DATAINFO chunks Object Editor expects
    pub oe_compatible: bool,
}

/// A parsed `.rsh` shader texture container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RshFile {
    /// Material name from the FOLDSHRF chunk name
    pub material_name: String,
    /// Declared material path without any role suffix
    pub declared_path: String,
    /// Textures present, in file order
    pub layers: Vec<RshLayer>,
}

impl RshFile {
    /// Read a container
    pub fn read<R: Read + Seek>(source: R) -> Result<Self> {
        let mut reader = ChunkReader::open(source)?;
        let root = reader.expect(FOLD_SHRF)?;
        if root.version != 1 {
            return Err(ChunkyError::UnsupportedVersion {
                id: root.id,
                version: root.version,
            }
            .into());
        }
        let end = reader.chunk_end(&root)?;

        let mut textures: Vec<(String, TextureImage)> = Vec::new();
        let mut channel_paths: [Option<String>; 5] = Default::default();
        while let Some(child) = reader.read_header_within(end)? {
            match child.id {
                id if id == FOLD_TXTR => {
                    let image = TextureImage::read_from(&mut reader, &child)?;
                    textures.push((child.name, image));
                }
                id if id == FOLD_SHDR => {
                    channel_paths = Self::read_shdr_channels(&mut reader, &child)?;
                }
                _ => {
                    debug!("skipping {} inside FOLDSHRF", child.id);
                    reader.skip_chunk(&child)?;
                }
            }
        }
        reader.finish_chunk(&root, end)?;

        Ok(Self::assemble(root.name, textures, &channel_paths))
    }

    /// Build a file value from decoded parts.
    ///
    /// Texture roles are recovered from shader channel paths first and by
    /// path suffix when the shader section says nothing. Model containers
    /// embedding a material inline reuse this after collecting the same
    /// chunks from the model root.
    pub fn assemble(
        material_name: String,
        textures: Vec<(String, TextureImage)>,
        channel_paths: &[Option<String>; 5],
    ) -> Self {
        let layers: Vec<RshLayer> = textures
            .into_iter()
            .map(|(declared_path, image)| {
                let from_shdr = channel_paths.iter().position(|path| {
                    path.as_deref()
                        .is_some_and(|p| p.eq_ignore_ascii_case(&declared_path))
                });
                let role = from_shdr
                    .and_then(|index| LayerRole::from_channel_index(index as u32))
                    .unwrap_or_else(|| LayerRole::infer_from_path(&declared_path).0);
                RshLayer {
                    role,
                    declared_path,
                    image,
                }
            })
            .collect();

        let declared_path = layers
            .iter()
            .find(|layer| layer.role == LayerRole::Diffuse)
            .map(|layer| layer.declared_path.clone())
            .or_else(|| {
                layers
                    .first()
                    .map(|layer| LayerRole::infer_from_path(&layer.declared_path).1.to_string())
            })
            .unwrap_or_else(|| material_name.clone());

        Self {
            material_name,
            declared_path,
            layers,
        }
    }

    /// Decode a FOLDSHDR subtree into per-channel declared paths
    pub fn read_shdr_channels<R: Read + Seek>(
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
    ) -> Result<[Option<String>; 5]> {
        let mut channel_paths: [Option<String>; 5] = Default::default();
        let end = reader.chunk_end(header)?;
        while let Some(child) = reader.read_header_within(end)? {
            if child.id != DATA_CHAN {
                reader.skip_chunk(&child)?;
                continue;
            }
            let child_end = reader.chunk_end(&child)?;
            let index = reader.read_i32_le()?;
            let has_data = reader.read_i32_le()? != 0;
            reader.skip_bytes(4)?; // colour mask
            let path = reader.read_string()?;
            if has_data && !path.is_empty() {
                if let Ok(slot) = usize::try_from(index) {
                    if slot < channel_paths.len() {
                        channel_paths[slot] = Some(path);
                    }
                }
            }
            // coordinate transforms trail each record
            reader.finish_chunk(&child, child_end)?;
        }
        reader.finish_chunk(header, end)?;
        Ok(channel_paths)
    }

    /// Write the container
    pub fn write<W: Write + Seek>(&self, sink: W, options: &RshWriteOptions) -> Result<W> {
        let mut writer = ChunkWriter::create(sink, FileHeader::default())?;
        writer.begin_chunk(FOLD_SHRF, 1, &self.material_name)?;
        self.write_chunks(&mut writer, options)?;
        writer.end_chunk()?;
        Ok(writer.finish()?)
    }

    /// Write the texture and shader chunks without the FOLDSHRF root.
    ///
    /// Model containers call this to embed a material inline instead of
    /// producing a separate `.rsh` file.
    pub fn write_chunks<W: Write + Seek>(
        &self,
        writer: &mut ChunkWriter<W>,
        options: &RshWriteOptions,
    ) -> Result<()> {
        for role in LayerRole::ALL {
            if let Some(layer) = self.layer(role) {
                layer
                    .image
                    .write_to(writer, &layer.declared_path, options.oe_compatible)?;
            }
        }
        self.write_shdr(writer)
    }

    fn write_shdr<W: Write + Seek>(&self, writer: &mut ChunkWriter<W>) -> Result<()> {
        let has_extra = self.has_extra_layers();
        writer.begin_chunk(FOLD_SHDR, 1, &self.material_name)?;

        writer.begin_chunk(DATA_INFO, 1, "")?;
        writer.write_u32_le(6)?; // channel count
        writer.write_u32_le(7)?;
        writer.write_u8(204 + u8::from(has_extra))?;
        writer.write_u8(204)?;
        writer.write_u8(204)?;
        writer.write_u8(61)?;
        writer.write_u32_le(1)?;
        writer.write_u8(0)?;
        writer.end_chunk()?;

        for index in 0..6u32 {
            let role = LayerRole::from_channel_index(index);
            let layer = role.and_then(|role| self.layer(role));
            let has_data = layer.is_some();
            writer.begin_chunk(DATA_CHAN, 3, "")?;
            writer.write_i32_le(index as i32)?;
            writer.write_i32_le(i32::from(has_data))?;
            let colour_mask: [u8; 4] = match index {
                0 if !has_extra => [150, 150, 150, 255],
                1 if !has_extra => [229, 229, 229, 255],
                4 if !has_data => [255, 255, 255, 255],
                _ => [0, 0, 0, 255],
            };
            writer.write_all(&colour_mask).map_err(ChunkyError::Io)?;
            writer.write_string(layer.map_or("", |layer| layer.declared_path.as_str()))?;
            writer.write_u32_le(u32::from(has_data))?;
            writer.write_u32_le(4)?; // coordinate transform groups
            writer.write_u32_le(if role == Some(LayerRole::Reflection) { 6 } else { 0 })?;
            for group in 0..4 {
                let pairs: [[f32; 2]; 4] = if group % 2 == 1 {
                    [[0.0, 0.0], [1.0, 0.0], [0.0, 0.0], [0.0, 1.0]]
                } else {
                    [[1.0, 0.0], [0.0, 0.0], [0.0, 1.0], [0.0, 0.0]]
                };
                for pair in pairs {
                    writer.write_f32_le(pair[0])?;
                    writer.write_f32_le(pair[1])?;
                }
            }
            writer.end_chunk()?;
        }
        writer.end_chunk()?;
        Ok(())
    }

    /// Read a container from a byte slice
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read(std::io::Cursor::new(bytes))
    }

    /// Encode the container into a byte vector
    pub fn to_bytes(&self, options: &RshWriteOptions) -> Result<Vec<u8>> {
        Ok(self
            .write(std::io::Cursor::new(Vec::new()), options)?
            .into_inner())
    }

    /// First texture filling a role
    pub fn layer(&self, role: LayerRole) -> Option<&RshLayer> {
        self.layers.iter().find(|layer| layer.role == role)
    }

    /// Whether any non-diffuse texture is present
    pub fn has_extra_layers(&self) -> bool {
        self.layers
            .iter()
            .any(|layer| layer.role != LayerRole::Diffuse)
    }
}
