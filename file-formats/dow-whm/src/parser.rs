//! Model container decoding.
//!
//! [`import_container`] turns either dialect of the model container into a
//! [`SceneModel`] plus a [`Report`] of everything that degraded on the way.
//! A malformed container fails fatally with no partial model; missing
//! external files (textures, xref sources) degrade to placeholders and
//! stubs instead.

use std::fs::File;
use std::io::{BufReader, Read, Seek};

use glam::Mat3;
use log::debug;

use dow_chunky::{ChunkHeader, ChunkId, ChunkReader, ChunkyError, ReadExt};
use dow_tex::{RshFile, TextureImage, WtpFile};

use crate::anim::{CHANNEL_MODE_MESH, CHANNEL_MODE_TEXTURE, UvRecord};
use crate::coordinate::{
    bone_vector_from_disk, mesh_vector_from_disk, rotation_from_disk, swap_winding,
};
use crate::error::{Result, WhmError};
use crate::layout::DowLayout;
use crate::report::{Report, Warning};
use crate::scene::{
    path_name, Action, Bone, BoneTrack, Bounds, BurnInfo, ExtraChannel, Geometry, Influence, Key,
    Marker, Material, MaterialGroup, Mesh, SceneModel, ShadowVolume, Skeleton, UvChannelKind,
    Vertex,
};
use crate::versions::{check_version, Variant};
use crate::xref;

const FOLD_RSGM: ChunkId = ChunkId::fold(b"RSGM");
const FOLD_TXTR: ChunkId = ChunkId::fold(b"TXTR");
const FOLD_SHDR: ChunkId = ChunkId::fold(b"SHDR");
const FOLD_SKEL: ChunkId = ChunkId::fold(b"SKEL");
const FOLD_MSGR: ChunkId = ChunkId::fold(b"MSGR");
const FOLD_MSLC: ChunkId = ChunkId::fold(b"MSLC");
const FOLD_ANIM: ChunkId = ChunkId::fold(b"ANIM");
const FOLD_DATA: ChunkId = ChunkId::fold(b"DATA");
const DATA_FBIF: ChunkId = ChunkId::data(b"FBIF");
const DATA_SSHR: ChunkId = ChunkId::data(b"SSHR");
const DATA_SKEL: ChunkId = ChunkId::data(b"SKEL");
const DATA_INFO: ChunkId = ChunkId::data(b"INFO");
const DATA_BONE: ChunkId = ChunkId::data(b"BONE");
const DATA_DATA: ChunkId = ChunkId::data(b"DATA");
const DATA_BVOL: ChunkId = ChunkId::data(b"BVOL");
const DATA_MARK: ChunkId = ChunkId::data(b"MARK");
const DATA_CAMS: ChunkId = ChunkId::data(b"CAMS");
const DATA_CMRA: ChunkId = ChunkId::data(b"CMRA");
const DATA_BANM: ChunkId = ChunkId::data(b"BANM");
const DATA_CANM: ChunkId = ChunkId::data(b"CANM");
const DATA_ANBV: ChunkId = ChunkId::data(b"ANBV");

/// Options for [`import_container`]
#[derive(Debug, Default)]
pub struct ImportOptions {
    /// Search scope for `.rsh` textures and xref sources. `None` skips
    /// resolution entirely and decodes placeholders without warnings.
    pub scope: Option<DowLayout>,
}

/// Read a model container in either dialect.
///
/// The dialect is picked from the `FOLDRSGM` root version. Warnings cover
/// everything that degraded without stopping the decode.
pub fn import_container<R: Read + Seek>(
    source: R,
    options: &ImportOptions,
) -> Result<(SceneModel, Report)> {
    let mut reader = ChunkReader::open(source)?;
    let mut decoder = Decoder::new(options);

    // burn info precedes the root as a sibling in the newer dialect
    let mut burn_info = None;
    let root = loop {
        match reader.read_header()? {
            None => return Err(WhmError::MissingChunk("FOLDRSGM")),
            Some(header) if header.id == DATA_FBIF => {
                burn_info = Some(read_burn_info(&mut reader, &header)?);
            }
            Some(header) if header.id == FOLD_RSGM => break header,
            Some(header) => return Err(WhmError::NotAModelRoot(header.id)),
        }
    };
    decoder.variant = Variant::from_root_version(root.version).ok_or(
        ChunkyError::UnsupportedVersion {
            id: root.id,
            version: root.version,
        },
    )?;
    decoder.model.name = root.name.clone();
    decoder.model.burn_info = burn_info;
    decoder.read_root(&mut reader, &root)?;
    Ok((decoder.model, decoder.report))
}

struct Decoder<'a> {
    options: &'a ImportOptions,
    variant: Variant,
    model: SceneModel,
    report: Report,
    /// Inline textures collected until their `FOLDSHDR` claims them
    pending_textures: Vec<(String, TextureImage)>,
}

impl<'a> Decoder<'a> {
    fn new(options: &'a ImportOptions) -> Self {
        Self {
            options,
            variant: Variant::default(),
            model: SceneModel::default(),
            report: Report::new(),
            pending_textures: Vec::new(),
        }
    }

    fn read_root<R: Read + Seek>(
        &mut self,
        reader: &mut ChunkReader<R>,
        root: &ChunkHeader,
    ) -> Result<()> {
        let end = reader.chunk_end(root)?;
        while let Some(child) = reader.read_header_within(end)? {
            check_version(self.variant, Some(FOLD_RSGM), &child)?;
            match child.id {
                id if id == DATA_SSHR => self.read_sshr(reader, &child)?,
                id if id == FOLD_TXTR => {
                    let image = TextureImage::read_from(reader, &child)?;
                    self.pending_textures.push((child.name, image));
                }
                id if id == FOLD_SHDR => {
                    let channels = RshFile::read_shdr_channels(reader, &child)?;
                    self.flush_internal_material(child.name, &channels);
                }
                id if id == DATA_SKEL => self.read_skel(reader, &child)?,
                id if id == FOLD_SKEL => self.read_fold_skel(reader, &child)?,
                id if id == FOLD_MSGR => self.read_msgr(reader, &child)?,
                id if id == DATA_MARK => self.read_mark(reader, &child)?,
                id if id == DATA_CAMS || id == DATA_CMRA => {
                    debug!("skipping camera chunk {}", child.id);
                    reader.skip_chunk(&child)?;
                }
                id if id == FOLD_ANIM => self.read_anim(reader, &child)?,
                _ => {
                    debug!("skipping {} inside FOLDRSGM", child.id);
                    reader.skip_chunk(&child)?;
                }
            }
        }
        reader.finish_chunk(root, end)?;

        // textures that never got a shader section still form a material
        if !self.pending_textures.is_empty() {
            let textures = std::mem::take(&mut self.pending_textures);
            let name = path_name(&textures[0].0).to_string();
            self.flush_textures(name, textures, &Default::default());
        }
        Ok(())
    }

    /// One externally stored material, announced by its declared path
    fn read_sshr<R: Read + Seek>(
        &mut self,
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
    ) -> Result<()> {
        let end = reader.chunk_end(header)?;
        let path = reader.read_string()?;
        reader.finish_chunk(header, end)?;

        if self
            .model
            .materials
            .iter()
            .any(|material| material.full_path.as_deref() == Some(path.as_str()))
        {
            return Ok(());
        }
        let material = load_material(self.options.scope.as_ref(), &mut self.report, &path)?;
        self.model.materials.push(material);
        Ok(())
    }

    fn flush_internal_material(&mut self, name: String, channels: &[Option<String>; 5]) {
        let textures = std::mem::take(&mut self.pending_textures);
        self.flush_textures(name, textures, channels);
    }

    fn flush_textures(
        &mut self,
        name: String,
        textures: Vec<(String, TextureImage)>,
        channels: &[Option<String>; 5],
    ) {
        let rsh = RshFile::assemble(name, textures, channels);
        self.model.materials.push(Material {
            name: path_name(&rsh.material_name).to_string(),
            full_path: Some(rsh.declared_path.clone()),
            single_image_path: None,
            internal: true,
            pattern: None,
            texture: Some(rsh),
        });
    }

    fn read_skel<R: Read + Seek>(
        &mut self,
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
    ) -> Result<()> {
        let end = reader.chunk_end(header)?;
        self.model.skeleton = Skeleton {
            bones: read_skeleton_data(reader)?,
        };
        reader.finish_chunk(header, end)?;
        Ok(())
    }

    fn read_fold_skel<R: Read + Seek>(
        &mut self,
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
    ) -> Result<()> {
        self.model.skeleton = read_fold_skel(self.variant, reader, header)?;
        Ok(())
    }

    fn read_msgr<R: Read + Seek>(
        &mut self,
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
    ) -> Result<()> {
        let end = reader.chunk_end(header)?;
        while let Some(child) = reader.read_header_within(end)? {
            check_version(self.variant, Some(FOLD_MSGR), &child)?;
            match child.id {
                id if id == FOLD_MSLC => {
                    let raw = decode_mslc(reader, &child, &self.model.skeleton, self.variant)?;
                    let name = child.name;
                    let geometry = self.raw_to_geometry(raw);
                    self.model.meshes.push(Mesh {
                        name,
                        xref_source: None,
                        rigid_parent: None,
                        geometry: Some(geometry),
                    });
                }
                id if id == DATA_DATA => self.read_mesh_list(reader, &child)?,
                id if id == DATA_BVOL => {
                    self.model.bounds = Some(read_bounds(reader, &child)?);
                }
                _ => {
                    debug!("skipping {} inside FOLDMSGR", child.id);
                    reader.skip_chunk(&child)?;
                }
            }
        }
        reader.finish_chunk(header, end)?;
        Ok(())
    }

    fn raw_to_geometry(&mut self, raw: RawMslc) -> Geometry {
        let groups = raw
            .groups
            .into_iter()
            .map(|(path, faces)| MaterialGroup {
                material: material_name_for_path(&mut self.model, &path),
                faces,
            })
            .collect();
        Geometry {
            vertices: raw.vertices,
            groups,
            bounds: raw.bounds,
            shadow: raw.shadow,
        }
    }

    /// The mesh list tying names to xref sources and rigid parents
    fn read_mesh_list<R: Read + Seek>(
        &mut self,
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
    ) -> Result<()> {
        let end = reader.chunk_end(header)?;
        let count = reader.read_u32_le()?;
        let mut records = Vec::new();
        for _ in 0..count {
            let name = reader.read_string()?;
            let path = reader.read_string()?;
            let parent = reader.read_i32_le()?;
            records.push((name, path, parent));
        }
        reader.finish_chunk(header, end)?;

        for (name, path, parent) in records {
            let rigid_parent = if parent < 0 {
                None
            } else if (parent as usize) < self.model.skeleton.len() {
                Some(parent as usize)
            } else {
                return Err(WhmError::BoneIndexOutOfRange {
                    index: i64::from(parent),
                    count: self.model.skeleton.len(),
                });
            };
            let source = (!path.is_empty() && path != ".").then_some(path);

            if self.model.mesh(&name).is_none() {
                self.model.meshes.push(Mesh {
                    name: name.clone(),
                    xref_source: None,
                    rigid_parent: None,
                    geometry: None,
                });
            }
            if let Some(mesh) = self.model.meshes.iter_mut().find(|mesh| mesh.name == name) {
                mesh.rigid_parent = rigid_parent;
                mesh.xref_source = source.clone();
            }
            if let Some(source) = source {
                xref::resolve_mesh(
                    &mut self.model,
                    &mut self.report,
                    self.options.scope.as_ref(),
                    &name,
                    &source,
                )?;
            }
        }
        Ok(())
    }

    fn read_mark<R: Read + Seek>(
        &mut self,
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
    ) -> Result<()> {
        let end = reader.chunk_end(header)?;
        match self.variant {
            Variant::Whm => {
                let count = reader.read_u32_le()?;
                for _ in 0..count {
                    let name = reader.read_string()?;
                    let marker = read_marker_payload(reader, name)?;
                    self.model.markers.push(marker);
                }
            }
            // one chunk per marker, named after it
            Variant::Sgm => {
                let marker = read_marker_payload(reader, header.name.clone())?;
                self.model.markers.push(marker);
            }
        }
        reader.finish_chunk(header, end)?;
        Ok(())
    }

    fn read_anim<R: Read + Seek>(
        &mut self,
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
    ) -> Result<()> {
        let end = reader.chunk_end(header)?;
        while let Some(child) = reader.read_header_within(end)? {
            check_version(self.variant, Some(FOLD_ANIM), &child)?;
            match child.id {
                id if id == DATA_DATA => {
                    let action = self.read_anim_data(reader, &child, header.name.clone())?;
                    self.model.actions.push(action);
                }
                id if id == FOLD_DATA => {
                    let action = self.read_fold_data(reader, &child)?;
                    self.model.actions.push(action);
                }
                id if id == DATA_ANBV => reader.skip_chunk(&child)?,
                _ => {
                    debug!("skipping {} inside FOLDANIM", child.id);
                    reader.skip_chunk(&child)?;
                }
            }
        }
        reader.finish_chunk(header, end)?;
        Ok(())
    }

    /// Newer-dialect action payload, everything in one `DATADATA`
    fn read_anim_data<R: Read + Seek>(
        &mut self,
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
        name: String,
    ) -> Result<Action> {
        let end = reader.chunk_end(header)?;
        let frames = reader.read_u32_le()?;
        let _duration = reader.read_f32_le()?;

        let mut bones = Vec::new();
        let bone_count = reader.read_u32_le()?;
        for _ in 0..bone_count {
            let bone = reader.read_string()?;
            bones.push(read_track_payload(reader, bone)?);
        }

        let mut channels = ChannelAccumulator::default();
        let channel_count = reader.read_u32_le()?;
        for _ in 0..channel_count {
            let target = reader.read_string()?;
            channels.read_channel(reader, target)?;
        }

        // cameras carry opaque key blocks nothing downstream consumes
        let camera_count = reader.read_u32_le()?;
        for _ in 0..camera_count {
            let _name = reader.read_string()?;
            let position_keys = reader.read_u32_le()?;
            reader.skip_bytes(u64::from(position_keys) * 16)?;
            let rotation_keys = reader.read_u32_le()?;
            reader.skip_bytes(u64::from(rotation_keys) * 20)?;
        }
        reader.finish_chunk(header, end)?;

        Ok(Action {
            name,
            frames,
            bones,
            channels: channels.finish(&mut self.model),
            xref_source: None,
        })
    }

    /// Legacy-dialect action folder, bones and channels as child chunks
    fn read_fold_data<R: Read + Seek>(
        &mut self,
        reader: &mut ChunkReader<R>,
        header: &ChunkHeader,
    ) -> Result<Action> {
        let end = reader.chunk_end(header)?;
        let mut frames = 0;
        let mut bones = Vec::new();
        let mut channels = ChannelAccumulator::default();
        while let Some(child) = reader.read_header_within(end)? {
            check_version(self.variant, Some(FOLD_DATA), &child)?;
            match child.id {
                id if id == DATA_INFO => {
                    let child_end = reader.chunk_end(&child)?;
                    frames = reader.read_u32_le()?;
                    let _duration = reader.read_f32_le()?;
                    reader.finish_chunk(&child, child_end)?;
                }
                id if id == DATA_BANM => {
                    let child_end = reader.chunk_end(&child)?;
                    bones.push(read_track_payload(reader, child.name.clone())?);
                    reader.finish_chunk(&child, child_end)?;
                }
                id if id == DATA_CANM => {
                    let child_end = reader.chunk_end(&child)?;
                    channels.read_channel(reader, child.name.clone())?;
                    reader.finish_chunk(&child, child_end)?;
                }
                _ => {
                    debug!("skipping {} inside FOLDDATA", child.id);
                    reader.skip_chunk(&child)?;
                }
            }
        }
        reader.finish_chunk(header, end)?;

        Ok(Action {
            name: header.name.clone(),
            frames,
            bones,
            channels: channels.finish(&mut self.model),
            xref_source: None,
        })
    }
}

/// Decoded animation channels before UV records are merged per material
#[derive(Default)]
struct ChannelAccumulator {
    channels: Vec<ExtraChannel>,
    uv_records: Vec<(String, UvRecord, Vec<Key<f32>>)>,
}

impl ChannelAccumulator {
    fn read_channel<R: Read + Seek>(
        &mut self,
        reader: &mut ChunkReader<R>,
        target: String,
    ) -> Result<()> {
        let mode = reader.read_i32_le()?;
        match mode {
            CHANNEL_MODE_MESH => {
                reader.skip_bytes(8)?;
                let key_count = reader.read_u32_le()?;
                reader.skip_bytes(4)?;
                // the first key is a whole-action flag, not a curve point
                let visible = reader.read_f32_le()?;
                let mut keys = Vec::new();
                for _ in 0..key_count.saturating_sub(1) {
                    let time = reader.read_f32_le()?;
                    let value = reader.read_f32_le()?;
                    keys.push(Key::new(time, value));
                }
                if visible == 0.0 {
                    self.channels.push(ExtraChannel::ForceInvisible {
                        mesh: target.clone(),
                        hidden: true,
                    });
                }
                if !keys.is_empty() {
                    self.channels.push(ExtraChannel::Visibility { mesh: target, keys });
                }
            }
            CHANNEL_MODE_TEXTURE => {
                reader.skip_bytes(4)?;
                let record = UvRecord::from_code(reader.read_i32_le()?)?;
                let key_count = reader.read_u32_le()?;
                let mut keys = Vec::new();
                for _ in 0..key_count {
                    let time = reader.read_f32_le()?;
                    let value = reader.read_f32_le()? * record.disk_scale();
                    keys.push(Key::new(time, value));
                }
                self.uv_records.push((target, record, keys));
            }
            other => return Err(WhmError::UnknownChannelMode(other)),
        }
        Ok(())
    }

    /// Merge per-axis UV records into two-axis channels keyed by material
    fn finish(self, model: &mut SceneModel) -> Vec<ExtraChannel> {
        let mut channels = self.channels;
        let mut merged: Vec<(String, UvChannelKind, [Vec<Key<f32>>; 2])> = Vec::new();
        for (path, record, keys) in self.uv_records {
            let material = material_name_for_path(model, &path);
            let kind = record.kind();
            let slot = usize::from(record.is_v_axis());
            match merged
                .iter_mut()
                .find(|(name, k, _)| *name == material && *k == kind)
            {
                Some((_, _, axes)) => axes[slot] = keys,
                None => {
                    let mut axes: [Vec<Key<f32>>; 2] = Default::default();
                    axes[slot] = keys;
                    merged.push((material, kind, axes));
                }
            }
        }
        for (material, kind, [u, v]) in merged {
            channels.push(match kind {
                UvChannelKind::Offset => ExtraChannel::UvOffset { material, u, v },
                UvChannelKind::Tiling => ExtraChannel::UvTiling { material, u, v },
            });
        }
        channels
    }
}

/// Geometry of one `FOLDMSLC` with material paths still unresolved
pub(crate) struct RawMslc {
    pub(crate) vertices: Vec<Vertex>,
    /// Declared material path and the faces using it, file order
    pub(crate) groups: Vec<(String, Vec<[u32; 3]>)>,
    pub(crate) bounds: Option<Bounds>,
    pub(crate) shadow: ShadowVolume,
}

/// Decode a `FOLDMSLC` subtree whose header was just read.
///
/// Bone indices in the result refer to `skeleton`, the skeleton of the
/// container the chunk came from; xref resolution remaps them afterwards.
pub(crate) fn decode_mslc<R: Read + Seek>(
    reader: &mut ChunkReader<R>,
    header: &ChunkHeader,
    skeleton: &Skeleton,
    variant: Variant,
) -> Result<RawMslc> {
    let end = reader.chunk_end(header)?;
    let mut raw = None;
    let mut bounds = None;
    while let Some(child) = reader.read_header_within(end)? {
        check_version(variant, Some(FOLD_MSLC), &child)?;
        match child.id {
            id if id == DATA_DATA => {
                let child_end = reader.chunk_end(&child)?;
                raw = Some(decode_mslc_data(reader, skeleton, variant)?);
                reader.finish_chunk(&child, child_end)?;
            }
            id if id == DATA_BVOL => {
                bounds = Some(read_bounds(reader, &child)?);
            }
            _ => {
                debug!("skipping {} inside FOLDMSLC", child.id);
                reader.skip_chunk(&child)?;
            }
        }
    }
    reader.finish_chunk(header, end)?;

    let mut raw = raw.ok_or(WhmError::MissingChunk("DATADATA"))?;
    raw.bounds = bounds;
    Ok(raw)
}

fn decode_mslc_data<R: Read + Seek>(
    reader: &mut ChunkReader<R>,
    skeleton: &Skeleton,
    variant: Variant,
) -> Result<RawMslc> {
    let legacy = variant == Variant::Sgm;
    let _reserved = reader.read_i32_le()?;
    let _flag = reader.read_u8()?;
    let _triangles = reader.read_u32_le()?;
    let _reserved = reader.read_i32_le()?;

    // declarative skin table; per-vertex ids below are what matters
    let skin_bones = reader.read_u32_le()?;
    for _ in 0..skin_bones {
        let name = reader.read_string()?;
        let index = reader.read_i32_le()?;
        let matches = usize::try_from(index)
            .ok()
            .and_then(|index| skeleton.bone(index))
            .is_some_and(|bone| bone.name.eq_ignore_ascii_case(&name));
        if !matches {
            debug!("skin table entry {name} does not match bone {index}");
        }
    }

    let vertex_count = reader.read_u32_le()?;
    let _vertex_size = reader.read_i32_le()?;

    let mut vertices = Vec::new();
    for _ in 0..vertex_count {
        vertices.push(Vertex {
            position: mesh_vector_from_disk(read_vec3(reader)?),
            normal: glam::Vec3::ZERO,
            uv: glam::Vec2::ZERO,
            influences: Vec::new(),
        });
    }
    if skin_bones != 0 {
        for vertex in &mut vertices {
            let mut weights = [0.0f32; 4];
            for weight in weights.iter_mut().take(3) {
                *weight = reader.read_f32_le()?;
            }
            weights[3] = 1.0 - weights[..3].iter().sum::<f32>();
            for weight in weights {
                let id = reader.read_u8()?;
                if id == u8::MAX || weight == 0.0 {
                    continue;
                }
                if usize::from(id) >= skeleton.len() {
                    return Err(WhmError::BoneIndexOutOfRange {
                        index: i64::from(id),
                        count: skeleton.len(),
                    });
                }
                vertex.influences.push(Influence {
                    bone: usize::from(id),
                    weight,
                });
            }
        }
    }
    for vertex in &mut vertices {
        vertex.normal = mesh_vector_from_disk(read_vec3(reader)?);
    }
    for vertex in &mut vertices {
        let u = reader.read_f32_le()?;
        let v = reader.read_f32_le()?;
        vertex.uv = glam::Vec2::new(u, 1.0 - v);
    }
    if !legacy {
        reader.skip_bytes(4)?;
    }

    let mut groups = Vec::new();
    let group_count = reader.read_u32_le()?;
    for _ in 0..group_count {
        let path = reader.read_string()?;
        let index_count = reader.read_u32_le()?;
        let mut faces = Vec::new();
        for _ in 0..index_count / 3 {
            let a = u32::from(reader.read_u16_le()?);
            let b = u32::from(reader.read_u16_le()?);
            let c = u32::from(reader.read_u16_le()?);
            faces.push(swap_winding([a, b, c]));
        }
        let _min_index = reader.read_u16_le()?;
        let _index_range = reader.read_u16_le()?;
        if !legacy {
            reader.skip_bytes(4)?;
        }
        groups.push((path, faces));
    }

    let shadow = if legacy {
        ShadowVolume::default()
    } else {
        ShadowVolume {
            vertices: read_counted_records(reader, 12)?,
            edges: read_counted_records(reader, 24)?,
            faces: read_counted_records(reader, 40)?,
        }
    };

    Ok(RawMslc {
        vertices,
        groups,
        bounds: None,
        shadow,
    })
}

fn read_counted_records<R: Read>(reader: &mut R, record_size: usize) -> Result<Vec<u8>> {
    let count = reader.read_u32_le()?;
    Ok(reader.read_bytes(count as usize * record_size)?)
}

/// `DATASKEL` payload, shared by the model root and xref sources
pub(crate) fn read_skeleton_data<R: Read>(reader: &mut R) -> Result<Vec<Bone>> {
    let count = reader.read_u32_le()?;
    let mut bones = Vec::new();
    for _ in 0..count {
        let name = reader.read_string()?;
        bones.push(read_bone_payload(reader, name, &bones)?);
    }
    Ok(bones)
}

/// Legacy `FOLDSKEL` folder, one `DATABONE` per bone
pub(crate) fn read_fold_skel<R: Read + Seek>(
    variant: Variant,
    reader: &mut ChunkReader<R>,
    header: &ChunkHeader,
) -> Result<Skeleton> {
    let end = reader.chunk_end(header)?;
    let mut bones = Vec::new();
    while let Some(child) = reader.read_header_within(end)? {
        check_version(variant, Some(FOLD_SKEL), &child)?;
        match child.id {
            // the bone count, implied by the DATABONE chunks anyway
            id if id == DATA_INFO => reader.skip_chunk(&child)?,
            id if id == DATA_BONE => {
                let child_end = reader.chunk_end(&child)?;
                let bone = read_bone_payload(reader, child.name.clone(), &bones)?;
                bones.push(bone);
                reader.finish_chunk(&child, child_end)?;
            }
            _ => {
                debug!("skipping {} inside FOLDSKEL", child.id);
                reader.skip_chunk(&child)?;
            }
        }
    }
    reader.finish_chunk(header, end)?;
    Ok(Skeleton { bones })
}

fn read_bone_payload<R: Read>(reader: &mut R, name: String, earlier: &[Bone]) -> Result<Bone> {
    let parent = reader.read_i32_le()?;
    let parent = if parent < 0 {
        None
    } else if (parent as usize) < earlier.len() {
        Some(parent as usize)
    } else {
        // parents always precede their children
        return Err(WhmError::BoneIndexOutOfRange {
            index: i64::from(parent),
            count: earlier.len(),
        });
    };
    let position = bone_vector_from_disk(read_vec3(reader)?);
    let rotation = rotation_from_disk(read_vec4(reader)?);
    Ok(Bone {
        name,
        parent,
        position,
        rotation,
    })
}

fn read_marker_payload<R: Read>(reader: &mut R, name: String) -> Result<Marker> {
    let parent = reader.read_string()?;
    let parent = (!parent.is_empty()).then_some(parent);
    let rows = [read_vec3(reader)?, read_vec3(reader)?, read_vec3(reader)?];
    let rotation = Mat3::from_cols(rows[0].into(), rows[1].into(), rows[2].into()).transpose();
    let position = bone_vector_from_disk(read_vec3(reader)?);
    Ok(Marker {
        name,
        parent,
        rotation,
        position,
    })
}

/// Position and rotation keys plus the stale byte of one bone track
pub(crate) fn read_track_payload<R: Read>(reader: &mut R, bone: String) -> Result<BoneTrack> {
    let mut positions = Vec::new();
    let position_count = reader.read_u32_le()?;
    for _ in 0..position_count {
        let time = reader.read_f32_le()?;
        positions.push(Key::new(time, bone_vector_from_disk(read_vec3(reader)?)));
    }
    let mut rotations = Vec::new();
    let rotation_count = reader.read_u32_le()?;
    for _ in 0..rotation_count {
        let time = reader.read_f32_le()?;
        rotations.push(Key::new(time, rotation_from_disk(read_vec4(reader)?)));
    }
    let stale = reader.read_u8()? == 0;
    Ok(BoneTrack {
        bone,
        positions,
        rotations,
        stale,
    })
}

fn read_bounds<R: Read + Seek>(
    reader: &mut ChunkReader<R>,
    header: &ChunkHeader,
) -> Result<Bounds> {
    let end = reader.chunk_end(header)?;
    let _flag = reader.read_u8()?;
    let center = mesh_vector_from_disk(read_vec3(reader)?);
    let half_extents = mesh_vector_from_disk(read_vec3(reader)?).abs();
    // a 3x3 identity matrix trails the box in every known file
    reader.finish_chunk(header, end)?;
    Ok(Bounds {
        center,
        half_extents,
    })
}

fn read_burn_info<R: Read + Seek>(
    reader: &mut ChunkReader<R>,
    header: &ChunkHeader,
) -> Result<BurnInfo> {
    check_version(Variant::Whm, None, header)?;
    let end = reader.chunk_end(header)?;
    let tool = reader.read_string()?;
    let _reserved = reader.read_i32_le()?;
    let meta = reader.read_string()?;
    let date = reader.read_string()?;
    reader.finish_chunk(header, end)?;
    Ok(BurnInfo { tool, meta, date })
}

/// Material announced by `path`, resolved through the search scope.
///
/// A missing `.rsh` degrades to a placeholder with a warning; with no scope
/// at all the placeholder is silent because the caller opted out. A `.wtp`
/// pattern next to the texture is picked up when present.
pub(crate) fn load_material(
    scope: Option<&DowLayout>,
    report: &mut Report,
    path: &str,
) -> Result<Material> {
    let Some(scope) = scope else {
        return Ok(Material::placeholder(path));
    };
    let Some(rsh_path) = scope.find(&format!("{path}.rsh")) else {
        report.push(Warning::MissingTexture {
            path: path.to_string(),
        });
        return Ok(Material::placeholder(path));
    };
    let texture = RshFile::read(BufReader::new(File::open(&rsh_path)?))?;
    let pattern = match scope.find(&format!("{path}_default.wtp")) {
        Some(wtp_path) => Some(WtpFile::read(BufReader::new(File::open(&wtp_path)?))?),
        None => None,
    };
    Ok(Material {
        name: path_name(path).to_string(),
        full_path: Some(path.to_string()),
        single_image_path: None,
        internal: false,
        texture: Some(texture),
        pattern,
    })
}

/// Material name for a declared path, creating a placeholder on first sight
pub(crate) fn material_name_for_path(model: &mut SceneModel, path: &str) -> String {
    if let Some(material) = model
        .materials
        .iter()
        .find(|material| material.full_path.as_deref() == Some(path))
    {
        return material.name.clone();
    }
    let name = path_name(path);
    if let Some(material) = model.materials.iter().find(|material| material.name == name) {
        return material.name.clone();
    }
    let material = Material::placeholder(path);
    let name = material.name.clone();
    model.materials.push(material);
    name
}

fn read_vec3<R: Read>(reader: &mut R) -> std::io::Result<[f32; 3]> {
    Ok([
        reader.read_f32_le()?,
        reader.read_f32_le()?,
        reader.read_f32_le()?,
    ])
}

fn read_vec4<R: Read>(reader: &mut R) -> std::io::Result<[f32; 4]> {
    Ok([
        reader.read_f32_le()?,
        reader.read_f32_le()?,
        reader.read_f32_le()?,
        reader.read_f32_le()?,
    ])
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use glam::{Quat, Vec2, Vec3};
    use pretty_assertions::assert_eq;

    use dow_chunky::{ChunkWriter, FileHeader, WriteExt};

    use super::*;

    fn begin(writer: &mut ChunkWriter<Cursor<Vec<u8>>>, id: ChunkId, version: u32, name: &str) {
        writer.begin_chunk(id, version, name).unwrap();
    }

    fn write_vec3(writer: &mut ChunkWriter<Cursor<Vec<u8>>>, v: [f32; 3]) {
        for value in v {
            writer.write_f32_le(value).unwrap();
        }
    }

    fn write_skeleton(writer: &mut ChunkWriter<Cursor<Vec<u8>>>) {
        begin(writer, DATA_SKEL, 5, "");
        writer.write_u32_le(2).unwrap();
        writer.write_string("root").unwrap();
        writer.write_i32_le(-1).unwrap();
        write_vec3(writer, [0.0, 0.0, 0.0]);
        for value in [0.0, 0.0, 0.0, 1.0] {
            writer.write_f32_le(value).unwrap();
        }
        writer.write_string("arm").unwrap();
        writer.write_i32_le(0).unwrap();
        write_vec3(writer, [-1.0, 2.0, 3.0]);
        for value in [0.0, 0.0, 0.0, 1.0] {
            writer.write_f32_le(value).unwrap();
        }
        writer.end_chunk().unwrap();
    }

    /// One skinned triangle over both bones, one material
    fn write_mslc(writer: &mut ChunkWriter<Cursor<Vec<u8>>>, name: &str) {
        begin(writer, FOLD_MSLC, 1, name);
        begin(writer, DATA_DATA, 2, "");
        writer.write_i32_le(0).unwrap();
        writer.write_u8(1).unwrap();
        writer.write_u32_le(1).unwrap();
        writer.write_i32_le(0).unwrap();
        // skin table
        writer.write_u32_le(1).unwrap();
        writer.write_string("arm").unwrap();
        writer.write_i32_le(1).unwrap();
        // vertices
        writer.write_u32_le(3).unwrap();
        writer.write_i32_le(39).unwrap();
        write_vec3(writer, [-1.0, 0.0, 0.0]);
        write_vec3(writer, [-2.0, 0.0, 0.0]);
        write_vec3(writer, [-3.0, 1.0, 0.0]);
        for _ in 0..3 {
            write_vec3(writer, [0.75, 0.25, 0.0]);
            for id in [1u8, 0, 255, 255] {
                writer.write_u8(id).unwrap();
            }
        }
        for _ in 0..3 {
            write_vec3(writer, [0.0, 1.0, 0.0]);
        }
        for uv in [[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]] {
            writer.write_f32_le(uv[0]).unwrap();
            writer.write_f32_le(uv[1]).unwrap();
        }
        writer.write_zeros(4).unwrap();
        // one material group
        writer.write_u32_le(1).unwrap();
        writer.write_string("art/unit/body").unwrap();
        writer.write_u32_le(3).unwrap();
        for index in [0u16, 2, 1] {
            writer.write_u16_le(index).unwrap();
        }
        writer.write_u16_le(0).unwrap();
        writer.write_u16_le(3).unwrap();
        writer.write_zeros(4).unwrap();
        // empty shadow volume
        for _ in 0..3 {
            writer.write_u32_le(0).unwrap();
        }
        writer.end_chunk().unwrap();
        begin(writer, DATA_BVOL, 2, "");
        writer.write_u8(1).unwrap();
        write_vec3(writer, [-2.0, 0.5, 0.0]);
        write_vec3(writer, [1.0, 0.5, 0.0]);
        for _ in 0..9 {
            writer.write_f32_le(0.0).unwrap();
        }
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();
    }

    fn sample_whm() -> Vec<u8> {
        let mut writer = ChunkWriter::create(Cursor::new(Vec::new()), FileHeader::default()).unwrap();
        begin(&mut writer, DATA_FBIF, 1, "FileBurnInfo");
        writer.write_string("https://example.invalid/tool").unwrap();
        writer.write_i32_le(0).unwrap();
        writer.write_string("meta").unwrap();
        writer.write_string("January 01, 12:00:00 AM").unwrap();
        writer.end_chunk().unwrap();

        begin(&mut writer, FOLD_RSGM, 3, "trooper");
        begin(&mut writer, DATA_SSHR, 2, "art/unit/body");
        writer.write_string("art/unit/body").unwrap();
        writer.end_chunk().unwrap();
        write_skeleton(&mut writer);

        begin(&mut writer, FOLD_MSGR, 1, "");
        write_mslc(&mut writer, "body");
        begin(&mut writer, DATA_DATA, 1, "");
        writer.write_u32_le(1).unwrap();
        writer.write_string("body").unwrap();
        writer.write_string(".").unwrap();
        writer.write_i32_le(-1).unwrap();
        writer.end_chunk().unwrap();
        begin(&mut writer, DATA_BVOL, 2, "");
        writer.write_u8(1).unwrap();
        write_vec3(&mut writer, [-2.0, 0.5, 0.0]);
        write_vec3(&mut writer, [1.0, 0.5, 0.0]);
        for _ in 0..9 {
            writer.write_f32_le(0.0).unwrap();
        }
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();

        begin(&mut writer, DATA_MARK, 1, "");
        writer.write_u32_le(1).unwrap();
        writer.write_string("marker_muzzle").unwrap();
        writer.write_string("arm").unwrap();
        write_vec3(&mut writer, [1.0, 0.0, 0.0]);
        write_vec3(&mut writer, [0.0, 1.0, 0.0]);
        write_vec3(&mut writer, [0.0, 0.0, 1.0]);
        write_vec3(&mut writer, [-4.0, 5.0, 6.0]);
        writer.end_chunk().unwrap();

        begin(&mut writer, FOLD_ANIM, 3, "walk");
        begin(&mut writer, DATA_DATA, 2, "walk");
        writer.write_u32_le(11).unwrap();
        writer.write_f32_le(11.0 / 30.0).unwrap();
        // one bone track
        writer.write_u32_le(1).unwrap();
        writer.write_string("arm").unwrap();
        writer.write_u32_le(1).unwrap();
        writer.write_f32_le(0.0).unwrap();
        write_vec3(&mut writer, [-1.0, 2.0, 3.0]);
        writer.write_u32_le(1).unwrap();
        writer.write_f32_le(0.0).unwrap();
        for value in [0.0f32, -0.0, -0.0, 1.0] {
            writer.write_f32_le(value).unwrap();
        }
        writer.write_u8(1).unwrap();
        // channels: mesh visibility + one UV record
        writer.write_u32_le(2).unwrap();
        writer.write_string("body").unwrap();
        writer.write_i32_le(CHANNEL_MODE_MESH).unwrap();
        writer.write_zeros(8).unwrap();
        writer.write_u32_le(2).unwrap();
        writer.write_zeros(4).unwrap();
        writer.write_f32_le(1.0).unwrap();
        writer.write_f32_le(0.5).unwrap();
        writer.write_f32_le(1.0).unwrap();
        writer.write_string("art/unit/body").unwrap();
        writer.write_i32_le(CHANNEL_MODE_TEXTURE).unwrap();
        writer.write_zeros(4).unwrap();
        writer.write_i32_le(2).unwrap();
        writer.write_u32_le(1).unwrap();
        writer.write_f32_le(0.5).unwrap();
        writer.write_f32_le(-0.25).unwrap();
        // cameras
        writer.write_u32_le(0).unwrap();
        writer.end_chunk().unwrap();
        begin(&mut writer, DATA_ANBV, 1, "walk");
        writer.write_zeros(24).unwrap();
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();

        writer.end_chunk().unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_import_whm_container() {
        let bytes = sample_whm();
        let (model, report) = import_container(Cursor::new(bytes), &ImportOptions::default()).unwrap();
        assert!(report.is_empty(), "{report}");

        assert_eq!(model.name, "trooper");
        assert_eq!(model.burn_info.as_ref().unwrap().meta, "meta");

        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.materials[0].name, "body");
        assert_eq!(model.materials[0].full_path.as_deref(), Some("art/unit/body"));
        assert!(model.materials[0].texture.is_none());

        assert_eq!(model.skeleton.len(), 2);
        assert_eq!(model.skeleton.bones[1].name, "arm");
        assert_eq!(model.skeleton.bones[1].parent, Some(0));
        assert_eq!(model.skeleton.bones[1].position, Vec3::new(1.0, 2.0, 3.0));

        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.name, "body");
        assert_eq!(mesh.xref_source, None);
        assert_eq!(mesh.rigid_parent, None);
        let geometry = mesh.geometry.as_ref().unwrap();
        assert_eq!(geometry.vertices.len(), 3);
        assert_eq!(geometry.vertices[0].position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(geometry.vertices[2].position, Vec3::new(3.0, 0.0, 1.0));
        assert_eq!(geometry.vertices[0].normal, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(geometry.vertices[2].uv, Vec2::new(0.0, 0.0));
        assert_eq!(
            geometry.vertices[0].influences,
            vec![
                Influence { bone: 1, weight: 0.75 },
                Influence { bone: 0, weight: 0.25 }
            ]
        );
        assert_eq!(geometry.groups.len(), 1);
        assert_eq!(geometry.groups[0].material, "body");
        assert_eq!(geometry.groups[0].faces, vec![[0, 1, 2]]);
        let bounds = geometry.bounds.unwrap();
        assert_eq!(bounds.center, Vec3::new(2.0, 0.0, 0.5));
        assert_eq!(bounds.half_extents, Vec3::new(1.0, 0.0, 0.5));
        assert_eq!(model.bounds.unwrap().center, Vec3::new(2.0, 0.0, 0.5));

        assert_eq!(model.markers.len(), 1);
        let marker = &model.markers[0];
        assert_eq!(marker.name, "marker_muzzle");
        assert_eq!(marker.parent.as_deref(), Some("arm"));
        assert_eq!(marker.rotation, Mat3::IDENTITY);
        assert_eq!(marker.position, Vec3::new(4.0, 5.0, 6.0));

        assert_eq!(model.actions.len(), 1);
        let action = &model.actions[0];
        assert_eq!(action.name, "walk");
        assert_eq!(action.frames, 11);
        assert_eq!(action.bones.len(), 1);
        assert_eq!(action.bones[0].bone, "arm");
        assert!(!action.bones[0].stale);
        assert_eq!(action.bones[0].positions[0].value, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(action.bones[0].rotations[0].value, Quat::IDENTITY);
        assert_eq!(
            action.channels,
            vec![
                ExtraChannel::Visibility {
                    mesh: "body".to_string(),
                    keys: vec![Key::new(0.5, 1.0)],
                },
                ExtraChannel::UvOffset {
                    material: "body".to_string(),
                    u: Vec::new(),
                    v: vec![Key::new(0.5, 0.25)],
                },
            ]
        );
    }

    #[test]
    fn test_import_sgm_container() {
        let mut writer =
            ChunkWriter::create(Cursor::new(Vec::new()), FileHeader::default()).unwrap();
        begin(&mut writer, FOLD_RSGM, 1, "relic");
        begin(&mut writer, DATA_SSHR, 1, "body");
        writer.write_string("body").unwrap();
        writer.end_chunk().unwrap();

        begin(&mut writer, FOLD_SKEL, 3, "");
        begin(&mut writer, DATA_INFO, 1, "");
        writer.write_u32_le(1).unwrap();
        writer.end_chunk().unwrap();
        begin(&mut writer, DATA_BONE, 5, "root");
        writer.write_i32_le(-1).unwrap();
        write_vec3(&mut writer, [-1.0, 0.0, 0.0]);
        for value in [0.0f32, 0.0, 0.0, 1.0] {
            writer.write_f32_le(value).unwrap();
        }
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();

        begin(&mut writer, DATA_MARK, 1, "marker_head");
        writer.write_string("root").unwrap();
        write_vec3(&mut writer, [1.0, 0.0, 0.0]);
        write_vec3(&mut writer, [0.0, 1.0, 0.0]);
        write_vec3(&mut writer, [0.0, 0.0, 1.0]);
        write_vec3(&mut writer, [0.0, 0.0, 2.0]);
        writer.end_chunk().unwrap();

        begin(&mut writer, FOLD_ANIM, 2, "idle");
        begin(&mut writer, FOLD_DATA, 3, "idle");
        begin(&mut writer, DATA_INFO, 5, "");
        writer.write_u32_le(5).unwrap();
        writer.write_f32_le(5.0 / 30.0).unwrap();
        writer.end_chunk().unwrap();
        begin(&mut writer, DATA_BANM, 2, "root");
        writer.write_u32_le(0).unwrap();
        writer.write_u32_le(0).unwrap();
        writer.write_u8(0).unwrap();
        writer.end_chunk().unwrap();
        begin(&mut writer, DATA_CANM, 2, "mesh_a");
        writer.write_i32_le(CHANNEL_MODE_MESH).unwrap();
        writer.write_zeros(8).unwrap();
        writer.write_u32_le(1).unwrap();
        writer.write_zeros(4).unwrap();
        writer.write_f32_le(0.0).unwrap();
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();

        writer.end_chunk().unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let (model, report) =
            import_container(Cursor::new(bytes), &ImportOptions::default()).unwrap();
        assert!(report.is_empty(), "{report}");
        assert_eq!(model.name, "relic");
        assert_eq!(model.burn_info, None);
        assert_eq!(model.skeleton.len(), 1);
        assert_eq!(model.skeleton.bones[0].position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(model.markers.len(), 1);
        assert_eq!(model.markers[0].name, "marker_head");
        assert_eq!(model.actions.len(), 1);
        let action = &model.actions[0];
        assert_eq!(action.name, "idle");
        assert_eq!(action.frames, 5);
        assert!(action.bones[0].stale);
        assert_eq!(
            action.channels,
            vec![ExtraChannel::ForceInvisible {
                mesh: "mesh_a".to_string(),
                hidden: true,
            }]
        );
    }

    #[test]
    fn test_mesh_list_creates_xref_stub() {
        let mut writer =
            ChunkWriter::create(Cursor::new(Vec::new()), FileHeader::default()).unwrap();
        begin(&mut writer, FOLD_RSGM, 3, "wreck");
        write_skeleton(&mut writer);
        begin(&mut writer, FOLD_MSGR, 1, "");
        begin(&mut writer, DATA_DATA, 1, "");
        writer.write_u32_le(1).unwrap();
        writer.write_string("hull").unwrap();
        writer.write_string("art/shared/hull").unwrap();
        writer.write_i32_le(1).unwrap();
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let scope = DowLayout::default();
        let (model, report) = import_container(
            Cursor::new(bytes),
            &ImportOptions { scope: Some(scope) },
        )
        .unwrap();
        assert_eq!(
            report.warnings(),
            &[Warning::MissingReference {
                entity: "hull".to_string(),
                source: "art/shared/hull".to_string(),
            }]
        );
        let mesh = model.mesh("hull").unwrap();
        assert_eq!(mesh.xref_source.as_deref(), Some("art/shared/hull"));
        assert_eq!(mesh.rigid_parent, Some(1));
        assert!(mesh.geometry.is_none());
    }

    #[test]
    fn test_rejects_non_model_root() {
        let mut writer =
            ChunkWriter::create(Cursor::new(Vec::new()), FileHeader::default()).unwrap();
        begin(&mut writer, ChunkId::fold(b"SHRF"), 1, "texture");
        writer.end_chunk().unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = import_container(Cursor::new(bytes), &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, WhmError::NotAModelRoot(id) if id == ChunkId::fold(b"SHRF")));
    }

    #[test]
    fn test_rejects_unknown_root_version() {
        let mut writer =
            ChunkWriter::create(Cursor::new(Vec::new()), FileHeader::default()).unwrap();
        begin(&mut writer, FOLD_RSGM, 7, "future");
        writer.end_chunk().unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = import_container(Cursor::new(bytes), &ImportOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            WhmError::Chunky(ChunkyError::UnsupportedVersion { version: 7, .. })
        ));
    }

    #[test]
    fn test_rejects_mismatched_chunk_version() {
        let mut writer =
            ChunkWriter::create(Cursor::new(Vec::new()), FileHeader::default()).unwrap();
        begin(&mut writer, FOLD_RSGM, 3, "trooper");
        begin(&mut writer, DATA_SSHR, 1, "body");
        writer.write_string("body").unwrap();
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = import_container(Cursor::new(bytes), &ImportOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            WhmError::Chunky(ChunkyError::UnsupportedVersion { version: 1, .. })
        ));
    }

    #[test]
    fn test_truncated_container_is_fatal() {
        let mut bytes = sample_whm();
        bytes.truncate(bytes.len() / 2);
        let err = import_container(Cursor::new(bytes), &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, WhmError::Io(_) | WhmError::Chunky(_)));
    }

    #[test]
    fn test_bone_index_out_of_range() {
        let mut writer =
            ChunkWriter::create(Cursor::new(Vec::new()), FileHeader::default()).unwrap();
        begin(&mut writer, FOLD_RSGM, 3, "broken");
        begin(&mut writer, DATA_SKEL, 5, "");
        writer.write_u32_le(1).unwrap();
        writer.write_string("loose").unwrap();
        writer.write_i32_le(4).unwrap();
        write_vec3(&mut writer, [0.0, 0.0, 0.0]);
        for value in [0.0f32, 0.0, 0.0, 1.0] {
            writer.write_f32_le(value).unwrap();
        }
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = import_container(Cursor::new(bytes), &ImportOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            WhmError::BoneIndexOutOfRange { index: 4, count: 0 }
        ));
    }
}
