//! Model container encoding.
//!
//! [`export_container`] serializes a [`SceneModel`] into either dialect.
//! Entities the container cannot hold degrade with a warning instead of
//! failing: oversized meshes and faceless meshes are dropped, weighted
//! xrefs are embedded, action xrefs are skipped. Referenced textures can
//! be written as companion `.rsh` / `.wtp` files through a
//! [`PathDispatcher`].

use std::fs;
use std::fs::File;
use std::io::{Seek, Write};

use glam::Quat;
use log::warn;

use dow_chunky::{ChunkId, ChunkWriter, FileHeader, WriteExt};
use dow_tex::{PathDispatcher, RshFile, RshWriteOptions};

use crate::anim::{CHANNEL_MODE_MESH, CHANNEL_MODE_TEXTURE, UvRecord};
use crate::coordinate::{
    align_rotation, bone_vector_to_disk, mesh_vector_to_disk, rotation_to_disk, swap_winding,
};
use crate::error::{Result, WhmError};
use crate::mesh::detect_force_skin;
use crate::report::{Report, Warning};
use crate::scene::{
    Action, Bounds, ExtraChannel, Geometry, Key, Material, SceneModel, UvChannelKind,
};
use crate::versions::Variant;

const FOLD_RSGM: ChunkId = ChunkId::fold(b"RSGM");
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
const DATA_BANM: ChunkId = ChunkId::data(b"BANM");
const DATA_CANM: ChunkId = ChunkId::data(b"CANM");
const DATA_ANBV: ChunkId = ChunkId::data(b"ANBV");

/// Face indices are 16 bit, capping addressable vertices per mesh
const MAX_MESH_VERTICES: usize = 65536;

/// Options for [`export_container`]
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Dialect to write
    pub variant: Variant,
    /// Declared-path folder for materials without a path of their own
    pub default_texture_folder: String,
    /// Warn about texture layers larger than this in either dimension
    pub max_texture_size: u32,
    /// Emit the extra texture chunks Object Editor expects
    pub oe_compatible_textures: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            variant: Variant::Whm,
            default_texture_folder: String::new(),
            max_texture_size: 1024,
            oe_compatible_textures: false,
        }
    }
}

/// Write a model container in the dialect `options` selects.
///
/// When `textures` is given, resolved external materials also produce
/// `.rsh` (and `.wtp` when a pattern is present) files through it; the
/// caller keeps the dispatcher to dump its index afterwards.
pub fn export_container<W: Write + Seek>(
    model: &SceneModel,
    sink: W,
    textures: Option<&mut PathDispatcher>,
    options: &ExportOptions,
) -> Result<Report> {
    let mut writer = ChunkWriter::create(sink, FileHeader::default())?;
    let mut encoder = Encoder {
        model,
        options,
        textures,
        report: Report::new(),
        materials: Vec::new(),
        meshes: Vec::new(),
    };
    if options.variant == Variant::Whm {
        encoder.write_burn_info(&mut writer)?;
    }
    writer.begin_chunk(FOLD_RSGM, options.variant.root_version(), &model.name)?;
    encoder.write_materials(&mut writer)?;
    encoder.write_skeleton(&mut writer)?;
    encoder.write_meshes(&mut writer)?;
    encoder.write_markers(&mut writer)?;
    encoder.write_actions(&mut writer)?;
    writer.end_chunk()?;
    writer.finish()?;
    Ok(encoder.report)
}

struct Encoder<'a> {
    model: &'a SceneModel,
    options: &'a ExportOptions,
    textures: Option<&'a mut PathDispatcher>,
    report: Report,
    /// Material name and declared path, in write order
    materials: Vec<(String, String)>,
    /// Mesh-list records in write order
    meshes: Vec<MeshRecord<'a>>,
}

struct MeshRecord<'a> {
    name: &'a str,
    /// Path written to the mesh list; empty marks a local mesh
    source: &'a str,
    /// Rigid parent bone for the mesh list
    parent: Option<usize>,
    /// Geometry embedded as a mesh chunk, with or without skin weights
    embedded: Option<(&'a Geometry, bool)>,
}

impl<'a> Encoder<'a> {
    fn whm(&self) -> bool {
        self.options.variant == Variant::Whm
    }

    fn write_burn_info<W: Write + Seek>(&mut self, writer: &mut ChunkWriter<W>) -> Result<()> {
        let info = self.model.burn_info.clone().unwrap_or_default();
        writer.begin_chunk(DATA_FBIF, 1, "FileBurnInfo")?;
        writer.write_string(&info.tool)?;
        writer.write_i32_le(0)?;
        writer.write_string(&info.meta)?;
        writer.write_string(&info.date)?;
        writer.end_chunk()?;
        Ok(())
    }

    fn write_materials<W: Write + Seek>(&mut self, writer: &mut ChunkWriter<W>) -> Result<()> {
        let rsh_options = RshWriteOptions {
            oe_compatible: self.options.oe_compatible_textures,
        };
        for material in &self.model.materials {
            let declared = material.declared_path(&self.options.default_texture_folder);
            match &material.texture {
                Some(rsh) if material.internal => {
                    self.check_texture_size(material, rsh);
                    rsh.write_chunks(writer, &rsh_options)?;
                }
                texture => {
                    if material.internal {
                        warn!(
                            "material {} is internal but has no texture, writing a reference",
                            material.name
                        );
                    }
                    let version = if self.whm() { 2 } else { 1 };
                    writer.begin_chunk(DATA_SSHR, version, &declared)?;
                    writer.write_string(&declared)?;
                    writer.end_chunk()?;
                    if let Some(rsh) = texture {
                        self.check_texture_size(material, rsh);
                        self.export_texture_files(material, rsh, &declared, &rsh_options)?;
                    }
                }
            }
            self.materials.push((material.name.clone(), declared));
        }
        Ok(())
    }

    /// Companion `.rsh` and `.wtp` files next to the container
    fn export_texture_files(
        &mut self,
        material: &Material,
        rsh: &RshFile,
        declared: &str,
        rsh_options: &RshWriteOptions,
    ) -> Result<()> {
        let Some(dispatcher) = self.textures.as_deref_mut() else {
            return Ok(());
        };
        let rsh_declared = format!("{declared}.rsh");
        let path = dispatcher.get_path(&rsh_declared, false);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        rsh.write(File::create(&path)?, rsh_options)?;
        dispatcher.record(&rsh_declared, &path);

        if let Some(pattern) = &material.pattern {
            let wtp_declared = format!("{declared}_default.wtp");
            let path = dispatcher.get_path(&wtp_declared, false);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            pattern.write(File::create(&path)?)?;
            dispatcher.record(&wtp_declared, &path);
        }
        Ok(())
    }

    fn check_texture_size(&mut self, material: &Material, rsh: &RshFile) {
        let max = self.options.max_texture_size;
        for layer in &rsh.layers {
            if layer.image.width > max || layer.image.height > max {
                self.report.push(Warning::OversizedTexture {
                    material: material.name.clone(),
                    width: layer.image.width,
                    height: layer.image.height,
                    max,
                });
                return;
            }
        }
    }

    fn write_skeleton<W: Write + Seek>(&mut self, writer: &mut ChunkWriter<W>) -> Result<()> {
        let bones = &self.model.skeleton.bones;
        if bones.is_empty() {
            return Ok(());
        }
        if self.whm() {
            writer.begin_chunk(DATA_SKEL, 5, "")?;
            writer.write_u32_le(bones.len() as u32)?;
            for bone in bones {
                writer.write_string(&bone.name)?;
                write_bone_payload(writer, bone)?;
            }
            writer.end_chunk()?;
        } else {
            writer.begin_chunk(FOLD_SKEL, 3, "")?;
            writer.begin_chunk(DATA_INFO, 1, "")?;
            writer.write_u32_le(bones.len() as u32)?;
            writer.end_chunk()?;
            for bone in bones {
                writer.begin_chunk(DATA_BONE, 5, &bone.name)?;
                write_bone_payload(writer, bone)?;
                writer.end_chunk()?;
            }
            writer.end_chunk()?;
        }
        Ok(())
    }

    /// Decide which meshes are embedded, referenced or dropped
    fn plan_meshes(&mut self) {
        let model = self.model;
        for mesh in &model.meshes {
            let geometry = mesh
                .geometry
                .as_ref()
                .filter(|geometry| !geometry.groups.is_empty());
            let Some(geometry) = geometry else {
                match mesh.xref_source.as_deref() {
                    Some(source) => self.meshes.push(MeshRecord {
                        name: &mesh.name,
                        source,
                        parent: mesh.rigid_parent,
                        embedded: None,
                    }),
                    None => self.report.push(Warning::EmptyMesh {
                        mesh: mesh.name.clone(),
                    }),
                }
                continue;
            };
            if geometry.vertices.len() > MAX_MESH_VERTICES {
                self.report.push(Warning::VertexBudgetExceeded {
                    mesh: mesh.name.clone(),
                    vertices: geometry.vertices.len(),
                });
                continue;
            }

            let rigid_bone = detect_force_skin(mesh);
            let skinned = geometry.is_skinned() && rigid_bone.is_none();
            let source = match mesh.xref_source.as_deref() {
                Some(_) if skinned => {
                    self.report.push(Warning::XrefWeighted {
                        mesh: mesh.name.clone(),
                    });
                    None
                }
                source => source,
            };
            if let Some(source) = source {
                self.meshes.push(MeshRecord {
                    name: &mesh.name,
                    source,
                    parent: rigid_bone.or(mesh.rigid_parent),
                    embedded: None,
                });
                continue;
            }
            if !skinned && rigid_bone.is_none() && !self.model.skeleton.is_empty() {
                self.report.push(Warning::UnweightedMesh {
                    mesh: mesh.name.clone(),
                });
            }
            self.meshes.push(MeshRecord {
                name: &mesh.name,
                source: "",
                parent: rigid_bone,
                embedded: Some((geometry, skinned)),
            });
        }
    }

    fn write_meshes<W: Write + Seek>(&mut self, writer: &mut ChunkWriter<W>) -> Result<()> {
        self.plan_meshes();
        writer.begin_chunk(FOLD_MSGR, 1, "")?;
        let mut global_bounds: Option<Bounds> = None;
        for index in 0..self.meshes.len() {
            let record = &self.meshes[index];
            let Some((geometry, skinned)) = record.embedded else {
                continue;
            };
            let name = record.name;
            let bounds = geometry.effective_bounds();
            global_bounds = match (global_bounds, bounds) {
                (Some(a), Some(b)) => Some(a.union(b)),
                (a, b) => a.or(b),
            };
            self.write_mslc(writer, name, geometry, skinned, bounds)?;
        }

        writer.begin_chunk(DATA_DATA, 1, "")?;
        writer.write_u32_le(self.meshes.len() as u32)?;
        for record in &self.meshes {
            writer.write_string(record.name)?;
            writer.write_string(record.source)?;
            let parent = record.parent.map_or(-1, |bone| bone as i32);
            writer.write_i32_le(parent)?;
        }
        writer.end_chunk()?;

        write_bvol(writer, global_bounds)?;
        writer.end_chunk()?;
        Ok(())
    }

    fn write_mslc<W: Write + Seek>(
        &mut self,
        writer: &mut ChunkWriter<W>,
        name: &str,
        geometry: &Geometry,
        skinned: bool,
        bounds: Option<Bounds>,
    ) -> Result<()> {
        writer.begin_chunk(FOLD_MSLC, 1, name)?;
        writer.begin_chunk(DATA_DATA, 2, "")?;
        writer.write_zeros(4)?;
        writer.write_u8(1)?;
        writer.write_u32_le(geometry.face_count() as u32)?;
        writer.write_zeros(4)?;

        if skinned {
            let skin_bones = geometry.skin_bones();
            writer.write_u32_le(skin_bones.len() as u32)?;
            for &bone in &skin_bones {
                match self.model.skeleton.bone(bone) {
                    Some(bone_data) => writer.write_string(&bone_data.name)?,
                    None => {
                        return Err(WhmError::BoneIndexOutOfRange {
                            index: bone as i64,
                            count: self.model.skeleton.len(),
                        });
                    }
                }
                writer.write_i32_le(bone as i32)?;
            }
        } else {
            writer.write_u32_le(0)?;
        }

        writer.write_u32_le(geometry.vertices.len() as u32)?;
        writer.write_i32_le(if skinned { 39 } else { 37 })?;
        for vertex in &geometry.vertices {
            write_vec3(writer, mesh_vector_to_disk(vertex.position))?;
        }
        if skinned {
            let mut excess_warned = false;
            for vertex in &geometry.vertices {
                let mut influences: Vec<_> = vertex.influences.iter().collect();
                influences.sort_by(|a, b| b.weight.total_cmp(&a.weight));
                if influences.len() > 4 && !excess_warned {
                    excess_warned = true;
                    self.report.push(Warning::ExcessInfluences {
                        mesh: name.to_string(),
                    });
                }
                let mut weights = [0.0f32; 4];
                let mut ids = [u8::MAX; 4];
                for (slot, influence) in influences.iter().take(4).enumerate() {
                    weights[slot] = influence.weight;
                    ids[slot] = u8::try_from(influence.bone).map_err(|_| {
                        WhmError::BoneNotAddressable {
                            mesh: name.to_string(),
                            bone: self
                                .model
                                .skeleton
                                .bone(influence.bone)
                                .map(|bone| bone.name.clone())
                                .unwrap_or_else(|| influence.bone.to_string()),
                        }
                    })?;
                }
                let total = weights.iter().sum::<f32>();
                let total = if total == 0.0 { 1.0 } else { total };
                for weight in &weights[..3] {
                    writer.write_f32_le(weight / total)?;
                }
                for id in ids {
                    writer.write_u8(id)?;
                }
            }
        }
        for vertex in &geometry.vertices {
            write_vec3(writer, mesh_vector_to_disk(vertex.normal))?;
        }
        for vertex in &geometry.vertices {
            writer.write_f32_le(vertex.uv.x)?;
            writer.write_f32_le(1.0 - vertex.uv.y)?;
        }
        if self.whm() {
            writer.write_zeros(4)?;
        }

        writer.write_u32_le(geometry.groups.len() as u32)?;
        for (index, group) in geometry.groups.iter().enumerate() {
            let declared = self
                .materials
                .iter()
                .find(|(name, _)| *name == group.material)
                .map(|(_, declared)| declared.clone())
                .unwrap_or_else(|| format!("missing_mat_{index}"));
            writer.write_string(&declared)?;
            writer.write_u32_le(group.faces.len() as u32 * 3)?;
            let mut min_index = u16::MAX;
            let mut max_index = 0u16;
            for &face in &group.faces {
                let swapped = swap_winding(face);
                for vertex in swapped {
                    let vertex = vertex as u16;
                    min_index = min_index.min(vertex);
                    max_index = max_index.max(vertex);
                    writer.write_u16_le(vertex)?;
                }
            }
            if group.faces.is_empty() {
                writer.write_u16_le(0)?;
                writer.write_u16_le(0)?;
            } else {
                writer.write_u16_le(min_index)?;
                writer.write_u16_le(max_index - min_index + 1)?;
            }
            if self.whm() {
                writer.write_zeros(4)?;
            }
        }

        if self.whm() {
            let shadow = &geometry.shadow;
            for (bytes, size) in [
                (&shadow.vertices, 12),
                (&shadow.edges, 24),
                (&shadow.faces, 40),
            ] {
                writer.write_u32_le((bytes.len() / size) as u32)?;
                writer.write_all(bytes)?;
            }
        }
        writer.end_chunk()?;

        write_bvol(writer, bounds)?;
        writer.end_chunk()?;
        Ok(())
    }

    fn write_markers<W: Write + Seek>(&mut self, writer: &mut ChunkWriter<W>) -> Result<()> {
        if self.model.markers.is_empty() {
            return Ok(());
        }
        if self.whm() {
            writer.begin_chunk(DATA_MARK, 1, "")?;
            writer.write_u32_le(self.model.markers.len() as u32)?;
        }
        for marker in &self.model.markers {
            if self.whm() {
                writer.write_string(&marker.name)?;
            } else {
                writer.begin_chunk(DATA_MARK, 1, &marker.name)?;
            }
            writer.write_string(marker.parent.as_deref().unwrap_or(""))?;
            for row in 0..3 {
                write_vec3(writer, marker.rotation.row(row).to_array())?;
            }
            write_vec3(writer, bone_vector_to_disk(marker.position))?;
            if !self.whm() {
                writer.end_chunk()?;
            }
        }
        if self.whm() {
            writer.end_chunk()?;
        }
        Ok(())
    }

    fn write_actions<W: Write + Seek>(&mut self, writer: &mut ChunkWriter<W>) -> Result<()> {
        for action in &self.model.actions {
            if action.xref_source.is_some() {
                self.report.push(Warning::DroppedActionXref {
                    action: action.name.clone(),
                });
                continue;
            }
            let version = if self.whm() { 3 } else { 2 };
            writer.begin_chunk(FOLD_ANIM, version, &action.name)?;
            if self.whm() {
                writer.begin_chunk(DATA_DATA, 2, &action.name)?;
                writer.write_u32_le(action.frames)?;
                writer.write_f32_le(action.duration())?;
                self.write_action_body(writer, action)?;
                writer.end_chunk()?;
                writer.begin_chunk(DATA_ANBV, 1, &action.name)?;
                writer.write_zeros(24)?;
                writer.end_chunk()?;
            } else {
                writer.begin_chunk(FOLD_DATA, 3, &action.name)?;
                writer.begin_chunk(DATA_INFO, 5, "")?;
                writer.write_u32_le(action.frames)?;
                writer.write_f32_le(action.duration())?;
                writer.end_chunk()?;
                self.write_action_body(writer, action)?;
                writer.end_chunk()?;
            }
            writer.end_chunk()?;
        }
        Ok(())
    }

    fn write_action_body<W: Write + Seek>(
        &mut self,
        writer: &mut ChunkWriter<W>,
        action: &Action,
    ) -> Result<()> {
        if self.whm() {
            writer.write_u32_le(self.model.skeleton.len() as u32)?;
        }
        for bone in &self.model.skeleton.bones {
            if self.whm() {
                writer.write_string(&bone.name)?;
            } else {
                writer.begin_chunk(DATA_BANM, 2, &bone.name)?;
            }
            write_bone_track(writer, action.track(&bone.name))?;
            if !self.whm() {
                writer.end_chunk()?;
            }
        }
        for track in &action.bones {
            if self.model.skeleton.index_of(&track.bone).is_none() {
                warn!(
                    "action {} animates unknown bone {}, dropping the track",
                    action.name, track.bone
                );
            }
        }

        let channels = self.plan_channels(action);
        if self.whm() {
            writer.write_u32_le(channels.len() as u32)?;
        }
        for channel in channels {
            if self.whm() {
                writer.write_string(&channel.target)?;
                channel.write_payload(writer)?;
            } else {
                writer.begin_chunk(DATA_CANM, 2, &channel.target)?;
                channel.write_payload(writer)?;
                writer.end_chunk()?;
            }
        }
        if self.whm() {
            // no camera tracks
            writer.write_u32_le(0)?;
        }
        Ok(())
    }

    /// One record per exported mesh plus one per animated UV axis
    fn plan_channels(&mut self, action: &Action) -> Vec<ChannelRecord> {
        let mut records = Vec::new();
        for record in &self.meshes {
            let mut flag = 1.0;
            let mut keys: &[Key<f32>] = &[];
            for channel in &action.channels {
                match channel {
                    ExtraChannel::ForceInvisible { mesh, hidden } if mesh == record.name => {
                        flag = if *hidden { 0.0 } else { 1.0 };
                    }
                    ExtraChannel::Visibility { mesh, keys: k } if mesh == record.name => {
                        keys = k;
                    }
                    _ => {}
                }
            }
            // a leading always-visible key is implied by the flag
            if let Some((first, rest)) = keys.split_first() {
                if first.time == 0.0 && first.value == 1.0 {
                    keys = rest;
                }
            }
            records.push(ChannelRecord {
                target: record.name.to_string(),
                payload: ChannelPayload::Visibility {
                    flag,
                    keys: keys.to_vec(),
                },
            });
        }

        for channel in &action.channels {
            let (material, kind, u, v) = match channel {
                ExtraChannel::UvOffset { material, u, v } => {
                    (material, UvChannelKind::Offset, u, v)
                }
                ExtraChannel::UvTiling { material, u, v } => {
                    (material, UvChannelKind::Tiling, u, v)
                }
                ExtraChannel::ForceInvisible { mesh, .. }
                | ExtraChannel::Visibility { mesh, .. } => {
                    if !self.meshes.iter().any(|record| record.name == mesh) {
                        self.report.push(Warning::DroppedChannel {
                            target: mesh.clone(),
                        });
                    }
                    continue;
                }
            };
            let Some((_, declared)) = self
                .materials
                .iter()
                .find(|(name, _)| name == material)
            else {
                self.report.push(Warning::DroppedChannel {
                    target: material.clone(),
                });
                continue;
            };
            for (v_axis, keys) in [(false, u), (true, v)] {
                if keys.is_empty() {
                    continue;
                }
                records.push(ChannelRecord {
                    target: declared.clone(),
                    payload: ChannelPayload::Uv {
                        record: UvRecord::for_axis(kind, v_axis),
                        keys: keys.clone(),
                    },
                });
            }
        }
        records
    }
}

struct ChannelRecord {
    target: String,
    payload: ChannelPayload,
}

enum ChannelPayload {
    Visibility { flag: f32, keys: Vec<Key<f32>> },
    Uv { record: UvRecord, keys: Vec<Key<f32>> },
}

impl ChannelRecord {
    fn write_payload<W: Write + Seek>(&self, writer: &mut ChunkWriter<W>) -> Result<()> {
        match &self.payload {
            ChannelPayload::Visibility { flag, keys } => {
                writer.write_i32_le(CHANNEL_MODE_MESH)?;
                writer.write_zeros(8)?;
                writer.write_u32_le(keys.len() as u32 + 1)?;
                writer.write_zeros(4)?;
                writer.write_f32_le(*flag)?;
                for key in keys {
                    writer.write_f32_le(key.time)?;
                    writer.write_f32_le(key.value)?;
                }
            }
            ChannelPayload::Uv { record, keys } => {
                writer.write_i32_le(CHANNEL_MODE_TEXTURE)?;
                writer.write_zeros(4)?;
                writer.write_i32_le(record.code())?;
                writer.write_u32_le(keys.len() as u32)?;
                for key in keys {
                    writer.write_f32_le(key.time)?;
                    writer.write_f32_le(key.value * record.disk_scale())?;
                }
            }
        }
        Ok(())
    }
}

fn write_bone_payload<W: Write + Seek>(
    writer: &mut ChunkWriter<W>,
    bone: &crate::scene::Bone,
) -> Result<()> {
    let parent = bone.parent.map_or(-1, |index| index as i32);
    writer.write_i32_le(parent)?;
    write_vec3(writer, bone_vector_to_disk(bone.position))?;
    write_vec4(writer, rotation_to_disk(bone.rotation))?;
    Ok(())
}

fn write_bone_track<W: Write + Seek>(
    writer: &mut ChunkWriter<W>,
    track: Option<&crate::scene::BoneTrack>,
) -> Result<()> {
    let empty = crate::scene::BoneTrack::empty("");
    let track = track.unwrap_or(&empty);
    writer.write_u32_le(track.positions.len() as u32)?;
    for key in &track.positions {
        writer.write_f32_le(key.time)?;
        write_vec3(writer, bone_vector_to_disk(key.value))?;
    }
    writer.write_u32_le(track.rotations.len() as u32)?;
    let mut previous: Option<Quat> = None;
    for key in &track.rotations {
        writer.write_f32_le(key.time)?;
        let rotation = match previous {
            Some(prev) => align_rotation(prev, key.value),
            None => key.value,
        };
        previous = Some(rotation);
        write_vec4(writer, rotation_to_disk(rotation))?;
    }
    writer.write_u8(u8::from(!track.stale))?;
    Ok(())
}

fn write_bvol<W: Write + Seek>(
    writer: &mut ChunkWriter<W>,
    bounds: Option<Bounds>,
) -> Result<()> {
    writer.begin_chunk(DATA_BVOL, 2, "")?;
    writer.write_u8(1)?;
    let (center, half) = match bounds {
        Some(bounds) => (
            mesh_vector_to_disk(bounds.center),
            mesh_vector_to_disk(bounds.half_extents).map(f32::abs),
        ),
        None => ([0.0; 3], [0.0; 3]),
    };
    write_vec3(writer, center)?;
    write_vec3(writer, half)?;
    for row in 0..3 {
        for column in 0..3 {
            writer.write_f32_le(if row == column { 1.0 } else { 0.0 })?;
        }
    }
    writer.end_chunk()?;
    Ok(())
}

fn write_vec3<W: Write + Seek>(writer: &mut ChunkWriter<W>, v: [f32; 3]) -> Result<()> {
    for value in v {
        writer.write_f32_le(value)?;
    }
    Ok(())
}

fn write_vec4<W: Write + Seek>(writer: &mut ChunkWriter<W>, v: [f32; 4]) -> Result<()> {
    for value in v {
        writer.write_f32_le(value)?;
    }
    Ok(())
}
