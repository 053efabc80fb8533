//! Cross-file mesh resolution.
//!
//! A mesh-list record may point at a mesh stored in another container.
//! Resolution opens `<source>.whm` through the search scope, reads the
//! source's own skeleton and materials, extracts the identically-named
//! mesh and remaps its skin weights onto the host skeleton by bone name.
//! A missing file or mesh leaves the stub in place with a warning; a
//! present but malformed source fails the import like any other parse
//! error.

use std::fs::File;
use std::io::BufReader;

use log::{debug, warn};

use dow_chunky::{ChunkId, ChunkReader, ChunkyError, ReadExt};

use crate::error::Result;
use crate::layout::DowLayout;
use crate::parser;
use crate::report::{Report, Warning};
use crate::scene::{Geometry, MaterialGroup, SceneModel, Skeleton};
use crate::versions::{check_version, Variant};

const FOLD_RSGM: ChunkId = ChunkId::fold(b"RSGM");
const FOLD_SKEL: ChunkId = ChunkId::fold(b"SKEL");
const FOLD_MSGR: ChunkId = ChunkId::fold(b"MSGR");
const FOLD_MSLC: ChunkId = ChunkId::fold(b"MSLC");
const DATA_FBIF: ChunkId = ChunkId::data(b"FBIF");
const DATA_SSHR: ChunkId = ChunkId::data(b"SSHR");
const DATA_SKEL: ChunkId = ChunkId::data(b"SKEL");

/// Pull the geometry of `mesh_name` out of the container `source` points
/// at and attach it to the host mesh of the same name.
pub(crate) fn resolve_mesh(
    model: &mut SceneModel,
    report: &mut Report,
    scope: Option<&DowLayout>,
    mesh_name: &str,
    source: &str,
) -> Result<()> {
    let Some(scope) = scope else {
        return Ok(());
    };
    let Some(path) = scope.find(&format!("{source}.whm")) else {
        report.push(Warning::MissingReference {
            entity: mesh_name.to_string(),
            source: source.to_string(),
        });
        return Ok(());
    };
    debug!("resolving mesh {mesh_name} from {}", path.display());

    let mut reader = ChunkReader::open(BufReader::new(File::open(&path)?))?;
    let root = loop {
        match reader.read_header()? {
            None => {
                report.push(Warning::MissingReference {
                    entity: mesh_name.to_string(),
                    source: source.to_string(),
                });
                return Ok(());
            }
            Some(header) if header.id == DATA_FBIF => reader.skip_chunk(&header)?,
            Some(header) if header.id == FOLD_RSGM => break header,
            Some(header) => {
                debug!("skipping {} before the source root", header.id);
                reader.skip_chunk(&header)?;
            }
        }
    };
    // the source carries its own dialect, independent of the host's
    let variant = Variant::from_root_version(root.version).ok_or(
        ChunkyError::UnsupportedVersion {
            id: root.id,
            version: root.version,
        },
    )?;

    let end = reader.chunk_end(&root)?;
    let mut skeleton = Skeleton::default();
    let mut raw = None;
    while let Some(child) = reader.read_header_within(end)? {
        check_version(variant, Some(FOLD_RSGM), &child)?;
        match child.id {
            // source materials register in the host like local ones
            id if id == DATA_SSHR => {
                let child_end = reader.chunk_end(&child)?;
                let declared = reader.read_string()?;
                reader.finish_chunk(&child, child_end)?;
                let known = model
                    .materials
                    .iter()
                    .any(|material| material.full_path.as_deref() == Some(declared.as_str()));
                if !known {
                    let material = parser::load_material(Some(scope), report, &declared)?;
                    model.materials.push(material);
                }
            }
            id if id == DATA_SKEL => {
                let child_end = reader.chunk_end(&child)?;
                skeleton = Skeleton {
                    bones: parser::read_skeleton_data(&mut reader)?,
                };
                reader.finish_chunk(&child, child_end)?;
            }
            id if id == FOLD_SKEL => {
                skeleton = parser::read_fold_skel(variant, &mut reader, &child)?;
            }
            id if id == FOLD_MSGR => {
                let msgr_end = reader.chunk_end(&child)?;
                while let Some(grand) = reader.read_header_within(msgr_end)? {
                    if grand.id == FOLD_MSLC && grand.name.eq_ignore_ascii_case(mesh_name) {
                        check_version(variant, Some(FOLD_MSGR), &grand)?;
                        raw = Some(parser::decode_mslc(&mut reader, &grand, &skeleton, variant)?);
                    } else {
                        reader.skip_chunk(&grand)?;
                    }
                }
                reader.finish_chunk(&child, msgr_end)?;
            }
            _ => reader.skip_chunk(&child)?,
        }
        if raw.is_some() {
            break;
        }
    }

    let Some(raw) = raw else {
        report.push(Warning::MissingReference {
            entity: mesh_name.to_string(),
            source: source.to_string(),
        });
        return Ok(());
    };

    let mut vertices = raw.vertices;
    let remap: Vec<Option<usize>> = skeleton
        .bones
        .iter()
        .map(|bone| model.skeleton.index_of(&bone.name))
        .collect();
    let mut missing: Vec<&str> = Vec::new();
    for vertex in &mut vertices {
        vertex.influences.retain_mut(|influence| match remap[influence.bone] {
            Some(index) => {
                influence.bone = index;
                true
            }
            None => {
                let name = skeleton.bones[influence.bone].name.as_str();
                if !missing.contains(&name) {
                    missing.push(name);
                }
                false
            }
        });
    }
    for name in missing {
        warn!("mesh {mesh_name} from {source}: no bone {name} in the host skeleton");
    }

    let groups = raw
        .groups
        .into_iter()
        .map(|(declared, faces)| MaterialGroup {
            material: parser::material_name_for_path(model, &declared),
            faces,
        })
        .collect();
    let geometry = Geometry {
        vertices,
        groups,
        bounds: raw.bounds,
        shadow: raw.shadow,
    };
    if let Some(mesh) = model.meshes.iter_mut().find(|mesh| mesh.name == mesh_name) {
        mesh.geometry = Some(geometry);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;

    use glam::Vec3;
    use pretty_assertions::assert_eq;

    use dow_chunky::{ChunkWriter, FileHeader, WriteExt};

    use crate::layout::LayoutSource;
    use crate::parser::{import_container, ImportOptions};
    use crate::scene::Influence;

    use super::*;

    fn write_bone(writer: &mut ChunkWriter<Cursor<Vec<u8>>>, name: &str, parent: i32) {
        writer.write_string(name).unwrap();
        writer.write_i32_le(parent).unwrap();
        for value in [0.0f32, 0.0, 0.0] {
            writer.write_f32_le(value).unwrap();
        }
        for value in [0.0f32, 0.0, 0.0, 1.0] {
            writer.write_f32_le(value).unwrap();
        }
    }

    /// Container holding the skeleton `bones` and one skinned triangle
    /// named `Hull`, every vertex split over bones 0 and 1
    fn source_container(bones: &[(&str, i32)]) -> Vec<u8> {
        let mut writer =
            ChunkWriter::create(Cursor::new(Vec::new()), FileHeader::default()).unwrap();
        writer.begin_chunk(FOLD_RSGM, 3, "hull").unwrap();

        writer.begin_chunk(DATA_SSHR, 2, "art/shared/hullmat").unwrap();
        writer.write_string("art/shared/hullmat").unwrap();
        writer.end_chunk().unwrap();

        writer.begin_chunk(DATA_SKEL, 5, "").unwrap();
        writer.write_u32_le(bones.len() as u32).unwrap();
        for (name, parent) in bones {
            write_bone(&mut writer, name, *parent);
        }
        writer.end_chunk().unwrap();

        writer.begin_chunk(FOLD_MSGR, 1, "").unwrap();
        writer.begin_chunk(FOLD_MSLC, 1, "Hull").unwrap();
        writer.begin_chunk(ChunkId::data(b"DATA"), 2, "").unwrap();
        writer.write_i32_le(0).unwrap();
        writer.write_u8(1).unwrap();
        writer.write_u32_le(1).unwrap();
        writer.write_i32_le(0).unwrap();
        writer.write_u32_le(2).unwrap();
        for (index, (name, _)) in bones.iter().enumerate().take(2) {
            writer.write_string(name).unwrap();
            writer.write_i32_le(index as i32).unwrap();
        }
        writer.write_u32_le(3).unwrap();
        writer.write_i32_le(39).unwrap();
        for disk in [[-1.0f32, 0.0, 0.0], [-2.0, 0.0, 0.0], [-3.0, 1.0, 0.0]] {
            for value in disk {
                writer.write_f32_le(value).unwrap();
            }
        }
        for _ in 0..3 {
            for value in [0.5f32, 0.5, 0.0] {
                writer.write_f32_le(value).unwrap();
            }
            for id in [0u8, 1, 255, 255] {
                writer.write_u8(id).unwrap();
            }
        }
        for _ in 0..3 {
            for value in [0.0f32, 1.0, 0.0] {
                writer.write_f32_le(value).unwrap();
            }
        }
        for _ in 0..3 {
            writer.write_f32_le(0.0).unwrap();
            writer.write_f32_le(0.0).unwrap();
        }
        writer.write_zeros(4).unwrap();
        writer.write_u32_le(1).unwrap();
        writer.write_string("art/shared/hullmat").unwrap();
        writer.write_u32_le(3).unwrap();
        for index in [0u16, 2, 1] {
            writer.write_u16_le(index).unwrap();
        }
        writer.write_u16_le(0).unwrap();
        writer.write_u16_le(3).unwrap();
        writer.write_zeros(4).unwrap();
        for _ in 0..3 {
            writer.write_u32_le(0).unwrap();
        }
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();

        writer.end_chunk().unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// Container whose mesh list points `hull` at `art/shared/hull`
    fn host_container() -> Vec<u8> {
        let mut writer =
            ChunkWriter::create(Cursor::new(Vec::new()), FileHeader::default()).unwrap();
        writer.begin_chunk(FOLD_RSGM, 3, "wreck").unwrap();
        writer.begin_chunk(DATA_SKEL, 5, "").unwrap();
        writer.write_u32_le(2).unwrap();
        write_bone(&mut writer, "root", -1);
        write_bone(&mut writer, "arm", 0);
        writer.end_chunk().unwrap();
        writer.begin_chunk(FOLD_MSGR, 1, "").unwrap();
        writer.begin_chunk(ChunkId::data(b"DATA"), 1, "").unwrap();
        writer.write_u32_le(1).unwrap();
        writer.write_string("hull").unwrap();
        writer.write_string("art/shared/hull").unwrap();
        writer.write_i32_le(-1).unwrap();
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn scope_over(root: &std::path::Path) -> DowLayout {
        DowLayout {
            sources: vec![LayoutSource {
                root: root.to_path_buf(),
                mod_name: "test".to_string(),
            }],
            ..DowLayout::default()
        }
    }

    #[test]
    fn test_resolves_mesh_and_remaps_bones() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("art/shared")).unwrap();
        // "junk" exists only in the source, "arm" in both skeletons
        fs::write(
            dir.path().join("art/shared/hull.whm"),
            source_container(&[("junk", -1), ("arm", 0)]),
        )
        .unwrap();

        let options = ImportOptions {
            scope: Some(scope_over(dir.path())),
        };
        let (model, report) =
            import_container(Cursor::new(host_container()), &options).unwrap();

        assert_eq!(
            report.warnings(),
            &[Warning::MissingTexture {
                path: "art/shared/hullmat".to_string(),
            }]
        );
        let mesh = model.mesh("hull").unwrap();
        assert_eq!(mesh.xref_source.as_deref(), Some("art/shared/hull"));
        let geometry = mesh.geometry.as_ref().unwrap();
        assert_eq!(geometry.vertices.len(), 3);
        assert_eq!(geometry.vertices[0].position, Vec3::new(1.0, 0.0, 0.0));
        // "junk" weights dropped, "arm" remapped onto the host index
        assert_eq!(
            geometry.vertices[0].influences,
            vec![Influence { bone: 1, weight: 0.5 }]
        );
        assert_eq!(geometry.groups[0].material, "hullmat");
        assert_eq!(
            model
                .materials
                .iter()
                .map(|material| material.full_path.as_deref())
                .collect::<Vec<_>>(),
            vec![Some("art/shared/hullmat")]
        );
    }

    #[test]
    fn test_missing_source_leaves_stub() {
        let dir = tempfile::tempdir().unwrap();
        let options = ImportOptions {
            scope: Some(scope_over(dir.path())),
        };
        let (model, report) =
            import_container(Cursor::new(host_container()), &options).unwrap();

        assert_eq!(
            report.warnings(),
            &[Warning::MissingReference {
                entity: "hull".to_string(),
                source: "art/shared/hull".to_string(),
            }]
        );
        assert!(model.mesh("hull").unwrap().geometry.is_none());
    }

    #[test]
    fn test_mesh_absent_from_source_warns() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("art/shared")).unwrap();
        let mut writer =
            ChunkWriter::create(Cursor::new(Vec::new()), FileHeader::default()).unwrap();
        writer.begin_chunk(FOLD_RSGM, 3, "hull").unwrap();
        writer.begin_chunk(FOLD_MSGR, 1, "").unwrap();
        writer.end_chunk().unwrap();
        writer.end_chunk().unwrap();
        fs::write(
            dir.path().join("art/shared/hull.whm"),
            writer.finish().unwrap().into_inner(),
        )
        .unwrap();

        let options = ImportOptions {
            scope: Some(scope_over(dir.path())),
        };
        let (model, report) =
            import_container(Cursor::new(host_container()), &options).unwrap();
        assert_eq!(
            report.warnings(),
            &[Warning::MissingReference {
                entity: "hull".to_string(),
                source: "art/shared/hull".to_string(),
            }]
        );
        assert!(model.mesh("hull").unwrap().geometry.is_none());
    }

    #[test]
    fn test_no_scope_skips_resolution() {
        let (model, report) =
            import_container(Cursor::new(host_container()), &ImportOptions::default()).unwrap();
        assert!(report.is_empty());
        let mesh = model.mesh("hull").unwrap();
        assert_eq!(mesh.xref_source.as_deref(), Some("art/shared/hull"));
        assert!(mesh.geometry.is_none());
    }
}
