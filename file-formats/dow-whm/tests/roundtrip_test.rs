//! Cross-file scenarios: companion textures, mesh cross references and
//! dialect conversion

use std::fs;
use std::io::Cursor;
use std::path::Path;

use glam::{Mat3, Quat, Vec2, Vec3};
use pretty_assertions::assert_eq;

use dow_tex::{
    ImageFormat, PathDispatcher, PatternImage, PatternLayer, RshFile, SlotPlacement, TextureImage,
    TextureLayout, WtpFile,
};
use dow_whm::layout::LayoutSource;
use dow_whm::scene::{
    Action, Bone, BoneTrack, Bounds, ExtraChannel, Geometry, Influence, Key, Marker, Material,
    MaterialGroup, Mesh, ShadowVolume, Skeleton, Vertex,
};
use dow_whm::{
    export_container, import_container, DowLayout, ExportOptions, ImportOptions, SceneModel,
    Variant, Warning,
};

fn scope_over(root: &Path) -> DowLayout {
    DowLayout {
        sources: vec![LayoutSource {
            root: root.to_path_buf(),
            mod_name: "test".to_string(),
        }],
        ..DowLayout::default()
    }
}

fn bone(name: &str, parent: Option<usize>) -> Bone {
    Bone {
        name: name.to_string(),
        parent,
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    }
}

fn triangle(material: &str, influences: Vec<Influence>) -> Geometry {
    let positions = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 1.0),
    ];
    Geometry {
        vertices: positions
            .into_iter()
            .map(|position| Vertex {
                position,
                normal: Vec3::Z,
                uv: Vec2::new(0.5, 0.25),
                influences: influences.clone(),
            })
            .collect(),
        groups: vec![MaterialGroup {
            material: material.to_string(),
            faces: vec![[0, 1, 2]],
        }],
        bounds: Bounds::from_points(positions),
        shadow: ShadowVolume::default(),
    }
}

#[test]
fn external_material_round_trips_through_companion_files() {
    let dir = tempfile::tempdir().unwrap();
    let image = TextureImage {
        format: ImageFormat::Dxt1,
        width: 4,
        height: 4,
        mip_count: 1,
        data: vec![0u8; 8],
    };
    let rsh = RshFile::assemble(
        "art/unit/body".to_string(),
        vec![("art/unit/body".to_string(), image)],
        &[None, None, None, None, None],
    );
    let pattern = WtpFile {
        name: "default".to_string(),
        width: 2,
        height: 2,
        layers: vec![PatternImage {
            layer: PatternLayer::Primary,
            data: vec![128; 4],
        }],
        combined: None,
        badge: Some(SlotPlacement::badge_default()),
        banner: None,
    };

    let mut model = SceneModel::new("trooper");
    model.materials.push(Material {
        name: "body".to_string(),
        full_path: Some("art/unit/body".to_string()),
        single_image_path: None,
        internal: false,
        texture: Some(rsh),
        pattern: Some(pattern),
    });
    model
        .meshes
        .push(Mesh::local("body", triangle("body", Vec::new())));

    let mut dispatcher = PathDispatcher::new(dir.path(), TextureLayout::FullPath);
    let mut sink = Cursor::new(Vec::new());
    let report = export_container(
        &model,
        &mut sink,
        Some(&mut dispatcher),
        &ExportOptions::default(),
    )
    .unwrap();
    assert!(report.is_empty(), "{report}");
    assert!(dir.path().join("art/unit/body.rsh").is_file());
    assert!(dir.path().join("art/unit/body_default.wtp").is_file());

    sink.set_position(0);
    let options = ImportOptions {
        scope: Some(scope_over(dir.path())),
    };
    let (imported, report) = import_container(sink, &options).unwrap();
    assert!(report.is_empty(), "{report}");
    assert_eq!(imported.materials, model.materials);
}

#[test]
fn cross_referenced_mesh_resolves_from_sibling_container() {
    let dir = tempfile::tempdir().unwrap();

    let mut source = SceneModel::new("wargear");
    source.skeleton = Skeleton {
        bones: vec![bone("root", None), bone("arm", Some(0))],
    };
    source
        .materials
        .push(Material::placeholder("art/shared/hullmat"));
    let influences = vec![
        Influence {
            bone: 0,
            weight: 0.5,
        },
        Influence {
            bone: 1,
            weight: 0.5,
        },
    ];
    source
        .meshes
        .push(Mesh::local("Hull", triangle("hullmat", influences)));
    fs::create_dir_all(dir.path().join("art/shared")).unwrap();
    let file = fs::File::create(dir.path().join("art/shared/wargear.whm")).unwrap();
    let report = export_container(&source, file, None, &ExportOptions::default()).unwrap();
    assert!(report.is_empty(), "{report}");

    // the host names the mesh instead of embedding it
    let mut host = SceneModel::new("tank");
    host.skeleton = Skeleton {
        bones: vec![bone("arm", None)],
    };
    host.meshes.push(Mesh {
        name: "hull".to_string(),
        xref_source: Some("art/shared/wargear".to_string()),
        rigid_parent: None,
        geometry: None,
    });
    let mut sink = Cursor::new(Vec::new());
    let report = export_container(&host, &mut sink, None, &ExportOptions::default()).unwrap();
    assert!(report.is_empty(), "{report}");

    sink.set_position(0);
    let options = ImportOptions {
        scope: Some(scope_over(dir.path())),
    };
    let (imported, report) = import_container(sink, &options).unwrap();
    assert_eq!(
        report.warnings(),
        &[Warning::MissingTexture {
            path: "art/shared/hullmat".to_string(),
        }]
    );

    let mesh = imported.mesh("hull").unwrap();
    assert_eq!(mesh.xref_source.as_deref(), Some("art/shared/wargear"));
    let geometry = mesh.geometry.as_ref().unwrap();
    assert_eq!(geometry.groups[0].material, "hullmat");
    // the source root bone has no match in the host and drops out
    for vertex in &geometry.vertices {
        assert_eq!(
            vertex.influences,
            vec![Influence {
                bone: 0,
                weight: 0.5,
            }]
        );
    }
}

#[test]
fn converting_between_dialects_preserves_the_scene() {
    let mut model = SceneModel::new("trooper");
    model.skeleton = Skeleton {
        bones: vec![bone("root", None), bone("arm", Some(0))],
    };
    model.materials.push(Material::placeholder("art/unit/body"));
    let influences = vec![
        Influence {
            bone: 1,
            weight: 0.75,
        },
        Influence {
            bone: 0,
            weight: 0.25,
        },
    ];
    let geometry = triangle("body", influences);
    model.bounds = geometry.bounds;
    model.meshes.push(Mesh::local("body", geometry));
    model.markers.push(Marker {
        name: "marker_muzzle".to_string(),
        parent: Some("arm".to_string()),
        rotation: Mat3::IDENTITY,
        position: Vec3::new(4.0, 5.0, 6.0),
    });
    model.actions.push(Action {
        name: "walk".to_string(),
        frames: 11,
        bones: vec![
            BoneTrack::empty("root"),
            BoneTrack {
                bone: "arm".to_string(),
                positions: vec![Key::new(0.0, Vec3::new(1.0, 2.0, 3.0))],
                rotations: vec![Key::new(0.0, Quat::IDENTITY)],
                stale: false,
            },
        ],
        channels: vec![
            ExtraChannel::Visibility {
                mesh: "body".to_string(),
                keys: vec![Key::new(0.5, 0.0)],
            },
            ExtraChannel::UvTiling {
                material: "body".to_string(),
                u: vec![Key::new(0.25, 2.0)],
                v: Vec::new(),
            },
        ],
        xref_source: None,
    });

    let mut whm = Cursor::new(Vec::new());
    export_container(&model, &mut whm, None, &ExportOptions::default()).unwrap();
    whm.set_position(0);
    let (decoded, report) = import_container(whm, &ImportOptions::default()).unwrap();
    assert!(report.is_empty(), "{report}");

    let sgm_options = ExportOptions {
        variant: Variant::Sgm,
        ..ExportOptions::default()
    };
    let mut sgm = Cursor::new(Vec::new());
    let report = export_container(&decoded, &mut sgm, None, &sgm_options).unwrap();
    assert!(report.is_empty(), "{report}");
    sgm.set_position(0);
    let (converted, report) = import_container(sgm, &ImportOptions::default()).unwrap();
    assert!(report.is_empty(), "{report}");

    // the legacy dialect has nowhere to store the provenance record
    let mut expected = decoded.clone();
    expected.burn_info = None;
    assert_eq!(converted, expected);
}
