//! Mesh normalization ahead of encoding.
//!
//! Scene tools keep UVs and normals per face corner; the container keeps
//! them per vertex. [`split_by_discontinuity`] bridges the two by
//! duplicating geometric vertices along UV seams and sharp edges.
//! [`detect_force_skin`] and [`autosplit`] recover the cheaper rigid
//! binding the engine prefers over per-vertex weights.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use glam::{Vec2, Vec3};

use crate::scene::{Geometry, Influence, MaterialGroup, Mesh, ShadowVolume, Skeleton, Vertex};

/// A vertex counts as fully bound to one bone at or above this weight
pub const FORCE_SKIN_THRESHOLD: f32 = 0.995;

/// One face corner of a face-varying mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    /// Geometric vertex index into [`CornerMesh::positions`]
    pub vertex: u32,
    /// Texture coordinate at this corner, V up
    pub uv: Vec2,
    /// Normal at this corner
    pub normal: Vec3,
}

/// One triangle of a face-varying mesh
#[derive(Debug, Clone, PartialEq)]
pub struct CornerFace {
    /// The three corners in scene winding
    pub corners: [Corner; 3],
    /// Name of the material the face uses
    pub material: String,
}

/// Mesh as scene tools hand it over: positions and weights per geometric
/// vertex, UVs and normals per face corner.
///
/// Every corner's `vertex` must index into `positions`; `influences` is
/// parallel to `positions`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CornerMesh {
    /// Geometric vertex positions
    pub positions: Vec<Vec3>,
    /// Bone influences per geometric vertex, heaviest first
    pub influences: Vec<Vec<Influence>>,
    /// Triangles in scene winding
    pub faces: Vec<CornerFace>,
}

type CornerKey = (u32, [u32; 2], [u32; 3]);

fn corner_key(corner: &Corner) -> CornerKey {
    (
        corner.vertex,
        [corner.uv.x.to_bits(), corner.uv.y.to_bits()],
        [
            corner.normal.x.to_bits(),
            corner.normal.y.to_bits(),
            corner.normal.z.to_bits(),
        ],
    )
}

/// Split a face-varying mesh into per-vertex geometry.
///
/// A geometric vertex referenced by corners with differing (uv, normal)
/// becomes one mesh vertex per distinct pair, sharing position and
/// weights. Vertices come out in first-appearance order while walking
/// faces corner by corner, material groups in first-appearance order of
/// their material. Running the split on already-split geometry duplicates
/// nothing.
pub fn split_by_discontinuity(mesh: &CornerMesh) -> Geometry {
    let mut vertices = Vec::new();
    let mut index_of: HashMap<CornerKey, u32> = HashMap::new();
    let mut groups: Vec<MaterialGroup> = Vec::new();

    for face in &mesh.faces {
        let mut indices = [0u32; 3];
        for (slot, corner) in face.corners.iter().enumerate() {
            let index = match index_of.entry(corner_key(corner)) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let index = vertices.len() as u32;
                    vertices.push(Vertex {
                        position: mesh.positions[corner.vertex as usize],
                        normal: corner.normal,
                        uv: corner.uv,
                        influences: mesh
                            .influences
                            .get(corner.vertex as usize)
                            .cloned()
                            .unwrap_or_default(),
                    });
                    *entry.insert(index)
                }
            };
            indices[slot] = index;
        }

        match groups.iter_mut().find(|group| group.material == face.material) {
            Some(group) => group.faces.push(indices),
            None => groups.push(MaterialGroup {
                material: face.material.clone(),
                faces: vec![indices],
            }),
        }
    }

    Geometry {
        vertices,
        groups,
        bounds: None,
        shadow: ShadowVolume::default(),
    }
}

/// Bone the whole mesh is effectively rigidly bound to, if any.
///
/// Every vertex must resolve to the same bone: a weighted vertex resolves
/// through a [`FORCE_SKIN_THRESHOLD`] top weight, an unweighted vertex
/// through the mesh's rigid parent. Such meshes are recorded without
/// per-vertex weights.
pub fn detect_force_skin(mesh: &Mesh) -> Option<usize> {
    let geometry = mesh.geometry.as_ref()?;
    let mut bone = None;
    for vertex in &geometry.vertices {
        let resolved = match vertex.influences.first() {
            None => mesh.rigid_parent?,
            Some(top) if top.weight >= FORCE_SKIN_THRESHOLD => top.bone,
            Some(_) => return None,
        };
        match bone {
            None => bone = Some(resolved),
            Some(current) if current == resolved => {}
            Some(_) => return None,
        }
    }
    bone.or(mesh.rigid_parent)
}

/// Partition a skinned mesh into one rigidly bound sub-mesh per bone.
///
/// Each face goes to its dominant bone, the bone with the largest summed
/// weight over the face's three vertices, ties broken by lowest bone
/// index. Sub-meshes are named `<mesh>_<bone>`, come out in bone index
/// order with compacted vertices, and carry the bone as rigid parent
/// instead of weights. The triangle multiset is preserved exactly.
pub fn autosplit(mesh: &Mesh, skeleton: &Skeleton) -> Vec<Mesh> {
    let Some(geometry) = mesh.geometry.as_ref() else {
        return vec![mesh.clone()];
    };

    let mut partitions: BTreeMap<usize, Vec<MaterialGroup>> = BTreeMap::new();
    for group in &geometry.groups {
        for &face in &group.faces {
            let bone = dominant_bone(geometry, face, mesh.rigid_parent)
                .or(mesh.rigid_parent)
                .unwrap_or(0);
            let groups = partitions.entry(bone).or_default();
            match groups.iter_mut().find(|g| g.material == group.material) {
                Some(g) => g.faces.push(face),
                None => groups.push(MaterialGroup {
                    material: group.material.clone(),
                    faces: vec![face],
                }),
            }
        }
    }

    partitions
        .into_iter()
        .map(|(bone, groups)| {
            let label = match skeleton.bone(bone) {
                Some(bone) => bone.name.clone(),
                None => bone.to_string(),
            };
            let mut remap: HashMap<u32, u32> = HashMap::new();
            let mut vertices = Vec::new();
            let groups = groups
                .into_iter()
                .map(|group| MaterialGroup {
                    material: group.material,
                    faces: group
                        .faces
                        .into_iter()
                        .map(|face| {
                            face.map(|index| match remap.entry(index) {
                                Entry::Occupied(entry) => *entry.get(),
                                Entry::Vacant(entry) => {
                                    let next = vertices.len() as u32;
                                    let mut vertex = geometry.vertices[index as usize].clone();
                                    vertex.influences.clear();
                                    vertices.push(vertex);
                                    *entry.insert(next)
                                }
                            })
                        })
                        .collect(),
                })
                .collect();
            Mesh {
                name: format!("{}_{label}", mesh.name),
                xref_source: None,
                rigid_parent: Some(bone),
                geometry: Some(Geometry {
                    vertices,
                    groups,
                    bounds: None,
                    shadow: ShadowVolume::default(),
                }),
            }
        })
        .collect()
}

fn dominant_bone(geometry: &Geometry, face: [u32; 3], rigid_parent: Option<usize>) -> Option<usize> {
    let mut totals: BTreeMap<usize, f32> = BTreeMap::new();
    for index in face {
        let Some(vertex) = geometry.vertices.get(index as usize) else {
            continue;
        };
        if vertex.influences.is_empty() {
            if let Some(parent) = rigid_parent {
                *totals.entry(parent).or_insert(0.0) += 1.0;
            }
        } else {
            for influence in &vertex.influences {
                *totals.entry(influence.bone).or_insert(0.0) += influence.weight;
            }
        }
    }

    let mut best: Option<(usize, f32)> = None;
    for (bone, weight) in totals {
        match best {
            Some((_, top)) if weight <= top => {}
            _ => best = Some((bone, weight)),
        }
    }
    best.map(|(bone, _)| bone)
}
