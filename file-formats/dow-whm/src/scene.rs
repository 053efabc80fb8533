//! In-memory model shared by both container variants.
//!
//! Everything here is stored in scene space (right-handed, Z up); the
//! parser and writer own the axis conversions. Bones form a flat sequence
//! where parents always precede their children, and every other entity
//! refers to bones by index into that sequence or by name.

use glam::{Mat3, Quat, Vec2, Vec3};

use dow_tex::{RshFile, WtpFile};

/// Frames per second assumed by the container's duration fields
pub const FRAME_RATE: f32 = 30.0;

/// Provenance record at the head of a newer-variant container
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BurnInfo {
    /// Exporting tool identifier, usually a URL
    pub tool: String,
    /// Free-form export note
    pub meta: String,
    /// Export timestamp, an opaque display string
    pub date: String,
}

/// One material referenced by mesh faces
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name, the last segment of the declared path
    pub name: String,
    /// User-set declared path override for the whole material
    pub full_path: Option<String>,
    /// Per-image declared path override, strongest precedence; only the
    /// newer variant records one
    pub single_image_path: Option<String>,
    /// Keep the image data inside the model container instead of a
    /// separate `.rsh` file
    pub internal: bool,
    /// Texture layers when resolved, `None` for a placeholder
    pub texture: Option<RshFile>,
    /// Team colour pattern when one was found next to the texture
    pub pattern: Option<WtpFile>,
}

impl Material {
    /// Placeholder material carrying only the declared path
    pub fn placeholder(declared_path: &str) -> Self {
        Self {
            name: path_name(declared_path).to_string(),
            full_path: Some(declared_path.to_string()),
            single_image_path: None,
            internal: false,
            texture: None,
            pattern: None,
        }
    }

    /// Declared path for this material given the export default folder
    pub fn declared_path(&self, default_folder: &str) -> String {
        dow_tex::resolve_declared_path(
            self.single_image_path.as_deref(),
            self.full_path.as_deref(),
            &self.name,
            default_folder,
        )
    }
}

/// Last path segment of a declared posix-style path
pub fn path_name(declared: &str) -> &str {
    declared.rsplit('/').next().unwrap_or(declared)
}

/// One bone of the skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Bone name, unique within the skeleton
    pub name: String,
    /// Parent index; parents always precede children
    pub parent: Option<usize>,
    /// Rest translation relative to the parent
    pub position: Vec3,
    /// Rest rotation relative to the parent
    pub rotation: Quat,
}

/// Flat bone sequence in serialization order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Skeleton {
    /// Bones, parents before children
    pub bones: Vec<Bone>,
}

impl Skeleton {
    /// Index of a bone by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name == name)
    }

    /// Bone by index
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Number of bones
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// True when no bones are present
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

/// One bone influence on a vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Influence {
    /// Global bone index
    pub bone: usize,
    /// Normalized weight
    pub weight: f32,
}

/// One mesh vertex after seam splitting
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// Position in scene space
    pub position: Vec3,
    /// Normal in scene space
    pub normal: Vec3,
    /// Texture coordinate, V up
    pub uv: Vec2,
    /// Bone influences, heaviest first, at most four; empty for an
    /// unskinned vertex
    pub influences: Vec<Influence>,
}

/// Faces sharing one material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialGroup {
    /// Name of the material the faces use
    pub material: String,
    /// Triangles as vertex indices
    pub faces: Vec<[u32; 3]>,
}

/// Axis-aligned bounding volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Box center in scene space
    pub center: Vec3,
    /// Half extent along each scene axis
    pub half_extents: Vec3,
}

impl Bounds {
    /// Smallest box containing `points`; `None` when empty
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self {
            center: (max + min) / 2.0,
            half_extents: (max - min) / 2.0,
        })
    }

    /// Smallest box containing both boxes
    pub fn union(self, other: Self) -> Self {
        let min = (self.center - self.half_extents).min(other.center - other.half_extents);
        let max = (self.center + self.half_extents).max(other.center + other.half_extents);
        Self {
            center: (max + min) / 2.0,
            half_extents: (max - min) / 2.0,
        }
    }
}

/// Opaque shadow volume records preserved for round trips.
///
/// The engine derives these from the mesh; this library never interprets
/// them and most files carry empty tables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShadowVolume {
    /// Vertex records, 12 bytes each
    pub vertices: Vec<u8>,
    /// Edge records, 24 bytes each
    pub edges: Vec<u8>,
    /// Face records, 40 bytes each
    pub faces: Vec<u8>,
}

impl ShadowVolume {
    /// True when all three tables are empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty() && self.faces.is_empty()
    }
}

/// Geometry of an embedded mesh
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    /// Vertices after seam splitting
    pub vertices: Vec<Vertex>,
    /// Faces grouped per material, file order
    pub groups: Vec<MaterialGroup>,
    /// Decoded bounding volume; recomputed from the vertices when absent
    pub bounds: Option<Bounds>,
    /// Shadow volume tables, usually empty
    pub shadow: ShadowVolume,
}

impl Geometry {
    /// True when any vertex carries influences
    pub fn is_skinned(&self) -> bool {
        self.vertices.iter().any(|v| !v.influences.is_empty())
    }

    /// Global bone indices referenced by influences, in first-use order
    pub fn skin_bones(&self) -> Vec<usize> {
        let mut bones = Vec::new();
        for vertex in &self.vertices {
            for influence in &vertex.influences {
                if !bones.contains(&influence.bone) {
                    bones.push(influence.bone);
                }
            }
        }
        bones
    }

    /// Total triangle count across all material groups
    pub fn face_count(&self) -> usize {
        self.groups.iter().map(|group| group.faces.len()).sum()
    }

    /// Bounding volume, decoded or computed
    pub fn effective_bounds(&self) -> Option<Bounds> {
        self.bounds
            .or_else(|| Bounds::from_points(self.vertices.iter().map(|v| v.position)))
    }
}

/// One mesh of the model
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Mesh name, unique within the model
    pub name: String,
    /// Path of the container this mesh's geometry lives in, when not
    /// stored locally
    pub xref_source: Option<String>,
    /// Bone the whole mesh is rigidly bound to
    pub rigid_parent: Option<usize>,
    /// Local geometry; `None` for an unresolved xref stub
    pub geometry: Option<Geometry>,
}

impl Mesh {
    /// Mesh with local geometry
    pub fn local(name: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            name: name.into(),
            xref_source: None,
            rigid_parent: None,
            geometry: Some(geometry),
        }
    }
}

/// A named attachment point
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Marker name
    pub name: String,
    /// Name of the parent bone or marker, if any
    pub parent: Option<String>,
    /// Orientation relative to the parent
    pub rotation: Mat3,
    /// Position relative to the parent, scene space
    pub position: Vec3,
}

/// A camera bone; containers do not serialize cameras, the model keeps
/// them for adapters that classify bones
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera name
    pub name: String,
    /// Position in scene space
    pub position: Vec3,
    /// Orientation in scene space
    pub rotation: Quat,
}

/// One animation key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Key<T> {
    /// Key time normalized to [0, 1] over the action's frame range
    pub time: f32,
    /// Keyed value
    pub value: T,
}

impl<T> Key<T> {
    /// Key at `time` holding `value`
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// Transform track of one bone within an action
#[derive(Debug, Clone, PartialEq)]
pub struct BoneTrack {
    /// Name of the animated bone
    pub bone: String,
    /// Translation keys relative to the rest pose
    pub positions: Vec<Key<Vec3>>,
    /// Rotation keys relative to the rest pose
    pub rotations: Vec<Key<Quat>>,
    /// Marks this bone as untouched by the action so another active
    /// action may drive it
    pub stale: bool,
}

impl BoneTrack {
    /// Empty non-stale track for `bone`
    pub fn empty(bone: impl Into<String>) -> Self {
        Self {
            bone: bone.into(),
            positions: Vec::new(),
            rotations: Vec::new(),
            stale: false,
        }
    }
}

/// Which of the two UV transform channels a record animates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvChannelKind {
    /// Texture offset, identity (0, 0)
    Offset,
    /// Texture tiling, identity (1, 1)
    Tiling,
}

/// One non-transform animation channel.
///
/// Adapters hand these over already parsed; the codec never matches on
/// encoded property-name strings.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraChannel {
    /// Hide a mesh for the whole action
    ForceInvisible {
        /// Target mesh name
        mesh: String,
        /// True when the mesh is hidden
        hidden: bool,
    },
    /// Animate a mesh's visibility over the action
    Visibility {
        /// Target mesh name
        mesh: String,
        /// Visibility curve, 0 hidden to 1 visible
        keys: Vec<Key<f32>>,
    },
    /// Animate a material's UV offset
    UvOffset {
        /// Target material name
        material: String,
        /// U axis curve
        u: Vec<Key<f32>>,
        /// V axis curve
        v: Vec<Key<f32>>,
    },
    /// Animate a material's UV tiling
    UvTiling {
        /// Target material name
        material: String,
        /// U axis curve
        u: Vec<Key<f32>>,
        /// V axis curve
        v: Vec<Key<f32>>,
    },
}

impl ExtraChannel {
    /// Name of the mesh or material the channel drives
    pub fn target(&self) -> &str {
        match self {
            Self::ForceInvisible { mesh, .. } | Self::Visibility { mesh, .. } => mesh,
            Self::UvOffset { material, .. } | Self::UvTiling { material, .. } => material,
        }
    }
}

/// One animation clip
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Action name
    pub name: String,
    /// Frame count; the container derives the duration as
    /// frames / [`FRAME_RATE`]
    pub frames: u32,
    /// Per-bone transform tracks
    pub bones: Vec<BoneTrack>,
    /// Visibility and UV channels
    pub channels: Vec<ExtraChannel>,
    /// Container the action was meant to come from; no container record
    /// exists for this, so export drops it with a warning
    pub xref_source: Option<String>,
}

impl Action {
    /// Action duration in seconds
    pub fn duration(&self) -> f32 {
        self.frames as f32 / FRAME_RATE
    }

    /// Track for a bone by name
    pub fn track(&self, bone: &str) -> Option<&BoneTrack> {
        self.bones.iter().find(|track| track.bone == bone)
    }
}

/// A complete decoded model
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneModel {
    /// Model name from the root chunk
    pub name: String,
    /// Provenance record; only the newer variant stores one
    pub burn_info: Option<BurnInfo>,
    /// Materials referenced by mesh faces
    pub materials: Vec<Material>,
    /// The skeleton
    pub skeleton: Skeleton,
    /// Meshes in mesh-list order
    pub meshes: Vec<Mesh>,
    /// Attachment points
    pub markers: Vec<Marker>,
    /// Camera bones; never serialized by the container
    pub cameras: Vec<Camera>,
    /// Animation clips
    pub actions: Vec<Action>,
    /// Decoded whole-model bounds; recomputed when absent
    pub bounds: Option<Bounds>,
}

impl SceneModel {
    /// Empty model with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Material by name
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|material| material.name == name)
    }

    /// Mesh by name
    pub fn mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|mesh| mesh.name == name)
    }
}
