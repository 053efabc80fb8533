//! Non-fatal conversion diagnostics.
//!
//! Fatal conditions surface as [`WhmError`](crate::error::WhmError); anything
//! the conversion can survive is collected here instead, in the order it was
//! noticed, and mirrored to the log as it happens.

use std::fmt;

/// One degradation noticed during import or export
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A referenced `.rsh` file was not found in the search scope; a
    /// placeholder material with only the declared path is substituted
    MissingTexture {
        /// Declared path of the material
        path: String,
    },

    /// An xref source file or the mesh inside it was not found; the entity
    /// decodes as a stub keeping the unresolved reference
    MissingReference {
        /// Mesh or action that declared the reference
        entity: String,
        /// The declared source path
        source: String,
    },

    /// A mesh needs more vertices than 16-bit face indices can address and
    /// was dropped from the container
    VertexBudgetExceeded {
        /// The dropped mesh
        mesh: String,
        /// Vertices after seam splitting
        vertices: usize,
    },

    /// Texture layers could not be assigned to roles unambiguously; the
    /// default role ordering was applied
    AmbiguousLayerRole {
        /// The affected material
        material: String,
    },

    /// An animation channel targets a mesh or material absent from the
    /// model and was not written
    DroppedChannel {
        /// Name the channel pointed at
        target: String,
    },

    /// A texture exceeds the configured maximum dimension
    OversizedTexture {
        /// The affected material
        material: String,
        /// Image width in pixels
        width: u32,
        /// Image height in pixels
        height: u32,
        /// Configured limit
        max: u32,
    },

    /// A mesh carries no usable bone weights
    UnweightedMesh {
        /// The affected mesh
        mesh: String,
    },

    /// A vertex is weighted to more than four bones; the four heaviest
    /// influences were kept
    ExcessInfluences {
        /// The affected mesh
        mesh: String,
    },

    /// A mesh weighted to several bones declared an xref source; the
    /// reference cannot be stored, so the mesh was embedded instead
    XrefWeighted {
        /// The affected mesh
        mesh: String,
    },

    /// Actions have no reference record in this container family, so an
    /// action-level xref source cannot be written
    DroppedActionXref {
        /// The affected action
        action: String,
    },

    /// A mesh with no faces to draw and no xref source cannot be
    /// serialized and was dropped
    EmptyMesh {
        /// The dropped mesh
        mesh: String,
    },
}

// Hand-written because `#[derive(thiserror::Error)]` treats any field named
// `source` as the error source, and `MissingReference::source` is a path
// string, not an error.
impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTexture { path } => write!(f, "cannot find texture {path}"),
            Self::MissingReference { entity, source } => {
                write!(f, "cannot resolve {entity} from {source}")
            }
            Self::VertexBudgetExceeded { mesh, vertices } => write!(
                f,
                "mesh {mesh} has {vertices} vertices, over the 65536 limit, dropped"
            ),
            Self::AmbiguousLayerRole { material } => {
                write!(f, "ambiguous texture layer roles for material {material}")
            }
            Self::DroppedChannel { target } => {
                write!(f, "animation channel targets unknown {target}, dropped")
            }
            Self::OversizedTexture {
                material,
                width,
                height,
                max,
            } => write!(
                f,
                "material {material} image is {width}x{height}, over the {max} pixel limit"
            ),
            Self::UnweightedMesh { mesh } => {
                write!(f, "mesh {mesh} is not weighted to any bones")
            }
            Self::ExcessInfluences { mesh } => {
                write!(f, "mesh {mesh} has vertices weighted to more than 4 bones")
            }
            Self::XrefWeighted { mesh } => write!(
                f,
                "mesh {mesh} is weighted to several bones and cannot be an xref, embedding it"
            ),
            Self::DroppedActionXref { action } => write!(
                f,
                "action {action} declares an xref source, which model containers cannot store"
            ),
            Self::EmptyMesh { mesh } => write!(
                f,
                "mesh {mesh} has no drawable geometry and no xref source, dropped"
            ),
        }
    }
}

impl std::error::Error for Warning {}

/// Ordered collection of [`Warning`]s from one conversion call
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Report {
    warnings: Vec<Warning>,
}

impl Report {
    /// Empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and mirror it to the log
    pub fn push(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// All warnings in the order they were noticed
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// True when nothing was reported
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Number of warnings
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Fold another report into this one, keeping order
    pub fn merge(&mut self, other: Report) {
        self.warnings.extend(other.warnings);
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for warning in &self.warnings {
            writeln!(f, "{warning}")?;
        }
        Ok(())
    }
}

impl IntoIterator for Report {
    type Item = Warning;
    type IntoIter = std::vec::IntoIter<Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.warnings.into_iter()
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a Warning;
    type IntoIter = std::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.warnings.iter()
    }
}
