//! Layer roles, team colour layers and the channel assignment rules.
//!
//! Shader materials expose up to five image roles that map onto the six
//! channel slots of a FOLDSHDR record (the sixth slot is unused). Team
//! colour patterns use a separate fixed set of grayscale mask layers.

use std::fmt;

use crate::error::{Result, TexError};

/// Shader image roles in channel slot order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerRole {
    /// Base colour, channel 0
    Diffuse,
    /// Specular intensity mask, channel 1
    Specularity,
    /// Environment reflection, channel 2
    Reflection,
    /// Emissive mask, channel 3
    SelfIllumination,
    /// Alpha mask, channel 4
    Opacity,
}

impl LayerRole {
    /// Every role in channel slot order
    pub const ALL: [Self; 5] = [
        Self::Diffuse,
        Self::Specularity,
        Self::Reflection,
        Self::SelfIllumination,
        Self::Opacity,
    ];

    /// Adapter-facing label for this role
    pub fn label(self) -> &'static str {
        match self {
            Self::Diffuse => "diffuse",
            Self::Specularity => "specularity",
            Self::Reflection => "reflection",
            Self::SelfIllumination => "self_illumination",
            Self::Opacity => "opacity",
        }
    }

    /// Parse an adapter label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.label() == label)
    }

    /// Path suffix appended to a material path for this role's texture.
    ///
    /// `_reslect` is how the game's own files spell the reflection suffix.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Diffuse => "",
            Self::Specularity => "_spec",
            Self::Reflection => "_reslect",
            Self::SelfIllumination => "_self_illum",
            Self::Opacity => "_alpha",
        }
    }

    /// Channel slot this role occupies in a FOLDSHDR record
    pub fn channel_index(self) -> u32 {
        match self {
            Self::Diffuse => 0,
            Self::Specularity => 1,
            Self::Reflection => 2,
            Self::SelfIllumination => 3,
            Self::Opacity => 4,
        }
    }

    /// Role for a channel slot, `None` for the unused sixth slot
    pub fn from_channel_index(index: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.channel_index() == index)
    }

    /// Infer a role from a declared texture path, returning the role and
    /// the path with the role suffix removed.
    ///
    /// Longer suffixes are tried first so `_self_illum` never matches as a
    /// bare diffuse path. A path with no known suffix is a diffuse texture.
    pub fn infer_from_path(path: &str) -> (Self, &str) {
        let mut candidates: Vec<Self> = Self::ALL
            .into_iter()
            .filter(|role| !role.suffix().is_empty())
            .collect();
        candidates.sort_by_key(|role| std::cmp::Reverse(role.suffix().len()));
        for role in candidates {
            if let Some(base) = path.strip_suffix(role.suffix()) {
                return (role, base);
            }
        }
        (Self::Diffuse, path)
    }
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Team colour mask layers in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternLayer {
    /// Primary armour colour
    Primary,
    /// Secondary armour colour
    Secondary,
    /// Trim colour
    Trim,
    /// Weapon colour
    Weapons,
    /// Eye and lens colour
    Eyes,
    /// Dirt overlay
    Dirt,
}

impl PatternLayer {
    /// Every layer in file order
    pub const ALL: [Self; 6] = [
        Self::Primary,
        Self::Secondary,
        Self::Trim,
        Self::Weapons,
        Self::Eyes,
        Self::Dirt,
    ];

    /// Layer id stored in DATAPTLD chunks
    pub fn id(self) -> u32 {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
            Self::Trim => 2,
            Self::Weapons => 3,
            Self::Eyes => 4,
            Self::Dirt => 5,
        }
    }

    /// Parse a DATAPTLD layer id
    pub fn from_id(id: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|layer| layer.id() == id)
            .ok_or(TexError::UnknownPatternLayer(id))
    }

    /// Adapter-facing name for this layer
    pub fn name(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Trim => "trim",
            Self::Weapons => "weapons",
            Self::Eyes => "eyes",
            Self::Dirt => "dirt",
        }
    }
}

impl fmt::Display for PatternLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoding of a stored image as declared in DATAATTR chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Uncompressed TGA pixel data
    Tga,
    /// DXT1 compressed DDS payload
    Dxt1,
    /// DXT3 compressed DDS payload
    Dxt3,
    /// DXT5 compressed DDS payload
    Dxt5,
}

impl ImageFormat {
    /// Format id stored in DATAATTR chunks
    pub fn format_id(self) -> u32 {
        match self {
            Self::Tga => 0,
            Self::Dxt1 => 8,
            Self::Dxt3 => 10,
            Self::Dxt5 => 11,
        }
    }

    /// Parse a DATAATTR format id
    pub fn from_format_id(id: u32) -> Result<Self> {
        match id {
            0 => Ok(Self::Tga),
            8 => Ok(Self::Dxt1),
            10 => Ok(Self::Dxt3),
            11 => Ok(Self::Dxt5),
            other => Err(TexError::UnknownImageFormat(other)),
        }
    }

    /// Image type id stored in DATAHEAD chunks.
    ///
    /// A different id space from the DATAATTR format id; both identify the
    /// same encoding.
    pub fn image_type(self) -> u32 {
        match self {
            Self::Tga => 0,
            Self::Dxt1 => 5,
            Self::Dxt3 => 6,
            Self::Dxt5 => 7,
        }
    }

    /// Parse a DATAHEAD image type id
    pub fn from_image_type(id: u32) -> Result<Self> {
        match id {
            0 | 2 => Ok(Self::Tga),
            5 => Ok(Self::Dxt1),
            6 => Ok(Self::Dxt3),
            7 => Ok(Self::Dxt5),
            other => Err(TexError::UnknownImageType(other)),
        }
    }

    /// The DDS compression variant, `None` for TGA
    pub fn dxt(self) -> Option<crate::dds::DxtFormat> {
        match self {
            Self::Tga => None,
            Self::Dxt1 => Some(crate::dds::DxtFormat::Dxt1),
            Self::Dxt3 => Some(crate::dds::DxtFormat::Dxt3),
            Self::Dxt5 => Some(crate::dds::DxtFormat::Dxt5),
        }
    }
}

impl From<crate::dds::DxtFormat> for ImageFormat {
    fn from(format: crate::dds::DxtFormat) -> Self {
        match format {
            crate::dds::DxtFormat::Dxt1 => Self::Dxt1,
            crate::dds::DxtFormat::Dxt3 => Self::Dxt3,
            crate::dds::DxtFormat::Dxt5 => Self::Dxt5,
        }
    }
}

/// Outcome of mapping declared material layers onto channel slots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelAssignment {
    /// Layer index per role, in channel slot order
    pub by_role: [Option<usize>; 5],
    /// Layers that claimed an already-taken role and lost
    pub duplicates: Vec<(LayerRole, usize)>,
    /// Roles filled from unlabeled layers by position
    pub fallback: Vec<LayerRole>,
    /// Layers no role was left for
    pub unassigned: Vec<usize>,
}

impl ChannelAssignment {
    /// Layer index assigned to a role
    pub fn role(&self, role: LayerRole) -> Option<usize> {
        self.by_role[role.channel_index() as usize]
    }

    /// Whether any part of the assignment needed guessing or dropped layers.
    ///
    /// A single unlabeled layer falling back to diffuse is not ambiguous;
    /// that is the ordinary shape of a plain textured material.
    pub fn is_ambiguous(&self) -> bool {
        !self.duplicates.is_empty() || self.fallback.len() > 1 || !self.unassigned.is_empty()
    }
}

/// Map declared layers onto channel slots.
///
/// Takes one label per candidate layer, `None` for unlabeled. Labeled
/// layers claim their role directly, first claimant winning. Unlabeled
/// layers then fill the remaining roles in channel slot order. Labels
/// outside the known role set mark a layer as not a shader input at all
/// and it is ignored.
pub fn assign_channels(labels: &[Option<&str>]) -> ChannelAssignment {
    let mut assignment = ChannelAssignment::default();

    for (index, label) in labels.iter().enumerate() {
        let Some(label) = label else { continue };
        let Some(role) = LayerRole::from_label(label) else {
            continue;
        };
        let slot = &mut assignment.by_role[role.channel_index() as usize];
        if slot.is_none() {
            *slot = Some(index);
        } else {
            assignment.duplicates.push((role, index));
        }
    }

    for (index, label) in labels.iter().enumerate() {
        if label.is_some() {
            continue;
        }
        let free = LayerRole::ALL
            .into_iter()
            .find(|role| assignment.by_role[role.channel_index() as usize].is_none());
        match free {
            Some(role) => {
                assignment.by_role[role.channel_index() as usize] = Some(index);
                assignment.fallback.push(role);
            }
            None => assignment.unassigned.push(index),
        }
    }

    assignment
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case("diffuse", Some(LayerRole::Diffuse))]
    #[test_case("opacity", Some(LayerRole::Opacity))]
    #[test_case("color_layer_primary", None)]
    #[test_case("Diffuse", None)]
    fn test_role_labels(label: &str, expected: Option<LayerRole>) {
        assert_eq!(LayerRole::from_label(label), expected);
    }

    #[test_case("art/ebps/marine_spec", LayerRole::Specularity, "art/ebps/marine")]
    #[test_case("art/ebps/marine_reslect", LayerRole::Reflection, "art/ebps/marine")]
    #[test_case("art/ebps/marine_self_illum", LayerRole::SelfIllumination, "art/ebps/marine")]
    #[test_case("art/ebps/marine_alpha", LayerRole::Opacity, "art/ebps/marine")]
    #[test_case("art/ebps/marine", LayerRole::Diffuse, "art/ebps/marine")]
    fn test_infer_from_path(path: &str, role: LayerRole, base: &str) {
        assert_eq!(LayerRole::infer_from_path(path), (role, base));
    }

    #[test]
    fn test_pattern_layer_ids() {
        for layer in PatternLayer::ALL {
            assert_eq!(PatternLayer::from_id(layer.id()).unwrap(), layer);
        }
        assert!(matches!(
            PatternLayer::from_id(6),
            Err(TexError::UnknownPatternLayer(6))
        ));
    }

    #[test]
    fn test_image_format_id_spaces() {
        for format in [
            ImageFormat::Tga,
            ImageFormat::Dxt1,
            ImageFormat::Dxt3,
            ImageFormat::Dxt5,
        ] {
            assert_eq!(ImageFormat::from_format_id(format.format_id()).unwrap(), format);
            assert_eq!(ImageFormat::from_image_type(format.image_type()).unwrap(), format);
        }
        // the alternate TGA image type id
        assert_eq!(ImageFormat::from_image_type(2).unwrap(), ImageFormat::Tga);
        assert!(ImageFormat::from_format_id(13).is_err());
    }

    #[test]
    fn test_assign_fully_labeled() {
        let assignment = assign_channels(&[
            Some("opacity"),
            Some("diffuse"),
            Some("specularity"),
        ]);
        assert_eq!(assignment.role(LayerRole::Diffuse), Some(1));
        assert_eq!(assignment.role(LayerRole::Specularity), Some(2));
        assert_eq!(assignment.role(LayerRole::Opacity), Some(0));
        assert_eq!(assignment.role(LayerRole::Reflection), None);
        assert!(!assignment.is_ambiguous());
    }

    #[test]
    fn test_single_unlabeled_layer_becomes_diffuse() {
        let assignment = assign_channels(&[None]);
        assert_eq!(assignment.role(LayerRole::Diffuse), Some(0));
        assert_eq!(assignment.fallback, vec![LayerRole::Diffuse]);
        assert!(!assignment.is_ambiguous());
    }

    #[test]
    fn test_duplicate_labels_keep_first() {
        let assignment = assign_channels(&[Some("diffuse"), Some("diffuse")]);
        assert_eq!(assignment.role(LayerRole::Diffuse), Some(0));
        assert_eq!(assignment.duplicates, vec![(LayerRole::Diffuse, 1)]);
        assert!(assignment.is_ambiguous());
    }

    #[test]
    fn test_multiple_unlabeled_layers_are_ambiguous() {
        let assignment = assign_channels(&[None, Some("diffuse"), None]);
        assert_eq!(assignment.role(LayerRole::Diffuse), Some(1));
        assert_eq!(assignment.role(LayerRole::Specularity), Some(0));
        assert_eq!(assignment.role(LayerRole::Reflection), Some(2));
        assert!(assignment.is_ambiguous());
    }

    #[test]
    fn test_unrelated_labels_are_ignored() {
        let assignment = assign_channels(&[Some("badge"), Some("diffuse")]);
        assert_eq!(assignment.role(LayerRole::Diffuse), Some(1));
        assert_eq!(assignment.role(LayerRole::Specularity), None);
        assert!(!assignment.is_ambiguous());
    }

    #[test]
    fn test_layers_past_the_last_role_are_unassigned() {
        let labels: Vec<Option<&str>> = vec![None; 6];
        let assignment = assign_channels(&labels);
        assert_eq!(assignment.unassigned, vec![5]);
        assert!(assignment.is_ambiguous());
    }
}
