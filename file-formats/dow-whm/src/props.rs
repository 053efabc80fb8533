//! Animation channel naming convention shared with scene adapters.
//!
//! Scene tools attach animation channels to a model through flat custom
//! properties named `<kind>__<target>`, with the target lowercased and the
//! whole name capped at 63 characters (an MD5 hex digest stands in for
//! targets that would not fit). This module parses that convention once at
//! the boundary so the codec works with [`ExtraChannel`] values and never
//! pattern-matches strings on live data.
//!
//! [`ExtraChannel`]: crate::scene::ExtraChannel

use md5::{Digest, Md5};

/// Separator between the channel kind and its target
pub const SEPARATOR: &str = "__";

/// Longest property name scene tools accept
pub const MAX_PROPERTY_NAME: usize = 63;

/// Bone name prefix marking an attachment point
pub const MARKER_PREFIX: &str = "marker_";

/// Bone collection holding attachment points
pub const MARKERS_COLLECTION: &str = "Markers";

/// Bone collection holding cameras
pub const CAMERAS_COLLECTION: &str = "Cameras";

/// Channel kinds carried next to bone transform tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Whole-action mesh visibility override
    ForceInvisible,
    /// Animated mesh visibility
    Visibility,
    /// Animated material UV offset
    UvOffset,
    /// Animated material UV tiling
    UvTiling,
}

impl ChannelKind {
    /// All kinds in their conventional ordering
    pub const ALL: [Self; 4] = [
        Self::ForceInvisible,
        Self::Visibility,
        Self::UvOffset,
        Self::UvTiling,
    ];

    /// Property name prefix for this kind
    pub fn prefix(self) -> &'static str {
        match self {
            Self::ForceInvisible => "force_invisible",
            Self::Visibility => "visibility",
            Self::UvOffset => "uv_offset",
            Self::UvTiling => "uv_tiling",
        }
    }

    /// Kind for a property name prefix
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.prefix() == prefix)
    }

    /// True when the target names a mesh rather than a material
    pub fn targets_mesh(self) -> bool {
        matches!(self, Self::ForceInvisible | Self::Visibility)
    }
}

/// MD5 hex digest of a name, the stand-in for overlong targets
pub fn name_digest(name: &str) -> String {
    let digest: [u8; 16] = Md5::digest(name.as_bytes()).into();
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Property name for a channel kind and target.
///
/// The target is lowercased; when the combined name would exceed
/// [`MAX_PROPERTY_NAME`] the target is replaced by its digest.
pub fn property_name(kind: ChannelKind, target: &str) -> String {
    let target = target.to_ascii_lowercase();
    let name = format!("{}{SEPARATOR}{target}", kind.prefix());
    if name.len() <= MAX_PROPERTY_NAME {
        name
    } else {
        format!("{}{SEPARATOR}{}", kind.prefix(), name_digest(&target))
    }
}

/// Split a property name into its channel kind and encoded target.
///
/// The returned target is lowercase and may be a digest; resolve it
/// against real entity names with [`matches_target`].
pub fn parse_property_name(name: &str) -> Option<(ChannelKind, &str)> {
    let (prefix, target) = name.split_once(SEPARATOR)?;
    Some((ChannelKind::from_prefix(prefix)?, target))
}

/// True when an encoded target refers to the named entity.
///
/// Comparison is case-insensitive and accepts the digest stand-in.
pub fn matches_target(encoded: &str, name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    encoded.eq_ignore_ascii_case(&name) || encoded == name_digest(&name)
}

/// How an adapter should treat a bone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoneClass {
    /// Regular skeleton bone
    Normal,
    /// Attachment point
    Marker,
    /// Camera
    Camera,
}

/// Classify a bone from its name and the collections it belongs to.
///
/// The name prefix fallback covers models whose marker grouping was lost.
pub fn classify_bone<'a>(
    name: &str,
    collections: impl IntoIterator<Item = &'a str>,
) -> BoneClass {
    let mut marker = name.starts_with(MARKER_PREFIX);
    let mut camera = false;
    for collection in collections {
        let collection = collection.to_ascii_lowercase();
        marker |= collection.contains("marker");
        camera |= collection.contains("camera");
    }
    if marker {
        BoneClass::Marker
    } else if camera {
        BoneClass::Camera
    } else {
        BoneClass::Normal
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test]
    fn test_property_name_short_target() {
        assert_eq!(
            property_name(ChannelKind::Visibility, "Body_Main"),
            "visibility__body_main"
        );
    }

    #[test]
    fn test_property_name_overlong_target_uses_digest() {
        let target = "a_very_long_mesh_name_that_does_not_fit_into_a_property_name_at_all";
        let name = property_name(ChannelKind::ForceInvisible, target);
        assert!(name.len() <= MAX_PROPERTY_NAME);
        assert_eq!(
            name,
            format!("force_invisible__{}", name_digest(&target.to_ascii_lowercase()))
        );
    }

    #[test_case("visibility__trooper", Some((ChannelKind::Visibility, "trooper")))]
    #[test_case("uv_offset__tank_tracks", Some((ChannelKind::UvOffset, "tank_tracks")))]
    #[test_case("uv_tiling__teeth", Some((ChannelKind::UvTiling, "teeth")))]
    #[test_case("force_invisible__head_2", Some((ChannelKind::ForceInvisible, "head_2")))]
    #[test_case("stale", None; "no separator")]
    #[test_case("shininess__mat", None; "unknown prefix")]
    fn test_parse_property_name(name: &str, expected: Option<(ChannelKind, &str)>) {
        assert_eq!(parse_property_name(name), expected);
    }

    #[test]
    fn test_matches_target() {
        assert!(matches_target("body_main", "Body_Main"));
        let long = "a_very_long_mesh_name_that_does_not_fit_into_a_property_name_at_all";
        let encoded = name_digest(&long.to_ascii_lowercase());
        assert!(matches_target(&encoded, long));
        assert!(!matches_target("body_main", "head"));
    }

    #[test]
    fn test_classify_bone() {
        assert_eq!(classify_bone("bone_arm", []), BoneClass::Normal);
        assert_eq!(classify_bone("marker_weapon", []), BoneClass::Marker);
        assert_eq!(classify_bone("lens", ["Cameras"]), BoneClass::Camera);
        assert_eq!(classify_bone("marker_fx", ["Cameras"]), BoneClass::Marker);
    }
}
