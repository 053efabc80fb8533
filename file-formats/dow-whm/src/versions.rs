//! Chunk version table for the two model container dialects.
//!
//! Exact versions matter: the game's reader dispatches payload schemas on
//! (tag, version) and silently misreads anything else. A few tags reuse
//! their name under different parents with different schemas, so lookups
//! carry the parent folder.

use dow_chunky::{ChunkHeader, ChunkId, ChunkyError};

use crate::error::Result;

/// The two model container dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// `.whm` containers, the newer dialect the game loads directly
    #[default]
    Whm,
    /// `.sgm` containers, the older dialect consumed by the object editor
    Sgm,
}

impl Variant {
    /// File extension conventionally used by this dialect
    pub fn extension(self) -> &'static str {
        match self {
            Self::Whm => "whm",
            Self::Sgm => "sgm",
        }
    }

    /// Version of the `FOLDRSGM` model root in this dialect
    pub fn root_version(self) -> u32 {
        match self {
            Self::Whm => 3,
            Self::Sgm => 1,
        }
    }

    /// Dialect implied by a model root chunk version, if any
    pub fn from_root_version(version: u32) -> Option<Self> {
        match version {
            3 => Some(Self::Whm),
            1 => Some(Self::Sgm),
            _ => None,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Whm => "WHM",
            Self::Sgm => "SGM",
        })
    }
}

/// Version a chunk carries in this dialect under the given parent folder.
///
/// `None` means the chunk has no place in a model container here.
pub fn expected_version(variant: Variant, parent: Option<ChunkId>, id: ChunkId) -> Option<u32> {
    let legacy = variant == Variant::Sgm;
    let parent_tag = parent.map(ChunkId::tag);
    let version = match id.as_bytes() {
        b"DATAFBIF" => 1,
        b"FOLDRSGM" => variant.root_version(),
        b"DATASSHR" => {
            if legacy {
                1
            } else {
                2
            }
        }
        b"FOLDTXTR" | b"FOLDIMAG" | b"FOLDMSGR" | b"FOLDMSLC" => 1,
        b"DATAHEAD" => 1,
        b"DATAATTR" => 2,
        b"FOLDSHDR" => 1,
        b"DATACHAN" => 3,
        b"DATASKEL" if !legacy => 5,
        b"FOLDSKEL" if legacy => 3,
        b"DATABONE" if legacy => 5,
        b"DATAMARK" => 1,
        b"DATACAMS" if !legacy => 1,
        b"DATACMRA" if legacy => 1,
        b"FOLDANIM" => {
            if legacy {
                2
            } else {
                3
            }
        }
        b"FOLDDATA" if legacy => 3,
        b"DATABANM" if legacy => 2,
        b"DATACANM" if legacy => 2,
        b"DATAANBV" if !legacy => 1,
        b"DATABVOL" => 2,
        b"DATAINFO" => match &parent_tag? {
            b"TXTR" => 3,
            b"SHDR" => 1,
            b"SKEL" => 1,
            b"DATA" => 5,
            _ => return None,
        },
        b"DATADATA" => match &parent_tag? {
            b"IMAG" | b"MSLC" => 2,
            b"MSGR" => 1,
            b"ANIM" => 2,
            _ => return None,
        },
        _ => return None,
    };
    Some(version)
}

/// Reject a chunk whose version does not match the dialect's table.
///
/// Chunks outside the table pass; the model reader skips those with a log
/// line instead of failing on every tag it does not consume.
pub fn check_version(
    variant: Variant,
    parent: Option<ChunkId>,
    header: &ChunkHeader,
) -> Result<()> {
    match expected_version(variant, parent, header.id) {
        Some(expected) if expected != header.version => {
            Err(ChunkyError::UnsupportedVersion {
                id: header.id,
                version: header.version,
            }
            .into())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case(Variant::Whm, None, ChunkId::fold(b"RSGM"), Some(3))]
    #[test_case(Variant::Sgm, None, ChunkId::fold(b"RSGM"), Some(1))]
    #[test_case(Variant::Whm, Some(ChunkId::fold(b"RSGM")), ChunkId::data(b"SSHR"), Some(2))]
    #[test_case(Variant::Sgm, Some(ChunkId::fold(b"RSGM")), ChunkId::data(b"SSHR"), Some(1))]
    #[test_case(Variant::Whm, Some(ChunkId::fold(b"RSGM")), ChunkId::data(b"SKEL"), Some(5))]
    #[test_case(Variant::Sgm, Some(ChunkId::fold(b"RSGM")), ChunkId::data(b"SKEL"), None)]
    #[test_case(Variant::Sgm, Some(ChunkId::fold(b"SKEL")), ChunkId::data(b"BONE"), Some(5))]
    #[test_case(Variant::Whm, Some(ChunkId::fold(b"ANIM")), ChunkId::data(b"DATA"), Some(2))]
    #[test_case(Variant::Sgm, Some(ChunkId::fold(b"ANIM")), ChunkId::fold(b"DATA"), Some(3))]
    #[test_case(Variant::Whm, Some(ChunkId::fold(b"MSGR")), ChunkId::data(b"DATA"), Some(1))]
    #[test_case(Variant::Whm, Some(ChunkId::fold(b"MSLC")), ChunkId::data(b"DATA"), Some(2))]
    #[test_case(Variant::Whm, Some(ChunkId::fold(b"TXTR")), ChunkId::data(b"INFO"), Some(3))]
    #[test_case(Variant::Whm, Some(ChunkId::fold(b"SHDR")), ChunkId::data(b"INFO"), Some(1))]
    #[test_case(Variant::Sgm, Some(ChunkId::fold(b"DATA")), ChunkId::data(b"INFO"), Some(5))]
    #[test_case(Variant::Whm, None, ChunkId::data(b"INFO"), None; "info needs a parent")]
    #[test_case(Variant::Whm, None, ChunkId::fold(b"TPAT"), None; "pattern root is not a model chunk")]
    fn test_expected_version(
        variant: Variant,
        parent: Option<ChunkId>,
        id: ChunkId,
        expected: Option<u32>,
    ) {
        assert_eq!(expected_version(variant, parent, id), expected);
    }

    #[test]
    fn test_check_version_rejects_mismatch() {
        let header = ChunkHeader {
            id: ChunkId::fold(b"RSGM"),
            version: 2,
            size: 0,
            name: String::new(),
        };
        let err = check_version(Variant::Whm, None, &header).unwrap_err();
        assert!(err.to_string().contains("FOLDRSGM"));
    }

    #[test]
    fn test_check_version_passes_unknown_tags() {
        let header = ChunkHeader {
            id: ChunkId::data(b"XXXX"),
            version: 7,
            size: 0,
            name: String::new(),
        };
        assert!(check_version(Variant::Whm, None, &header).is_ok());
    }

    #[test]
    fn test_variant_from_root_version() {
        assert_eq!(Variant::from_root_version(3), Some(Variant::Whm));
        assert_eq!(Variant::from_root_version(1), Some(Variant::Sgm));
        assert_eq!(Variant::from_root_version(2), None);
    }
}
