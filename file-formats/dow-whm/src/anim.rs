//! Animation channel semantics.
//!
//! The container stores per-action channels; the engine merges them across
//! all concurrently active actions at runtime. The merge rules live here so
//! decoded models can be validated against engine behavior, together with
//! the wire-level record mapping shared by the parser and writer.

use glam::Vec2;

use crate::error::{Result, WhmError};
use crate::props;
use crate::scene::{Action, BoneTrack, ExtraChannel, Key, UvChannelKind};

/// Visibility values at or above this threshold count as visible; the
/// engine has no continuous alpha for mesh visibility
pub const VISIBILITY_THRESHOLD: f32 = 0.5;

/// Channel record mode tag for mesh visibility records
pub(crate) const CHANNEL_MODE_TEXTURE: i32 = 0;
/// Channel record mode tag for material UV records
pub(crate) const CHANNEL_MODE_MESH: i32 = 2;

/// True when `action` forces `mesh` invisible for its whole duration.
///
/// An absent channel never forces a mesh invisible.
pub fn force_invisible(action: &Action, mesh: &str) -> bool {
    action.channels.iter().any(|channel| match channel {
        ExtraChannel::ForceInvisible { mesh: target, hidden } => {
            *hidden && props::matches_target(target, mesh)
        }
        _ => false,
    })
}

/// Merged visibility of `mesh` across concurrently active actions.
///
/// A mesh stays visible as long as at least one active action does not
/// force it invisible; with no active actions it is visible.
pub fn merge_visibility<'a>(actions: impl IntoIterator<Item = &'a Action>, mesh: &str) -> bool {
    let mut any_action = false;
    for action in actions {
        if !force_invisible(action, mesh) {
            return true;
        }
        any_action = true;
    }
    !any_action
}

/// Transform track driving `bone` given actions in priority order.
///
/// The first action whose track for the bone is not stale wins. `None`
/// means every active action marks the bone stale (or carries no track
/// for it); callers fall back to the rest pose then.
pub fn resolve_bone_track<'a>(
    actions: impl IntoIterator<Item = &'a Action>,
    bone: &str,
) -> Option<&'a BoneTrack> {
    actions
        .into_iter()
        .find_map(|action| action.track(bone).filter(|track| !track.stale))
}

/// Sample a scalar curve at a normalized time with linear interpolation.
///
/// Times outside the keyed range clamp to the nearest key; an empty curve
/// yields `default`.
pub fn sample_curve(keys: &[Key<f32>], time: f32, default: f32) -> f32 {
    let Some(first) = keys.first() else {
        return default;
    };
    if time <= first.time {
        return first.value;
    }
    for pair in keys.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if time <= b.time {
            let span = b.time - a.time;
            if span <= f32::EPSILON {
                return b.value;
            }
            return a.value + (b.value - a.value) * ((time - a.time) / span);
        }
    }
    keys[keys.len() - 1].value
}

/// Continuous visibility of `mesh` in `action` at a normalized time.
///
/// Defaults to fully visible when the action has no visibility curve for
/// the mesh.
pub fn visibility_at(action: &Action, mesh: &str, time: f32) -> f32 {
    let keys = action.channels.iter().find_map(|channel| match channel {
        ExtraChannel::Visibility { mesh: target, keys } if props::matches_target(target, mesh) => {
            Some(keys.as_slice())
        }
        _ => None,
    });
    sample_curve(keys.unwrap_or(&[]), time, 1.0)
}

/// Thresholded visibility of `mesh` in `action` at a normalized time
pub fn is_visible_at(action: &Action, mesh: &str, time: f32) -> bool {
    !force_invisible(action, mesh) && visibility_at(action, mesh, time) >= VISIBILITY_THRESHOLD
}

/// UV offset and tiling applied to `material` at a normalized time.
///
/// Unkeyed axes keep their identity value, (0, 0) for offset and (1, 1)
/// for tiling.
pub fn uv_transform_at(action: &Action, material: &str, time: f32) -> (Vec2, Vec2) {
    let mut offset = Vec2::new(0.0, 0.0);
    let mut tiling = Vec2::new(1.0, 1.0);
    for channel in &action.channels {
        match channel {
            ExtraChannel::UvOffset { material: target, u, v }
                if props::matches_target(target, material) =>
            {
                offset.x = sample_curve(u, time, 0.0);
                offset.y = sample_curve(v, time, 0.0);
            }
            ExtraChannel::UvTiling { material: target, u, v }
                if props::matches_target(target, material) =>
            {
                tiling.x = sample_curve(u, time, 1.0);
                tiling.y = sample_curve(v, time, 1.0);
            }
            _ => {}
        }
    }
    (offset, tiling)
}

/// UV animation record type on the wire.
///
/// Each record animates a single axis of one material transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UvRecord {
    OffsetU,
    OffsetV,
    TilingU,
    TilingV,
}

impl UvRecord {
    pub(crate) fn from_code(code: i32) -> Result<Self> {
        match code {
            1 => Ok(Self::OffsetU),
            2 => Ok(Self::OffsetV),
            3 => Ok(Self::TilingU),
            4 => Ok(Self::TilingV),
            other => Err(WhmError::UnknownUvRecordType(other)),
        }
    }

    pub(crate) fn code(self) -> i32 {
        match self {
            Self::OffsetU => 1,
            Self::OffsetV => 2,
            Self::TilingU => 3,
            Self::TilingV => 4,
        }
    }

    pub(crate) fn for_axis(kind: UvChannelKind, v_axis: bool) -> Self {
        match (kind, v_axis) {
            (UvChannelKind::Offset, false) => Self::OffsetU,
            (UvChannelKind::Offset, true) => Self::OffsetV,
            (UvChannelKind::Tiling, false) => Self::TilingU,
            (UvChannelKind::Tiling, true) => Self::TilingV,
        }
    }

    pub(crate) fn kind(self) -> UvChannelKind {
        match self {
            Self::OffsetU | Self::OffsetV => UvChannelKind::Offset,
            Self::TilingU | Self::TilingV => UvChannelKind::Tiling,
        }
    }

    pub(crate) fn is_v_axis(self) -> bool {
        matches!(self, Self::OffsetV | Self::TilingV)
    }

    /// Every record except the offset U axis is sign-flipped on disk
    pub(crate) fn disk_scale(self) -> f32 {
        if self == Self::OffsetU { 1.0 } else { -1.0 }
    }
}
