//! Axis conversions between scene space and the container's engine space.
//!
//! Scene space is right-handed Z-up, the convention of common DCC tools.
//! The engine stores two different packings and both appear in one file:
//! mesh data (vertex positions and normals) swaps the up axis into the
//! middle component, while skeleton and animation data keeps the scene
//! component order and only mirrors X. Rotations share one packing
//! everywhere.

use glam::{Quat, Vec3};

/// Pack a vertex position or normal for storage
pub fn mesh_vector_to_disk(v: Vec3) -> [f32; 3] {
    [-v.x, v.z, -v.y]
}

/// Unpack a stored vertex position or normal
pub fn mesh_vector_from_disk(d: [f32; 3]) -> Vec3 {
    Vec3::new(-d[0], -d[2], d[1])
}

/// Pack a bone, marker or animation-key position for storage
pub fn bone_vector_to_disk(v: Vec3) -> [f32; 3] {
    [-v.x, v.y, v.z]
}

/// Unpack a stored bone, marker or animation-key position
pub fn bone_vector_from_disk(d: [f32; 3]) -> Vec3 {
    Vec3::new(-d[0], d[1], d[2])
}

/// Pack a rotation for storage, component order (x, y, z, w)
pub fn rotation_to_disk(q: Quat) -> [f32; 4] {
    [q.x, -q.y, -q.z, q.w]
}

/// Unpack a stored rotation
pub fn rotation_from_disk(d: [f32; 4]) -> Quat {
    Quat::from_xyzw(d[0], -d[1], -d[2], d[3])
}

/// Swap a triangle between scene winding and stored winding.
///
/// Stored faces hold their second and third corners exchanged; the swap is
/// its own inverse.
pub fn swap_winding<T: Copy>(face: [T; 3]) -> [T; 3] {
    [face[0], face[2], face[1]]
}

/// Flip `q` onto the same hemisphere as `prev` so interpolation between
/// successive keys takes the short arc
pub fn align_rotation(prev: Quat, q: Quat) -> Quat {
    if prev.dot(q) < 0.0 { -q } else { q }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_vector_round_trip() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(mesh_vector_to_disk(v), [-1.0, 3.0, -2.0]);
        assert_eq!(mesh_vector_from_disk(mesh_vector_to_disk(v)), v);
    }

    #[test]
    fn test_bone_vector_round_trip() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(bone_vector_to_disk(v), [-1.0, 2.0, 3.0]);
        assert_eq!(bone_vector_from_disk(bone_vector_to_disk(v)), v);
    }

    #[test]
    fn test_rotation_round_trip() {
        let q = Quat::from_xyzw(0.1, 0.2, 0.3, 0.9).normalize();
        let packed = rotation_to_disk(q);
        assert_eq!(packed[0], q.x);
        assert_eq!(packed[1], -q.y);
        assert_eq!(rotation_from_disk(packed), q);
    }

    #[test]
    fn test_swap_winding_is_involution() {
        let face = [3u32, 7, 9];
        assert_eq!(swap_winding(face), [3, 9, 7]);
        assert_eq!(swap_winding(swap_winding(face)), face);
    }

    #[test]
    fn test_align_rotation_flips_opposite_hemisphere() {
        let q = Quat::from_xyzw(0.0, 0.0, 0.0, 1.0);
        let flipped = Quat::from_xyzw(0.0, 0.0, 0.0, -1.0);
        assert_eq!(align_rotation(q, flipped), q);
        assert_eq!(align_rotation(q, q), q);
    }
}
