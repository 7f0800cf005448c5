//! Math type re-exports and UEFormat-specific math utilities.
//!
//! Containers store quaternions as `x, y, z, w`, which is also glam's
//! component order, so rotations are taken over without reshuffling. Hosts
//! that expect `w` first can use [`quat_to_wxyz`].

use std::fmt;

// Re-export glam types
pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// 3D bounding box.
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds3 {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Bounding box of a point set. Empty input yields [`Bounds3::EMPTY`].
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut b = Self::EMPTY;
        for &p in points {
            b.expand_by_point(p);
        }
        b
    }

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (extents) of the box.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for Bounds3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bounds3({:?} - {:?})", self.min, self.max)
    }
}

/// Unit-length copy of `q`; degenerate (zero) quaternions become identity.
#[inline]
pub fn normalize_quat(q: Quat) -> Quat {
    let len = q.length();
    if len > f32::EPSILON {
        q / len
    } else {
        Quat::IDENTITY
    }
}

/// `Translation(position) × Rotation(rotation)`.
#[inline]
pub fn translation_rotation(position: Vec3, rotation: Quat) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_quat(normalize_quat(rotation))
}

/// Quaternion components in `w, x, y, z` order.
#[inline]
pub fn quat_to_wxyz(q: Quat) -> [f32; 4] {
    [q.w, q.x, q.y, q.z]
}

/// Rotation part of an affine matrix, ignoring any scale.
#[inline]
pub fn rotation_of(m: &Mat4) -> Quat {
    let (_, rotation, _) = m.to_scale_rotation_translation();
    rotation
}
