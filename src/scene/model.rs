//! Model scene types.
//!
//! [`ModelData`] holds the arrays exactly as decoded (positions already
//! scaled). [`ModelScene`] adds everything reconstructed from them: the
//! resolved skeleton, per-bone vertex groups, absolute morph shapes,
//! resolved sockets and the per-face material buffer.

use std::collections::BTreeMap;

use super::skeleton::{Bone, Skeleton};
use crate::util::{Bounds3, Mat4, Quat, Vec2, Vec3, Vec4};

/// Contiguous run of faces using one material.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MaterialRange {
    pub name: String,
    /// Offset into the index buffer (index units, not faces).
    pub first_index: u32,
    pub face_count: u32,
}

impl MaterialRange {
    /// First face covered by this range.
    #[inline]
    pub fn first_face(&self) -> usize {
        (self.first_index / 3) as usize
    }

    /// One past the last face covered by this range.
    #[inline]
    pub fn end_face(&self) -> usize {
        self.first_face() + self.face_count as usize
    }
}

/// Influence of one bone on one vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VertexWeight {
    pub bone_index: u16,
    pub vertex_index: u32,
    pub weight: f32,
}

/// Sparse per-vertex delta of a morph target.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MorphDelta {
    /// Position offset, already scaled.
    pub position: Vec3,
    pub normal: Vec3,
    pub vertex_index: u32,
}

/// Named sparse set of vertex deltas.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MorphTarget {
    pub name: String,
    pub deltas: Vec<MorphDelta>,
}

/// Attachment point parented to a bone by name.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Socket {
    pub name: String,
    pub parent_name: String,
    /// Parent-relative position, already scaled.
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

/// Raw model arrays as decoded from a `UEMODEL` payload.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModelData {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<[u32; 3]>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
    /// Byte-quantized RGBA.
    pub colors: Vec<[u8; 4]>,
    /// UV channels, each one float2 per vertex.
    pub uvs: Vec<Vec<Vec2>>,
    pub materials: Vec<MaterialRange>,
    pub weights: Vec<VertexWeight>,
    pub bones: Vec<Bone>,
    pub morph_targets: Vec<MorphTarget>,
    pub sockets: Vec<Socket>,
}

impl ModelData {
    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.indices.len()
    }

    /// Check if the model carries skeletal data.
    #[inline]
    pub fn has_skeleton(&self) -> bool {
        !self.bones.is_empty() || !self.sockets.is_empty()
    }
}

/// Influences of one bone, keyed by vertex index.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VertexGroup {
    /// Bone name; groups are matched to bones by name.
    pub name: String,
    pub bone_index: usize,
    /// Summed weight per vertex.
    pub weights: BTreeMap<u32, f32>,
}

impl VertexGroup {
    /// Weight of a vertex in this group, zero if absent.
    pub fn weight(&self, vertex_index: u32) -> f32 {
        self.weights.get(&vertex_index).copied().unwrap_or(0.0)
    }
}

/// Absolute vertex positions of one morph target.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MorphShape {
    pub name: String,
    pub positions: Vec<Vec3>,
}

/// Socket whose parent bone was found.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResolvedSocket {
    pub socket: Socket,
    pub parent_index: usize,
    /// `parent_world × T(position) × R(rotation)`.
    pub world: Mat4,
}

/// Name of the basis shape placed before the morph targets.
pub const BASIS_SHAPE_NAME: &str = "Default";

/// Fully reconstructed model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModelScene {
    pub name: String,
    pub data: ModelData,
    pub skeleton: Option<Skeleton>,
    pub vertex_groups: Vec<VertexGroup>,
    /// Basis shape followed by one absolute shape per morph target; empty
    /// when the model has no morph targets.
    pub shapes: Vec<MorphShape>,
    pub sockets: Vec<ResolvedSocket>,
    /// Material index per face; empty when the model has no materials.
    pub face_materials: Vec<u32>,
    /// Bone display length in scene units.
    pub bone_length: f32,
}

impl ModelScene {
    /// Vertex positions.
    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.data.vertices
    }

    /// Triangle index triples.
    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.data.indices
    }

    /// Number of triangles.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.data.indices.len()
    }

    /// Bounding box of the base mesh.
    pub fn bounds(&self) -> Bounds3 {
        Bounds3::from_points(&self.data.vertices)
    }

    /// Morph shapes excluding the basis.
    pub fn morph_shapes(&self) -> &[MorphShape] {
        self.shapes.get(1..).unwrap_or(&[])
    }

    /// Absolute shape of a morph target by name.
    pub fn morph_shape(&self, name: &str) -> Option<&MorphShape> {
        self.morph_shapes().iter().find(|s| s.name == name)
    }

    /// Vertex group of a bone by name.
    pub fn vertex_group(&self, name: &str) -> Option<&VertexGroup> {
        self.vertex_groups.iter().find(|g| g.name == name)
    }

    /// Vertex colors normalized to `[0, 1]`.
    pub fn normalized_colors(&self) -> Vec<Vec4> {
        self.data
            .colors
            .iter()
            .map(|c| Vec4::new(c[0] as f32, c[1] as f32, c[2] as f32, c[3] as f32) / 255.0)
            .collect()
    }

    /// Normalized colors expanded to one entry per face corner.
    ///
    /// Returns `None` when the model has no colors.
    pub fn face_corner_colors(&self) -> Option<Vec<Vec4>> {
        if self.data.colors.is_empty() {
            return None;
        }
        let colors = self.normalized_colors();
        Some(self.expand_corners(&colors, Vec4::ONE))
    }

    /// UVs of one channel expanded to one entry per face corner.
    pub fn face_corner_uvs(&self, channel: usize) -> Option<Vec<Vec2>> {
        let uvs = self.data.uvs.get(channel)?;
        Some(self.expand_corners(uvs, Vec2::ZERO))
    }

    fn expand_corners<T: Copy>(&self, per_vertex: &[T], fallback: T) -> Vec<T> {
        self.data
            .indices
            .iter()
            .flat_map(|tri| tri.iter())
            .map(|&v| per_vertex.get(v as usize).copied().unwrap_or(fallback))
            .collect()
    }

    /// Bones that no vertex group references.
    pub fn non_deforming_bones(&self) -> Vec<usize> {
        let Some(skeleton) = &self.skeleton else {
            return Vec::new();
        };
        (0..skeleton.len())
            .filter(|&i| !self.vertex_groups.iter().any(|g| g.bone_index == i))
            .collect()
    }
}
