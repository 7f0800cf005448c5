//! Bone arena with resolved world matrices.
//!
//! Bones are stored in decode order, which is pre-order: a parent always
//! precedes its children. That lets world matrices be composed in a single
//! forward pass, and any parent index that points forward (or at the bone
//! itself) is rejected as a malformed hierarchy.

use std::collections::HashMap;

use crate::util::{translation_rotation, Error, Mat4, Quat, Result, Vec3};

/// A skeletal bone as stored in a model container.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Bone {
    pub name: String,
    /// Index of the parent bone, `-1` for roots.
    pub parent_index: i32,
    /// Parent-relative position, already scaled.
    pub position: Vec3,
    /// Parent-relative rotation.
    pub rotation: Quat,
}

impl Bone {
    /// Create a bone.
    pub fn new(name: impl Into<String>, parent_index: i32, position: Vec3, rotation: Quat) -> Self {
        Self { name: name.into(), parent_index, position, rotation }
    }

    /// Check if this bone has no parent.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_index < 0
    }

    /// Parent-relative matrix: `T(position) × R(rotation)`.
    #[inline]
    pub fn local_matrix(&self) -> Mat4 {
        translation_rotation(self.position, self.rotation)
    }
}

/// Skeleton with resolved hierarchy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Skeleton {
    bones: Vec<Bone>,
    world: Vec<Mat4>,
    #[cfg_attr(feature = "serde", serde(skip))]
    by_name: HashMap<String, usize>,
}

impl Skeleton {
    /// Resolve world matrices for a pre-ordered bone list.
    ///
    /// `world(root) = T × R` and `world(child) = world(parent) × T × R`.
    pub fn resolve(bones: Vec<Bone>) -> Result<Self> {
        let mut world: Vec<Mat4> = Vec::with_capacity(bones.len());
        let mut by_name = HashMap::with_capacity(bones.len());

        for (index, bone) in bones.iter().enumerate() {
            let local = bone.local_matrix();
            let matrix = match bone.parent_index {
                -1 => local,
                parent if parent >= 0 && (parent as usize) < index => world[parent as usize] * local,
                parent => {
                    return Err(Error::MalformedHierarchy {
                        bone: bone.name.clone(),
                        index,
                        parent,
                    })
                }
            };
            world.push(matrix);

            let key = bone.name.to_lowercase();
            if by_name.contains_key(&key) {
                tracing::warn!(bone = %bone.name, index, "duplicate bone name; lookups resolve to the first");
            } else {
                by_name.insert(key, index);
            }
        }

        tracing::trace!(bones = bones.len(), "resolved skeleton");
        Ok(Self { bones, world, by_name })
    }

    /// Number of bones.
    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Check if the skeleton has no bones.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// All bones in decode order.
    #[inline]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Bone by index.
    #[inline]
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// World matrices, parallel to [`Skeleton::bones`].
    #[inline]
    pub fn world_matrices(&self) -> &[Mat4] {
        &self.world
    }

    /// World matrix of a bone.
    #[inline]
    pub fn world_matrix(&self, index: usize) -> Option<&Mat4> {
        self.world.get(index)
    }

    /// Parent index of a bone, `None` for roots or unknown indices.
    pub fn parent(&self, index: usize) -> Option<usize> {
        let parent = self.bones.get(index)?.parent_index;
        usize::try_from(parent).ok()
    }

    /// Case-insensitive lookup of a bone index by name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name.get(&name.to_lowercase()).copied()
    }

    /// Indices of the direct children of a bone.
    pub fn children(&self, index: usize) -> Vec<usize> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent_index >= 0 && b.parent_index as usize == index)
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of all root bones.
    pub fn roots(&self) -> Vec<usize> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_root())
            .map(|(i, _)| i)
            .collect()
    }

    /// Depth of a bone in the hierarchy (roots are 0).
    pub fn depth(&self, index: usize) -> usize {
        let mut depth = 0;
        let mut current = self.parent(index);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }
}
