//! Decode configuration.
//!
//! Every knob the decoders consult lives here and is passed explicitly into
//! each decode call; nothing is read from ambient state.

/// Default uniform positional scale (exporter units are centimeters).
pub const DEFAULT_SCALE: f32 = 0.01;

/// Default bone display length, in unscaled exporter units.
pub const DEFAULT_BONE_LENGTH: f32 = 5.0;

/// How world actors share decoded meshes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeshInstancing {
    /// All actors referencing one hash share a single decoded mesh.
    #[default]
    Shared,
    /// Every actor receives its own deep copy.
    Copy,
}

/// Options consumed by the decoders.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecodeOptions {
    /// Uniform factor applied to every stored position (vertices, bones,
    /// morph deltas, sockets, animation translations, actor locations).
    pub scale: f32,
    /// Bone display length for hosts; does not affect decoding.
    pub bone_length: f32,
    /// Share meshes between world actors instead of copying them.
    pub instance_meshes: bool,
    /// Retargeting emits rotation channels only.
    pub rotation_only: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            bone_length: DEFAULT_BONE_LENGTH,
            instance_meshes: true,
            rotation_only: false,
        }
    }
}

impl DecodeOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that keep stored positions unscaled.
    pub fn unscaled() -> Self {
        Self::default().with_scale(1.0)
    }

    /// Set the positional scale factor.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the bone display length.
    pub fn with_bone_length(mut self, bone_length: f32) -> Self {
        self.bone_length = bone_length;
        self
    }

    /// Choose shared or copied world meshes.
    pub fn with_instance_meshes(mut self, instance_meshes: bool) -> Self {
        self.instance_meshes = instance_meshes;
        self
    }

    /// Restrict retargeting to rotation channels.
    pub fn with_rotation_only(mut self, rotation_only: bool) -> Self {
        self.rotation_only = rotation_only;
        self
    }

    /// Instancing policy implied by [`DecodeOptions::instance_meshes`].
    pub fn instancing(&self) -> MeshInstancing {
        if self.instance_meshes {
            MeshInstancing::Shared
        } else {
            MeshInstancing::Copy
        }
    }

    /// Bone display length in scene units.
    pub fn scaled_bone_length(&self) -> f32 {
        self.bone_length * self.scale
    }
}
