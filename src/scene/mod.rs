//! Neutral scene description produced by the decoders.
//!
//! Everything here is plain owned data handed to the host; nothing in this
//! module calls back into host scene-graph APIs.
//!
//! - [`ModelScene`] - geometry, skeleton, vertex groups, morph shapes, sockets
//! - [`AnimScene`] - per-bone keyframe tracks and float curves
//! - [`WorldScene`] - deduplicated meshes and actor placements

pub mod anim;
pub mod model;
pub mod skeleton;
pub mod world;

pub use anim::{
    AnimData, AnimScene, Curve, FloatKey, Key, QuatKey, RetargetedTrack, Track, VectorKey,
};
pub use model::{
    MaterialRange, ModelData, ModelScene, MorphDelta, MorphShape, MorphTarget, ResolvedSocket,
    Socket, VertexGroup, VertexWeight, BASIS_SHAPE_NAME,
};
pub use skeleton::{Bone, Skeleton};
pub use world::{HashedMesh, PlacedActor, WorldActor, WorldData, WorldScene};

use crate::format::ContainerKind;

/// Result of decoding one container.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SceneModel {
    Model(ModelScene),
    Anim(AnimScene),
    World(WorldScene),
}

impl SceneModel {
    /// Kind of container this scene came from.
    pub fn kind(&self) -> ContainerKind {
        match self {
            Self::Model(_) => ContainerKind::Model,
            Self::Anim(_) => ContainerKind::Anim,
            Self::World(_) => ContainerKind::World,
        }
    }

    /// Object name from the container header.
    pub fn name(&self) -> &str {
        match self {
            Self::Model(m) => &m.name,
            Self::Anim(a) => &a.name,
            Self::World(w) => &w.name,
        }
    }

    pub fn as_model(&self) -> Option<&ModelScene> {
        match self {
            Self::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_anim(&self) -> Option<&AnimScene> {
        match self {
            Self::Anim(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_world(&self) -> Option<&WorldScene> {
        match self {
            Self::World(w) => Some(w),
            _ => None,
        }
    }

    pub fn into_model(self) -> Option<ModelScene> {
        match self {
            Self::Model(m) => Some(m),
            _ => None,
        }
    }
}
