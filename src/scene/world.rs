//! World scene types.

use std::collections::HashMap;
use std::sync::Arc;

use super::model::ModelScene;
use crate::core::MeshInstancing;
use crate::util::{Mat4, Quat, Vec3};

/// Embedded model container keyed by hash.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HashedMesh {
    pub hash: u32,
    /// A complete `UEMODEL` container.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub data: Vec<u8>,
}

/// Placement of a mesh in the world.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WorldActor {
    pub mesh_hash: u32,
    pub name: String,
    /// Location, already scaled.
    pub position: Vec3,
    /// Per-axis rotation in degrees, as stored by the exporter.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl WorldActor {
    /// Rotation as XYZ Euler radians.
    ///
    /// The exporter stores `(pitch, yaw, roll)`; the host's X/Y/Z rotations
    /// take roll, pitch and yaw respectively.
    pub fn euler_radians(&self) -> Vec3 {
        Vec3::new(
            self.rotation.z.to_radians(),
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
        )
    }

    /// Rotation as a quaternion.
    ///
    /// Extrinsic XYZ: X is applied first about the fixed axes, so the
    /// composed rotation is `Rz × Ry × Rx`.
    pub fn rotation_quat(&self) -> Quat {
        let e = self.euler_radians();
        Quat::from_rotation_z(e.z) * Quat::from_rotation_y(e.y) * Quat::from_rotation_x(e.x)
    }

    /// `T(position) × R(rotation) × S(scale)`.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation_quat(), self.position)
    }
}

/// Raw world arrays as decoded from a `UEWORLD` payload.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WorldData {
    pub meshes: Vec<HashedMesh>,
    pub actors: Vec<WorldActor>,
}

/// Actor bound to its decoded mesh.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlacedActor {
    pub actor: WorldActor,
    pub mesh: Arc<ModelScene>,
}

/// Decoded world container.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WorldScene {
    pub name: String,
    /// One decoded mesh per distinct hash.
    pub meshes: HashMap<u32, Arc<ModelScene>>,
    pub actors: Vec<PlacedActor>,
    pub instancing: MeshInstancing,
}

impl WorldScene {
    /// Decoded mesh for a hash.
    pub fn mesh(&self, hash: u32) -> Option<&Arc<ModelScene>> {
        self.meshes.get(&hash)
    }

    /// Actors placing the mesh with the given hash.
    pub fn actors_using(&self, hash: u32) -> impl Iterator<Item = &PlacedActor> {
        self.actors.iter().filter(move |a| a.actor.mesh_hash == hash)
    }
}
