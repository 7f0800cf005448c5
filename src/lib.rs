//! # UEFormat
//!
//! Decoder for UEFormat asset containers (`.uemodel`, `.ueanim`, `.ueworld`)
//! as written by Unreal Engine asset exporters.
//!
//! The crate turns container bytes into a neutral scene description:
//! meshes with skinning and morph data, bone hierarchies with resolved world
//! matrices, keyframed animation tracks and world-actor placements. It never
//! talks to a host scene graph; consumers map the result into their own.
//!
//! ## Modules
//!
//! - [`util`] - Errors and math helpers
//! - [`core`] - Compression codecs and decode options
//! - [`format`] - Envelope, byte reader, section stream and encoder
//! - [`scene`] - Result types (model, animation, world, skeleton)
//! - [`decode`] - Decoders and top-level entry points
//!
//! ## Example
//!
//! ```ignore
//! use ueformat::prelude::*;
//!
//! let bytes = std::fs::read("Mannequin.uemodel")?;
//! let model = decode_model(&bytes, &DecodeOptions::default())?;
//! for group in &model.vertex_groups {
//!     println!("{}: {} vertices", group.name, group.weights.len());
//! }
//! ```

#![forbid(unsafe_code)]

pub mod util;
pub mod core;
pub mod format;
pub mod scene;
pub mod decode;

// Re-export commonly used types
pub use crate::core::{CompressionAlgorithm, DecodeOptions, MeshInstancing};
pub use decode::{decode, decode_anim, decode_anim_with_skeleton, decode_model, decode_world};
pub use format::{encode_anim, encode_model, encode_world, ContainerKind};
pub use scene::{AnimScene, ModelScene, SceneModel, Skeleton, WorldScene};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{CompressionAlgorithm, DecodeOptions, MeshInstancing};
    pub use crate::decode::{
        decode, decode_anim, decode_anim_with_skeleton, decode_model, decode_world, retarget,
    };
    pub use crate::format::{encode_anim, encode_model, encode_world, ContainerKind};
    pub use crate::scene::*;
    pub use crate::util::{Error, Result};
}
