//! Top-level decoding entry points.
//!
//! Every call is independent: options are passed in explicitly, nothing is
//! cached between calls, and the result owns all of its data.
//!
//! ```ignore
//! use ueformat::{decode, DecodeOptions, SceneModel};
//!
//! let bytes = std::fs::read("Mannequin.uemodel")?;
//! match decode(&bytes, &DecodeOptions::default())? {
//!     SceneModel::Model(model) => println!("{} faces", model.num_faces()),
//!     other => println!("{} container", other.kind()),
//! }
//! ```

pub mod anim;
pub mod model;
pub mod world;

pub use anim::{retarget, AnimDecoder};
pub use model::{shape_offsets, ModelDecoder};
pub use world::{ContainerDecoder, MeshDecoder, WorldDecoder};

use crate::core::DecodeOptions;
use crate::format::Container;
use crate::scene::{AnimScene, ModelScene, SceneModel, Skeleton, WorldScene};
use crate::util::Result;

/// Decode any container kind.
pub fn decode(bytes: &[u8], options: &DecodeOptions) -> Result<SceneModel> {
    let container = Container::parse(bytes)?;
    decode_container(&container, options)
}

/// Decode an already parsed container.
pub fn decode_container(container: &Container<'_>, options: &DecodeOptions) -> Result<SceneModel> {
    use crate::format::ContainerKind;

    match container.kind() {
        ContainerKind::Model => ModelDecoder::new(options).decode(container).map(SceneModel::Model),
        ContainerKind::Anim => AnimDecoder::new(options).decode(container).map(SceneModel::Anim),
        ContainerKind::World => WorldDecoder::new(options).decode(container).map(SceneModel::World),
    }
}

/// Decode a `UEMODEL` container; other kinds are a malformed envelope.
pub fn decode_model(bytes: &[u8], options: &DecodeOptions) -> Result<ModelScene> {
    ModelDecoder::new(options).decode(&Container::parse(bytes)?)
}

/// Decode a `UEANIM` container without retargeting.
pub fn decode_anim(bytes: &[u8], options: &DecodeOptions) -> Result<AnimScene> {
    AnimDecoder::new(options).decode(&Container::parse(bytes)?)
}

/// Decode a `UEANIM` container and retarget it onto `skeleton`.
pub fn decode_anim_with_skeleton(
    bytes: &[u8],
    options: &DecodeOptions,
    skeleton: &Skeleton,
) -> Result<AnimScene> {
    AnimDecoder::new(options).decode_onto(&Container::parse(bytes)?, skeleton)
}

/// Decode a `UEWORLD` container.
pub fn decode_world(bytes: &[u8], options: &DecodeOptions) -> Result<WorldScene> {
    WorldDecoder::new(options).decode(&Container::parse(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{encode_anim, encode_model, ContainerKind};
    use crate::scene::ModelData;
    use crate::util::{Error, Vec3};

    #[test]
    fn test_dispatch_by_kind() {
        let model = ModelData { vertices: vec![Vec3::ONE], ..Default::default() };
        let bytes = encode_model("Box", &model, None).unwrap();
        let scene = decode(&bytes, &DecodeOptions::unscaled()).unwrap();
        assert_eq!(scene.kind(), ContainerKind::Model);
        assert_eq!(scene.name(), "Box");
        assert_eq!(scene.as_model().unwrap().positions(), &[Vec3::ONE]);
    }

    #[test]
    fn test_kind_mismatch() {
        let bytes = encode_anim("Walk", &Default::default(), None).unwrap();
        assert!(decode_anim(&bytes, &DecodeOptions::new()).is_ok());
        let err = decode_model(&bytes, &DecodeOptions::new()).unwrap_err();
        assert!(matches!(err, Error::MalformedEnvelope(_)));
    }
}
