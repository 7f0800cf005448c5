//! UEFormat binary layer.
//!
//! A container is an envelope followed by a payload of sections:
//!
//! ```text
//! +-----------------------------+
//! | Envelope (see container)    |  magic, kind, version, name, compression
//! +-----------------------------+
//! | [num_frames, fps]           |  UEANIM only
//! +-----------------------------+
//! | Section 0                   |  name, element count, byte size, body
//! | Section 1                   |
//! | ...                         |
//! +-----------------------------+
//! ```
//!
//! - [`ByteReader`] - bounds-checked little-endian cursor
//! - [`Container`] - envelope parsing and payload inflation
//! - [`SectionStream`] - section iteration with unknown-section skipping
//! - [`writer`] - the matching encoder

mod constants;
mod container;
mod reader;
mod section;
pub mod writer;

pub use constants::*;
pub use container::{CompressionInfo, Container, ContainerHeader};
pub use reader::ByteReader;
pub use section::{AnimSection, Dispatch, ModelSection, SectionHeader, SectionStream, WorldSection};
pub use writer::{
    encode_anim, encode_anim_payload, encode_model, encode_model_payload, encode_world,
    encode_world_payload, ByteWriter, ContainerWriter,
};
