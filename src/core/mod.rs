//! Core layer - codecs and decode configuration.
//!
//! This module provides:
//! - [`CompressionAlgorithm`] with [`compress`] / [`decompress`] - payload codecs
//! - [`DecodeOptions`] / [`MeshInstancing`] - caller configuration

mod compression;
mod options;

pub use compression::{compress, decompress, CompressionAlgorithm, GZIP_NAME, ZSTD_NAME};
pub use options::{DecodeOptions, MeshInstancing, DEFAULT_BONE_LENGTH, DEFAULT_SCALE};
