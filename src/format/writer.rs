//! UEFormat container writer.
//!
//! Produces containers the decoders read back: the envelope, optional
//! payload compression, and the section layouts of all three kinds. Values
//! are written exactly as given; no scale factor is applied.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use super::constants::*;
use crate::core::{compress, CompressionAlgorithm};
use crate::scene::{AnimData, ModelData, WorldData};
use crate::util::{Error, Quat, Result, Vec2, Vec3};

/// Default compression level handed to the codec.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 6;

/// Little-endian output buffer.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current write position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.buf.len()
    }

    /// Consume the writer and return the bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(data);
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.buf.write_u8(value)?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.buf.write_u16::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.buf.write_i32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.buf.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.buf.write_f32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write a length or count as i32.
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len)
            .map_err(|_| Error::invalid(format!("length {len} does not fit in i32")))?;
        self.write_i32(len)
    }

    /// Write an i32 length followed by the UTF-8 bytes.
    pub fn write_fstring(&mut self, value: &str) -> Result<()> {
        self.write_len(value.len())?;
        self.write_bytes(value.as_bytes())
    }

    pub fn write_vec2(&mut self, v: Vec2) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)
    }

    pub fn write_vec3(&mut self, v: Vec3) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)?;
        self.write_f32(v.z)
    }

    /// Write a quaternion as `x, y, z, w`.
    pub fn write_quat(&mut self, q: Quat) -> Result<()> {
        for c in q.to_array() {
            self.write_f32(c)?;
        }
        Ok(())
    }

    /// Write an i32 count followed by each element.
    pub fn write_bulk_array<T, F>(&mut self, items: &[T], mut write: F) -> Result<()>
    where
        F: FnMut(&mut Self, &T) -> Result<()>,
    {
        self.write_len(items.len())?;
        for item in items {
            write(self, item)?;
        }
        Ok(())
    }

    /// Write a section header and body; the byte size is patched in after `body` runs.
    pub fn section<F>(&mut self, name: &str, element_count: usize, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.write_fstring(name)?;
        self.write_len(element_count)?;
        let size_pos = self.pos();
        self.write_i32(0)?;

        let body_start = self.pos();
        body(self)?;
        let size = i32::try_from(self.pos() - body_start)
            .map_err(|_| Error::invalid(format!("section {name} exceeds i32 size")))?;
        LittleEndian::write_i32(&mut self.buf[size_pos..size_pos + 4], size);
        Ok(())
    }

    /// Write a section with an opaque body.
    pub fn raw_section(&mut self, name: &str, element_count: usize, body: &[u8]) -> Result<()> {
        self.section(name, element_count, |w| w.write_bytes(body))
    }
}

/// Compression block written verbatim.
#[derive(Clone, Debug)]
struct RawCompressionHeader {
    algorithm: String,
    uncompressed_size: u32,
    compressed_size: u32,
}

/// Wraps a section payload in a container envelope.
#[derive(Clone, Debug)]
pub struct ContainerWriter {
    kind: ContainerKind,
    object_name: String,
    version: u8,
    compression: Option<CompressionAlgorithm>,
    level: i32,
    raw_header: Option<RawCompressionHeader>,
}

impl ContainerWriter {
    /// Uncompressed container of the given kind.
    pub fn new(kind: ContainerKind, object_name: impl Into<String>) -> Self {
        Self {
            kind,
            object_name: object_name.into(),
            version: CURRENT_VERSION,
            compression: None,
            level: DEFAULT_COMPRESSION_LEVEL,
            raw_header: None,
        }
    }

    /// Compress the payload with `algorithm`.
    pub fn compressed(mut self, algorithm: CompressionAlgorithm) -> Self {
        self.compression = Some(algorithm);
        self
    }

    /// Optionally compress the payload.
    pub fn compression(mut self, algorithm: Option<CompressionAlgorithm>) -> Self {
        self.compression = algorithm;
        self
    }

    /// Codec compression level.
    pub fn level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Format version byte.
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Write the given compression block and then the payload untouched.
    ///
    /// Produces containers naming codecs this crate cannot encode.
    pub fn raw_compression_header(
        mut self,
        algorithm: impl Into<String>,
        uncompressed_size: u32,
        compressed_size: u32,
    ) -> Self {
        self.raw_header = Some(RawCompressionHeader {
            algorithm: algorithm.into(),
            uncompressed_size,
            compressed_size,
        });
        self
    }

    /// Assemble the container bytes around `payload`.
    pub fn finish(self, payload: Vec<u8>) -> Result<Vec<u8>> {
        let mut w = ByteWriter::new();
        w.write_bytes(MAGIC)?;
        w.write_fstring(self.kind.identifier())?;
        w.write_u8(self.version)?;
        w.write_fstring(&self.object_name)?;

        if let Some(raw) = &self.raw_header {
            w.write_bool(true)?;
            w.write_fstring(&raw.algorithm)?;
            w.write_u32(raw.uncompressed_size)?;
            w.write_u32(raw.compressed_size)?;
            w.write_bytes(&payload)?;
            return Ok(w.into_inner());
        }

        match self.compression {
            None => {
                w.write_bool(false)?;
                w.write_bytes(&payload)?;
            }
            Some(algorithm) => {
                let compressed = compress(algorithm, &payload, self.level)?;
                w.write_bool(true)?;
                w.write_fstring(algorithm.as_str())?;
                w.write_u32(size_u32(payload.len())?)?;
                w.write_u32(size_u32(compressed.len())?)?;
                w.write_bytes(&compressed)?;
            }
        }
        Ok(w.into_inner())
    }
}

fn size_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::invalid(format!("payload of {len} bytes exceeds u32")))
}

// ============================================================================
// Payload encoders
// ============================================================================

/// Encode the section payload of a model.
pub fn encode_model_payload(model: &ModelData) -> Result<Vec<u8>> {
    let mut w = ByteWriter::new();

    if !model.vertices.is_empty() {
        w.section(SECTION_VERTICES, model.vertices.len(), |w| {
            model.vertices.iter().try_for_each(|&v| w.write_vec3(v))
        })?;
    }
    if !model.indices.is_empty() {
        w.section(SECTION_INDICES, model.indices.len() * 3, |w| {
            model.indices.iter().flatten().try_for_each(|&i| w.write_u32(i))
        })?;
    }
    if !model.normals.is_empty() {
        w.section(SECTION_NORMALS, model.normals.len(), |w| {
            model.normals.iter().try_for_each(|&v| w.write_vec3(v))
        })?;
    }
    if !model.tangents.is_empty() {
        w.section(SECTION_TANGENTS, model.tangents.len(), |w| {
            model.tangents.iter().try_for_each(|&v| w.write_vec3(v))
        })?;
    }
    if !model.colors.is_empty() {
        w.section(SECTION_VERTEX_COLORS, model.colors.len(), |w| {
            model.colors.iter().try_for_each(|c| w.write_bytes(c))
        })?;
    }
    if !model.uvs.is_empty() {
        w.section(SECTION_TEXCOORDS, model.uvs.len(), |w| {
            model
                .uvs
                .iter()
                .try_for_each(|channel| w.write_bulk_array(channel, |w, &uv| w.write_vec2(uv)))
        })?;
    }
    if !model.materials.is_empty() {
        w.section(SECTION_MATERIALS, model.materials.len(), |w| {
            model.materials.iter().try_for_each(|m| {
                w.write_fstring(&m.name)?;
                w.write_u32(m.first_index)?;
                w.write_u32(m.face_count)
            })
        })?;
    }
    if !model.weights.is_empty() {
        w.section(SECTION_WEIGHTS, model.weights.len(), |w| {
            model.weights.iter().try_for_each(|wt| {
                w.write_u16(wt.bone_index)?;
                w.write_u32(wt.vertex_index)?;
                w.write_f32(wt.weight)
            })
        })?;
    }
    if !model.bones.is_empty() {
        w.section(SECTION_BONES, model.bones.len(), |w| {
            model.bones.iter().try_for_each(|b| {
                w.write_fstring(&b.name)?;
                w.write_i32(b.parent_index)?;
                w.write_vec3(b.position)?;
                w.write_quat(b.rotation)
            })
        })?;
    }
    if !model.morph_targets.is_empty() {
        w.section(SECTION_MORPH_TARGETS, model.morph_targets.len(), |w| {
            model.morph_targets.iter().try_for_each(|m| {
                w.write_fstring(&m.name)?;
                w.write_bulk_array(&m.deltas, |w, d| {
                    w.write_vec3(d.position)?;
                    w.write_vec3(d.normal)?;
                    w.write_u32(d.vertex_index)
                })
            })
        })?;
    }
    if !model.sockets.is_empty() {
        w.section(SECTION_SOCKETS, model.sockets.len(), |w| {
            model.sockets.iter().try_for_each(|s| {
                w.write_fstring(&s.name)?;
                w.write_fstring(&s.parent_name)?;
                w.write_vec3(s.position)?;
                w.write_quat(s.rotation)?;
                w.write_vec3(s.scale)
            })
        })?;
    }

    Ok(w.into_inner())
}

/// Encode the payload of an animation: frame count, rate, then sections.
pub fn encode_anim_payload(anim: &AnimData) -> Result<Vec<u8>> {
    let mut w = ByteWriter::new();
    w.write_i32(anim.num_frames)?;
    w.write_f32(anim.frames_per_second)?;

    if !anim.tracks.is_empty() {
        w.section(SECTION_TRACKS, anim.tracks.len(), |w| {
            anim.tracks.iter().try_for_each(|t| {
                w.write_fstring(&t.bone_name)?;
                w.write_bulk_array(&t.position_keys, |w, k| {
                    w.write_i32(k.frame)?;
                    w.write_vec3(k.value)
                })?;
                w.write_bulk_array(&t.rotation_keys, |w, k| {
                    w.write_i32(k.frame)?;
                    w.write_quat(k.value)
                })?;
                w.write_bulk_array(&t.scale_keys, |w, k| {
                    w.write_i32(k.frame)?;
                    w.write_vec3(k.value)
                })
            })
        })?;
    }
    if !anim.curves.is_empty() {
        w.section(SECTION_CURVES, anim.curves.len(), |w| {
            anim.curves.iter().try_for_each(|c| {
                w.write_fstring(&c.name)?;
                w.write_bulk_array(&c.keys, |w, k| {
                    w.write_i32(k.frame)?;
                    w.write_f32(k.value)
                })
            })
        })?;
    }

    Ok(w.into_inner())
}

/// Encode the section payload of a world.
pub fn encode_world_payload(world: &WorldData) -> Result<Vec<u8>> {
    let mut w = ByteWriter::new();

    if !world.meshes.is_empty() {
        w.section(SECTION_MESHES, world.meshes.len(), |w| {
            world.meshes.iter().try_for_each(|m| {
                w.write_u32(m.hash)?;
                w.write_len(m.data.len())?;
                w.write_bytes(&m.data)
            })
        })?;
    }
    if !world.actors.is_empty() {
        w.section(SECTION_ACTORS, world.actors.len(), |w| {
            world.actors.iter().try_for_each(|a| {
                w.write_u32(a.mesh_hash)?;
                w.write_fstring(&a.name)?;
                w.write_vec3(a.position)?;
                w.write_vec3(a.rotation)?;
                w.write_vec3(a.scale)
            })
        })?;
    }

    Ok(w.into_inner())
}

/// Encode a complete model container.
pub fn encode_model(
    name: &str,
    model: &ModelData,
    compression: Option<CompressionAlgorithm>,
) -> Result<Vec<u8>> {
    ContainerWriter::new(ContainerKind::Model, name)
        .compression(compression)
        .finish(encode_model_payload(model)?)
}

/// Encode a complete animation container.
pub fn encode_anim(
    name: &str,
    anim: &AnimData,
    compression: Option<CompressionAlgorithm>,
) -> Result<Vec<u8>> {
    ContainerWriter::new(ContainerKind::Anim, name)
        .compression(compression)
        .finish(encode_anim_payload(anim)?)
}

/// Encode a complete world container.
pub fn encode_world(
    name: &str,
    world: &WorldData,
    compression: Option<CompressionAlgorithm>,
) -> Result<Vec<u8>> {
    ContainerWriter::new(ContainerKind::World, name)
        .compression(compression)
        .finish(encode_world_payload(world)?)
}
