//! `UEANIM` decoding and retargeting onto a resolved skeleton.

use crate::core::DecodeOptions;
use crate::format::{AnimSection, ByteReader, Container, ContainerKind, Dispatch, SectionStream};
use crate::scene::{
    AnimData, AnimScene, Curve, FloatKey, Key, QuatKey, RetargetedTrack, Skeleton, Track,
    VectorKey,
};
use crate::util::{rotation_of, Error, Result};

/// Decoder for animation payloads.
#[derive(Clone, Copy, Debug)]
pub struct AnimDecoder<'o> {
    options: &'o DecodeOptions,
}

impl<'o> AnimDecoder<'o> {
    pub fn new(options: &'o DecodeOptions) -> Self {
        Self { options }
    }

    /// Decode a parsed animation container without retargeting.
    pub fn decode(&self, container: &Container<'_>) -> Result<AnimScene> {
        if container.kind() != ContainerKind::Anim {
            return Err(Error::envelope(format!(
                "expected {} container, found {}",
                ContainerKind::Anim,
                container.kind()
            )));
        }
        let mut reader = container.reader();
        let data = self.read_data(&mut reader)?;
        Ok(AnimScene { name: container.object_name().to_string(), data, retargeted: Vec::new() })
    }

    /// Decode and retarget onto `skeleton`.
    pub fn decode_onto(&self, container: &Container<'_>, skeleton: &Skeleton) -> Result<AnimScene> {
        let mut scene = self.decode(container)?;
        scene.retargeted = retarget(&scene.data, skeleton, self.options);
        Ok(scene)
    }

    /// Read the frame header and all sections of an animation payload.
    pub fn read_data(&self, reader: &mut ByteReader<'_>) -> Result<AnimData> {
        let scale = self.options.scale;
        let mut data = AnimData {
            num_frames: reader.read_i32()?,
            frames_per_second: reader.read_f32()?,
            ..Default::default()
        };

        let sections = SectionStream::new(reader, ContainerKind::Anim).for_each(|r, header| {
            match AnimSection::from_name(&header.name) {
                AnimSection::Tracks => {
                    data.tracks = r.read_array(header.element_count, |r| {
                        Ok(Track {
                            bone_name: r.read_fstring()?,
                            position_keys: r.read_bulk_array(|r| read_vector_key(r, scale))?,
                            rotation_keys: r.read_bulk_array(read_quat_key)?,
                            scale_keys: r.read_bulk_array(|r| read_vector_key(r, 1.0))?,
                        })
                    })?;
                }
                AnimSection::Curves => {
                    data.curves = r.read_array(header.element_count, |r| {
                        Ok(Curve { name: r.read_fstring()?, keys: r.read_bulk_array(read_float_key)? })
                    })?;
                }
                AnimSection::Unknown(_) => return Ok(Dispatch::Skipped),
            }
            Ok(Dispatch::Consumed)
        })?;

        tracing::debug!(
            sections,
            frames = data.num_frames,
            fps = data.frames_per_second,
            tracks = data.tracks.len(),
            curves = data.curves.len(),
            "read animation sections"
        );
        Ok(data)
    }
}

fn read_vector_key(r: &mut ByteReader<'_>, scale: f32) -> Result<VectorKey> {
    let frame = r.read_i32()?;
    Ok(Key::new(frame, r.read_vec3()? * scale))
}

fn read_quat_key(r: &mut ByteReader<'_>) -> Result<QuatKey> {
    let frame = r.read_i32()?;
    Ok(Key::new(frame, r.read_quat()?))
}

fn read_float_key(r: &mut ByteReader<'_>) -> Result<FloatKey> {
    let frame = r.read_i32()?;
    Ok(Key::new(frame, r.read_f32()?))
}

/// Map every track onto `skeleton`, composing keys with the parent's world
/// transform.
///
/// Translation keys become `parent_world × value` and rotation keys become
/// `parent_rotation × value` for bones with a parent; root bones keep the
/// raw values. Scale keys pass through. With
/// [`DecodeOptions::rotation_only`] only rotations are emitted. Tracks whose
/// bone is not in the skeleton are dropped.
pub fn retarget(anim: &AnimData, skeleton: &Skeleton, options: &DecodeOptions) -> Vec<RetargetedTrack> {
    let mut out = Vec::with_capacity(anim.tracks.len());

    for track in &anim.tracks {
        let Some(bone_index) = skeleton.find(&track.bone_name) else {
            tracing::warn!(bone = %track.bone_name, "animated bone not in skeleton; track dropped");
            continue;
        };
        let parent_world = skeleton.parent(bone_index).and_then(|p| skeleton.world_matrix(p));

        let rotations = track
            .rotation_keys
            .iter()
            .map(|k| match parent_world {
                Some(parent) => Key::new(k.frame, rotation_of(parent) * k.value),
                None => *k,
            })
            .collect();

        let (translations, scales) = if options.rotation_only {
            (Vec::new(), Vec::new())
        } else {
            let translations = track
                .position_keys
                .iter()
                .map(|k| match parent_world {
                    Some(parent) => Key::new(k.frame, parent.transform_point3(k.value)),
                    None => *k,
                })
                .collect();
            (translations, track.scale_keys.clone())
        };

        out.push(RetargetedTrack {
            bone_index,
            bone_name: skeleton.bones()[bone_index].name.clone(),
            translations,
            rotations,
            scales,
        });
    }

    tracing::trace!(tracks = out.len(), rotation_only = options.rotation_only, "retargeted animation");
    out
}

impl AnimScene {
    /// Retarget this animation onto a resolved skeleton.
    pub fn retarget(&self, skeleton: &Skeleton, options: &DecodeOptions) -> Vec<RetargetedTrack> {
        retarget(&self.data, skeleton, options)
    }
}
