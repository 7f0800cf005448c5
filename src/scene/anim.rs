//! Animation scene types.

use crate::util::{Quat, Vec3};

/// A keyframe: integer frame number and a value.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Key<T> {
    pub frame: i32,
    pub value: T,
}

impl<T> Key<T> {
    pub fn new(frame: i32, value: T) -> Self {
        Self { frame, value }
    }
}

pub type VectorKey = Key<Vec3>;
pub type QuatKey = Key<Quat>;
pub type FloatKey = Key<f32>;

/// Check if keys are in non-decreasing frame order.
pub fn is_frame_sorted<T>(keys: &[Key<T>]) -> bool {
    keys.windows(2).all(|w| w[0].frame <= w[1].frame)
}

/// Copy of `keys` stably sorted by frame.
pub fn sorted_by_frame<T: Copy>(keys: &[Key<T>]) -> Vec<Key<T>> {
    let mut sorted = keys.to_vec();
    sorted.sort_by_key(|k| k.frame);
    sorted
}

/// Keyframes of one bone, in decode order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Track {
    pub bone_name: String,
    /// Parent-relative translations, already scaled.
    pub position_keys: Vec<VectorKey>,
    pub rotation_keys: Vec<QuatKey>,
    pub scale_keys: Vec<VectorKey>,
}

impl Track {
    /// Check if every channel is frame-sorted.
    pub fn is_frame_sorted(&self) -> bool {
        is_frame_sorted(&self.position_keys)
            && is_frame_sorted(&self.rotation_keys)
            && is_frame_sorted(&self.scale_keys)
    }

    /// Copy of this track with every channel sorted by frame.
    pub fn sorted_by_frame(&self) -> Self {
        Self {
            bone_name: self.bone_name.clone(),
            position_keys: sorted_by_frame(&self.position_keys),
            rotation_keys: sorted_by_frame(&self.rotation_keys),
            scale_keys: sorted_by_frame(&self.scale_keys),
        }
    }
}

/// Named scalar channel not bound to a bone.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Curve {
    pub name: String,
    pub keys: Vec<FloatKey>,
}

/// Raw animation as decoded from a `UEANIM` payload.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AnimData {
    pub num_frames: i32,
    pub frames_per_second: f32,
    pub tracks: Vec<Track>,
    pub curves: Vec<Curve>,
}

impl AnimData {
    /// Length in seconds; zero when the frame rate is not positive.
    pub fn duration_seconds(&self) -> f32 {
        if self.frames_per_second > 0.0 {
            self.num_frames as f32 / self.frames_per_second
        } else {
            0.0
        }
    }

    /// Track for a bone, compared case-insensitively.
    pub fn track(&self, bone_name: &str) -> Option<&Track> {
        let wanted = bone_name.to_lowercase();
        self.tracks
            .iter()
            .find(|t| t.bone_name.to_lowercase() == wanted)
    }

    /// Curve by exact name.
    pub fn curve(&self, name: &str) -> Option<&Curve> {
        self.curves.iter().find(|c| c.name == name)
    }
}

/// Track mapped onto a target skeleton with world-space values.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RetargetedTrack {
    pub bone_index: usize,
    pub bone_name: String,
    /// World translation per position key; empty in rotation-only mode.
    pub translations: Vec<VectorKey>,
    /// World rotation per rotation key.
    pub rotations: Vec<QuatKey>,
    /// Scale per scale key, passed through; empty in rotation-only mode.
    pub scales: Vec<VectorKey>,
}

/// Decoded animation container.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AnimScene {
    pub name: String,
    pub data: AnimData,
    /// Filled when a target skeleton was supplied at decode time.
    pub retargeted: Vec<RetargetedTrack>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_sorting() {
        let keys = vec![Key::new(5, 1.0f32), Key::new(0, 2.0), Key::new(5, 3.0)];
        assert!(!is_frame_sorted(&keys));

        let sorted = sorted_by_frame(&keys);
        assert!(is_frame_sorted(&sorted));
        // Stable: equal frames keep decode order.
        assert_eq!(sorted.iter().map(|k| k.value).collect::<Vec<_>>(), vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn test_duration() {
        let anim = AnimData { num_frames: 60, frames_per_second: 30.0, ..Default::default() };
        assert_eq!(anim.duration_seconds(), 2.0);

        let anim = AnimData { num_frames: 60, frames_per_second: 0.0, ..Default::default() };
        assert_eq!(anim.duration_seconds(), 0.0);
    }

    #[test]
    fn test_track_lookup_case_insensitive() {
        let anim = AnimData {
            tracks: vec![Track { bone_name: "Pelvis".into(), ..Default::default() }],
            ..Default::default()
        };
        assert!(anim.track("pelvis").is_some());
        assert!(anim.track("spine").is_none());
    }
}
