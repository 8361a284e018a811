use glam::{Quat, Vec3};

use crate::animation::binding::TargetPath;
use crate::animation::tracks::KeyframeTrack;

#[derive(Debug, Clone)]
pub struct TrackMeta {
    pub bone_name: String,
    pub target: TargetPath,
}

#[derive(Debug, Clone)]
pub enum TrackData {
    Vector3(KeyframeTrack<Vec3>),
    Quaternion(KeyframeTrack<Quat>),
}

impl TrackData {
    #[must_use]
    pub fn end_time(&self) -> f32 {
        match self {
            TrackData::Vector3(track) => track.end_time(),
            TrackData::Quaternion(track) => track.end_time(),
        }
    }
}

/// Track definition: which bone property it drives, plus its keys
#[derive(Debug, Clone)]
pub struct Track {
    pub meta: TrackMeta,
    pub data: TrackData,
}

impl Track {
    #[must_use]
    pub fn translation(bone_name: &str, track: KeyframeTrack<Vec3>) -> Self {
        Self::new(bone_name, TargetPath::Translation, TrackData::Vector3(track))
    }

    #[must_use]
    pub fn rotation(bone_name: &str, track: KeyframeTrack<Quat>) -> Self {
        Self::new(bone_name, TargetPath::Rotation, TrackData::Quaternion(track))
    }

    #[must_use]
    pub fn scale(bone_name: &str, track: KeyframeTrack<Vec3>) -> Self {
        Self::new(bone_name, TargetPath::Scale, TrackData::Vector3(track))
    }

    fn new(bone_name: &str, target: TargetPath, data: TrackData) -> Self {
        Self {
            meta: TrackMeta {
                bone_name: bone_name.to_string(),
                target,
            },
            data,
        }
    }
}

/// Authoring-side clip: keyframe curves that a bake samples into frames.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub frame_rate: u32,
    pub looping: bool,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Duration is the time of the latest keyframe over all tracks.
    #[must_use]
    pub fn new(name: &str, frame_rate: u32, tracks: Vec<Track>) -> Self {
        let duration = tracks
            .iter()
            .map(|t| t.data.end_time())
            .fold(0.0_f32, f32::max);

        Self {
            name: name.to_string(),
            duration,
            frame_rate,
            looping: false,
            tracks,
        }
    }

    #[must_use]
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}
