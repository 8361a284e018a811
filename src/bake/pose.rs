use crate::animation::binder::Binder;
use crate::animation::binding::{BoneBinding, TargetPath};
use crate::animation::clip::{AnimationClip, TrackData};
use crate::animation::tracks::KeyframeCursor;
use crate::animation::WrapMode;
use crate::bake::baker::ClipBakeRequest;
use crate::errors::{GpuSkinError, Result};
use crate::skeleton::{LocalTransform, Skeleton};

/// Anything that can pose a bone hierarchy at a given clip time.
///
/// Implementations must be deterministic: posing the same clip at the same
/// time twice writes the same transforms. `locals` holds one entry per bone,
/// in skeleton order.
pub trait PoseSource {
    fn pose(&mut self, clip: usize, time: f32, locals: &mut [LocalTransform]) -> Result<()>;
}

struct BoundClip {
    clip: AnimationClip,
    bindings: Vec<BoneBinding>,
    cursors: Vec<KeyframeCursor>,
}

/// Pose source driven by keyframe tracks bound to bones by name.
///
/// Bones without a track hold their rest pose.
pub struct TrackPoseSource {
    rest_pose: Vec<LocalTransform>,
    clips: Vec<BoundClip>,
}

impl TrackPoseSource {
    #[must_use]
    pub fn new(skeleton: &Skeleton, clips: Vec<AnimationClip>) -> Self {
        let clips = clips
            .into_iter()
            .map(|clip| {
                let bindings = Binder::bind(skeleton, &clip);
                let cursors = vec![KeyframeCursor::default(); clip.tracks.len()];
                BoundClip {
                    clip,
                    bindings,
                    cursors,
                }
            })
            .collect();

        Self {
            rest_pose: skeleton.rest_pose(),
            clips,
        }
    }

    /// Replaces the pose untracked bones hold.
    pub fn with_rest_pose(mut self, rest_pose: Vec<LocalTransform>) -> Result<Self> {
        if rest_pose.len() != self.rest_pose.len() {
            return Err(GpuSkinError::PoseMismatch {
                expected: self.rest_pose.len(),
                actual: rest_pose.len(),
            });
        }
        self.rest_pose = rest_pose;
        Ok(self)
    }

    pub fn clips(&self) -> impl Iterator<Item = &AnimationClip> {
        self.clips.iter().map(|bound| &bound.clip)
    }

    /// One bake request per clip, using each clip's own rate and loop flag.
    #[must_use]
    pub fn bake_requests(&self) -> Vec<ClipBakeRequest> {
        self.clips()
            .enumerate()
            .map(|(index, clip)| {
                let wrap_mode = if clip.looping {
                    WrapMode::Loop
                } else {
                    WrapMode::Once
                };
                ClipBakeRequest::new(&clip.name, index, clip.duration, clip.frame_rate)
                    .wrap_mode(wrap_mode)
            })
            .collect()
    }
}

impl PoseSource for TrackPoseSource {
    fn pose(&mut self, clip: usize, time: f32, locals: &mut [LocalTransform]) -> Result<()> {
        if locals.len() != self.rest_pose.len() {
            return Err(GpuSkinError::PoseMismatch {
                expected: self.rest_pose.len(),
                actual: locals.len(),
            });
        }
        let bound = self
            .clips
            .get_mut(clip)
            .ok_or_else(|| GpuSkinError::PoseSource(format!("no source clip at index {clip}")))?;

        locals.copy_from_slice(&self.rest_pose);

        for binding in &bound.bindings {
            let track = &bound.clip.tracks[binding.track_index];
            let cursor = &mut bound.cursors[binding.track_index];
            let local = &mut locals[binding.bone_index];

            match (&track.data, binding.target) {
                (TrackData::Vector3(t), TargetPath::Translation) => {
                    local.translation = t.sample_with_cursor(time, cursor);
                }
                (TrackData::Vector3(t), TargetPath::Scale) => {
                    local.scale = t.sample_with_cursor(time, cursor);
                }
                (TrackData::Quaternion(t), TargetPath::Rotation) => {
                    local.rotation = t.sample_with_cursor(time, cursor);
                }
                _ => {
                    log::warn!(
                        "Track {} of clip '{}' has data that does not fit {:?}",
                        binding.track_index,
                        bound.clip.name,
                        binding.target
                    );
                }
            }
        }

        Ok(())
    }
}
