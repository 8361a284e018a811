use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Playback looping policy of a baked clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WrapMode {
    /// Clamp at the last frame.
    #[default]
    Once,
    /// Wrap modulo the clip length.
    Loop,
}

/// Discrete event fired when playback enters `frame_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimEvent {
    pub frame_index: usize,
    pub event_id: i32,
}

/// Root-bone displacement of one frame, relative to the clip's first frame.
///
/// The translation is stored as a direction relative to the owner's forward
/// axis plus a length, so it can be re-applied along whatever direction the
/// instance faces at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootMotionDelta {
    /// Rotation taking the bake-time forward axis onto the displacement direction
    pub position_rotation: Quat,
    /// Displacement distance
    pub position_length: f32,
    /// Root rotation relative to the reference rotation
    pub rotation: Quat,
}

impl Default for RootMotionDelta {
    fn default() -> Self {
        Self {
            position_rotation: Quat::IDENTITY,
            position_length: 0.0,
            rotation: Quat::IDENTITY,
        }
    }
}

impl RootMotionDelta {
    /// Displacement in world space for an owner currently facing `forward`.
    #[inline]
    #[must_use]
    pub fn offset(&self, forward: Vec3) -> Vec3 {
        self.position_rotation * forward * self.position_length
    }
}

/// One sampled pose: a skinning matrix per bone plus its root-motion delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub matrices: Vec<Mat4>,
    pub root_motion: RootMotionDelta,
}

impl Frame {
    /// Inverse of the root bone's skinning matrix; cancels the baked root
    /// displacement when root motion drives the transform instead.
    #[must_use]
    pub fn root_motion_inverse(&self, root_bone_index: usize) -> Mat4 {
        self.matrices
            .get(root_bone_index)
            .map_or(Mat4::IDENTITY, Mat4::inverse)
    }
}

/// A clip after baking: every frame sampled, ready to be packed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakedClip {
    pub name: String,
    /// Length in seconds
    pub length: f32,
    pub frame_rate: u32,
    pub wrap_mode: WrapMode,
    pub frames: Vec<Frame>,
    /// First texel of this clip inside the shared bone texture
    pub pixel_segmentation: u32,
    pub root_motion_enabled: bool,
    /// Sorted by frame index
    pub events: Vec<AnimEvent>,
}

impl BakedClip {
    /// `round(length * frame_rate)`
    #[must_use]
    pub fn expected_frame_count(length: f32, frame_rate: u32) -> usize {
        (length * frame_rate as f32).round().max(0.0) as usize
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    #[must_use]
    pub fn last_frame_index(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    #[inline]
    #[must_use]
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Frame shown at `time` seconds.
    ///
    /// `floor(time * rate) mod frame_count`, except that exactly `time ==
    /// length` maps to the last frame instead of rolling over to 0.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn frame_index_at(&self, time: f32) -> usize {
        let count = self.frame_count();
        if count == 0 {
            return 0;
        }
        if time == self.length {
            return count - 1;
        }
        let raw = (time.max(0.0) * self.frame_rate as f32).floor() as usize;
        raw % count
    }

    /// Events of every frame entered when playback moves from `previous` to
    /// `current`. `previous == None` means playback just started; a `current`
    /// below `previous` means the clip wrapped.
    pub fn events_between(
        &self,
        previous: Option<usize>,
        current: usize,
    ) -> impl Iterator<Item = &AnimEvent> + '_ {
        let entered = move |frame: usize| match previous {
            None => frame <= current,
            Some(p) if p < current => frame > p && frame <= current,
            Some(p) if p > current => frame > p || frame <= current,
            Some(_) => false,
        };
        self.events.iter().filter(move |e| entered(e.frame_index))
    }
}
