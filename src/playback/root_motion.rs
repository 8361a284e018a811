use glam::Vec3;

use crate::animation::{BakedClip, WrapMode};

/// Turns baked per-frame root displacement into world translation.
///
/// Baked deltas are cumulative from the clip's first frame, so the
/// accumulator remembers how much of the current cycle it has already
/// applied and only hands out the difference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootMotionAccumulator {
    tracked_frame: Option<usize>,
    applied: Vec3,
}

impl RootMotionAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the tracked frame; the next advance starts a fresh cycle.
    pub fn reset(&mut self) {
        self.tracked_frame = None;
        self.applied = Vec3::ZERO;
    }

    #[inline]
    #[must_use]
    pub fn tracked_frame(&self) -> Option<usize> {
        self.tracked_frame
    }

    /// World translation to apply for playback that moved to `frame_index`
    /// during a tick of `dt` seconds, for an owner facing `forward`.
    ///
    /// Once clips apply displacement only when the frame index changes. Loop
    /// clips walk every frame passed since the last call, wrapping through
    /// the end of the clip, so large ticks never skip displacement.
    pub fn advance(&mut self, clip: &BakedClip, frame_index: usize, dt: f32, forward: Vec3) -> Vec3 {
        let count = clip.frame_count();
        if count == 0 {
            return Vec3::ZERO;
        }
        let frame_index = frame_index.min(count - 1);

        match clip.wrap_mode {
            WrapMode::Once => self.advance_once(clip, frame_index, forward),
            WrapMode::Loop => self.advance_loop(clip, frame_index, dt, forward),
        }
    }

    fn advance_once(&mut self, clip: &BakedClip, frame_index: usize, forward: Vec3) -> Vec3 {
        if self.tracked_frame == Some(frame_index) {
            return Vec3::ZERO;
        }
        let target = clip.frames[frame_index].root_motion.offset(forward);
        let delta = target - self.applied;
        self.applied = target;
        self.tracked_frame = Some(frame_index);
        delta
    }

    fn advance_loop(&mut self, clip: &BakedClip, frame_index: usize, dt: f32, forward: Vec3) -> Vec3 {
        let count = clip.frame_count();
        let last = count - 1;
        let start = self.tracked_frame.unwrap_or(0);

        // Frames passed by index alone, plus whole cycles the index can't show
        let index_steps = (frame_index + count - start) % count;
        let elapsed = (dt.max(0.0) * clip.frame_rate as f32).floor() as usize;
        let cycles = if elapsed > index_steps {
            ((elapsed - index_steps) as f32 / count as f32).round() as usize
        } else {
            0
        };
        let steps = index_steps + cycles * count;

        let mut total = Vec3::ZERO;
        let mut current = start;
        for _ in 0..steps {
            let next = (current + 1) % count;
            if next == 0 {
                // Finish the cycle at the last frame, then start over
                total += clip.frames[last].root_motion.offset(forward) - self.applied;
                self.applied = Vec3::ZERO;
            } else {
                let target = clip.frames[next].root_motion.offset(forward);
                total += target - self.applied;
                self.applied = target;
            }
            current = next;
        }

        self.tracked_frame = Some(frame_index);
        total
    }
}
