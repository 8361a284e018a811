use crate::animation::values::Interpolatable;
use crate::errors::{GpuSkinError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    Step,
    CubicSpline,
}

const MAX_SCAN_OFFSET: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// Keyframe curve of one animated property.
///
/// Construction guarantees at least one keyframe and a value count that
/// matches the interpolation mode, so sampling never fails.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    times: Vec<f32>,
    values: Vec<T>, // For CubicSpline, length is times.len() * 3
    interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Result<Self> {
        if times.is_empty() {
            return Err(GpuSkinError::PoseSource("keyframe track has no keys".into()));
        }
        let expected = match interpolation {
            InterpolationMode::CubicSpline => times.len() * 3,
            _ => times.len(),
        };
        if values.len() != expected {
            return Err(GpuSkinError::PoseSource(format!(
                "keyframe track has {} values for {} keys ({interpolation:?} expects {expected})",
                values.len(),
                times.len()
            )));
        }
        Ok(Self {
            times,
            values,
            interpolation,
        })
    }

    #[inline]
    #[must_use]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[inline]
    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    /// Time of the last keyframe.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn sample(&self, time: f32) -> T {
        // partition_point finds the first index where t > time, i.e. next_index
        let next_idx = self.times.partition_point(|&t| t <= time);
        self.sample_at_frame(next_idx.saturating_sub(1), time)
    }

    /// Samples with a cursor remembering the last keyframe interval.
    ///
    /// Baking walks time forward, so the interval is almost always found by a
    /// short linear scan; anything else falls back to binary search.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> T {
        let len = self.times.len();
        if len == 1 {
            return self.get_value_at(0);
        }

        let i = cursor.last_index.min(len - 1);
        let t_curr = self.times[i];

        let found_index = if time >= t_curr {
            // Forward scan
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    if time >= self.times[len - 1] {
                        res = Some(len - 1);
                    }
                    break;
                }
                if time < self.times[idx + 1] {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            // Backward scan
            let mut res = None;
            for offset in 1..=MAX_SCAN_OFFSET {
                if i < offset {
                    break;
                }
                let idx = i - offset;
                if time >= self.times[idx] {
                    res = Some(idx);
                    break;
                }
            }
            res
        };

        let final_index = found_index.unwrap_or_else(|| {
            // Large jump: global binary search
            let next_idx = self.times.partition_point(|&t| t <= time);
            next_idx.saturating_sub(1)
        });
        cursor.last_index = final_index;

        self.sample_at_frame(final_index, time)
    }

    /// For Linear/Step the index is used directly; CubicSpline stores
    /// `[in_tangent, value, out_tangent]` per key.
    fn get_value_at(&self, index: usize) -> T {
        match self.interpolation {
            InterpolationMode::CubicSpline => self.values[index * 3 + 1],
            _ => self.values[index],
        }
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> T {
        let len = self.times.len();
        if index >= len - 1 {
            return self.get_value_at(len - 1);
        }

        let next_idx = index + 1;
        let t0 = self.times[index];
        let t1 = self.times[next_idx];
        let dt = t1 - t0;

        let t = if dt > 1e-6 { (time - t0) / dt } else { 0.0 };
        let t = t.clamp(0.0, 1.0);

        match self.interpolation {
            InterpolationMode::Step => self.get_value_at(index),
            InterpolationMode::Linear => {
                T::interpolate_linear(self.get_value_at(index), self.get_value_at(next_idx), t)
            }
            InterpolationMode::CubicSpline => {
                let i_prev = index * 3;
                let i_next = next_idx * 3;

                let v0 = self.values[i_prev + 1];
                let out_tangent0 = self.values[i_prev + 2];
                let in_tangent1 = self.values[i_next];
                let v1 = self.values[i_next + 1];

                T::interpolate_cubic(v0, out_tangent0, in_tangent1, v1, t, dt)
            }
        }
    }
}
