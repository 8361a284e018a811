use crate::animation::{AnimEvent, AnimationDataset, BakedClip, DatasetId, WrapMode};
use crate::bake::pose::PoseSource;
use crate::bake::sampler::FrameSampler;
use crate::errors::{GpuSkinError, Result};
use crate::settings::BakeSettings;
use crate::skeleton::{LocalTransform, Skeleton};
use crate::texture::layout::TextureLayout;

/// What to bake for one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipBakeRequest {
    pub name: String,
    /// Index of the clip inside the pose source
    pub source_clip: usize,
    pub length: f32,
    pub frame_rate: u32,
    pub wrap_mode: WrapMode,
    pub root_motion: bool,
    pub events: Vec<AnimEvent>,
}

impl ClipBakeRequest {
    #[must_use]
    pub fn new(name: &str, source_clip: usize, length: f32, frame_rate: u32) -> Self {
        Self {
            name: name.to_string(),
            source_clip,
            length,
            frame_rate,
            wrap_mode: WrapMode::Once,
            root_motion: false,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn wrap_mode(mut self, wrap_mode: WrapMode) -> Self {
        self.wrap_mode = wrap_mode;
        self
    }

    #[must_use]
    pub fn root_motion(mut self, enabled: bool) -> Self {
        self.root_motion = enabled;
        self
    }

    #[must_use]
    pub fn event(mut self, frame_index: usize, event_id: i32) -> Self {
        self.events.push(AnimEvent {
            frame_index,
            event_id,
        });
        self
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> usize {
        BakedClip::expected_frame_count(self.length, self.frame_rate)
    }

    /// Clip time of frame `index`, evenly spaced over the clip length.
    #[inline]
    #[must_use]
    pub fn frame_time(&self, index: usize) -> f32 {
        self.length * (index as f32 / self.frame_count() as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakeProgress {
    /// Frame `frame` of clip `clip` was just sampled.
    Sampled {
        clip: usize,
        frame: usize,
        total_frames: usize,
    },
    /// Every requested frame has been sampled; `finish` may be called.
    Done,
}

/// Incremental bake of a set of clips against one skeleton.
///
/// Each [`Baker::step`] poses the source and samples exactly one frame, so the
/// host can interleave it with whatever pose evaluation it has to wait for.
/// Nothing is published until [`Baker::finish`]; dropping or aborting a baker
/// discards every sampled frame.
pub struct Baker {
    name: String,
    settings: BakeSettings,
    skeleton: Skeleton,
    root_bone_index: usize,
    requests: Vec<ClipBakeRequest>,

    // === Progress ===
    clip_cursor: usize,
    frame_cursor: usize,
    locals: Vec<LocalTransform>,
    sampler: FrameSampler,
    finished: Vec<BakedClip>,
}

impl Baker {
    pub fn new(
        name: &str,
        skeleton: Skeleton,
        requests: Vec<ClipBakeRequest>,
        settings: BakeSettings,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(GpuSkinError::MissingInput("dataset name"));
        }
        if skeleton.is_empty() {
            return Err(GpuSkinError::MissingInput("bone hierarchy"));
        }
        if requests.is_empty() {
            return Err(GpuSkinError::MissingInput("animation clips"));
        }
        for (index, request) in requests.iter().enumerate() {
            if requests[..index].iter().any(|r| r.name == request.name) {
                return Err(GpuSkinError::DuplicateClip(request.name.clone()));
            }
            if request.frame_count() == 0 {
                return Err(GpuSkinError::EmptyClip {
                    name: request.name.clone(),
                    length: request.length,
                    frame_rate: request.frame_rate,
                });
            }
        }

        log::info!(
            "Baking '{}': {} clips, {} bones",
            name,
            requests.len(),
            skeleton.len()
        );

        // Bones are collected depth-first from the root bone.
        let root_bone_index = 0;
        let locals = vec![LocalTransform::IDENTITY; skeleton.len()];
        Ok(Self {
            name: name.to_string(),
            settings,
            skeleton,
            root_bone_index,
            requests,
            clip_cursor: 0,
            frame_cursor: 0,
            locals,
            sampler: FrameSampler::new(root_bone_index, settings.owner_forward),
            finished: Vec::new(),
        })
    }

    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.clip_cursor >= self.requests.len()
    }

    /// Poses the source for the next frame and samples it.
    pub fn step<P: PoseSource + ?Sized>(&mut self, source: &mut P) -> Result<BakeProgress> {
        let Some(request) = self.requests.get(self.clip_cursor) else {
            return Ok(BakeProgress::Done);
        };

        let total_frames = request.frame_count();
        let frame = self.frame_cursor;
        let time = request.frame_time(frame);

        source.pose(request.source_clip, time, &mut self.locals)?;
        self.sampler.sample(&self.skeleton, &self.locals)?;
        self.frame_cursor += 1;

        let progress = BakeProgress::Sampled {
            clip: self.clip_cursor,
            frame,
            total_frames,
        };

        if self.frame_cursor == total_frames {
            self.complete_clip();
        }

        Ok(progress)
    }

    /// Steps until every frame is sampled, then finishes into a new dataset.
    pub fn run<P: PoseSource + ?Sized>(mut self, source: &mut P) -> Result<AnimationDataset> {
        while self.step(source)? != BakeProgress::Done {}
        self.finish(None)
    }

    /// Publishes the baked clips as a dataset.
    ///
    /// With `base`, clips named like a freshly baked one are replaced, other
    /// base clips are kept and the base identity is reused. The texture layout
    /// is recomputed for the merged clip list.
    pub fn finish(self, base: Option<&AnimationDataset>) -> Result<AnimationDataset> {
        if let Some(request) = self.requests.get(self.clip_cursor) {
            return Err(GpuSkinError::BakeIncomplete {
                clip: request.name.clone(),
                sampled: self.frame_cursor,
                expected: request.frame_count(),
            });
        }

        let (id, mut clips) = match base {
            Some(base) if base.skeleton == self.skeleton => (base.id, base.clips.clone()),
            Some(base) => {
                log::warn!(
                    "Dataset '{}' was baked with a different skeleton; previous clips dropped",
                    base.name
                );
                (base.id, Vec::new())
            }
            None => (DatasetId::new(), Vec::new()),
        };

        for clip in self.finished {
            if let Some(existing) = clips.iter_mut().find(|c| c.name == clip.name) {
                *existing = clip;
            } else {
                clips.push(clip);
            }
        }

        let layout = TextureLayout::assign(&mut clips, self.skeleton.len())?;
        log::info!(
            "Baked '{}': {} clips, {} texels, texture {}x{}",
            self.name,
            clips.len(),
            layout.total_pixels,
            layout.width,
            layout.height
        );

        Ok(AnimationDataset {
            id,
            name: self.name,
            skeleton: self.skeleton,
            clips,
            texture_width: layout.width,
            texture_height: layout.height,
            root_bone_index: self.root_bone_index,
            root_transform_matrix: self.settings.root_transform_matrix,
        })
    }

    /// Discards everything sampled so far.
    pub fn abort(self) {
        log::info!(
            "Bake of '{}' aborted after {} complete clips",
            self.name,
            self.finished.len()
        );
    }

    fn complete_clip(&mut self) {
        let request = &self.requests[self.clip_cursor];
        let sampler = std::mem::replace(
            &mut self.sampler,
            FrameSampler::new(self.root_bone_index, self.settings.owner_forward),
        );

        let mut events = request.events.clone();
        events.sort_by_key(|e| e.frame_index);

        log::debug!(
            "Clip '{}' sampled: {} frames at {} fps",
            request.name,
            sampler.len(),
            request.frame_rate
        );

        self.finished.push(BakedClip {
            name: request.name.clone(),
            length: request.length,
            frame_rate: request.frame_rate,
            wrap_mode: request.wrap_mode,
            frames: sampler.into_frames(),
            pixel_segmentation: 0,
            root_motion_enabled: request.root_motion,
            events,
        });

        self.clip_cursor += 1;
        self.frame_cursor = 0;
    }
}
