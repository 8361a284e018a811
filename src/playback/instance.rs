use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Quat, Vec3};

use crate::animation::{AnimationDataset, BakedClip, WrapMode};
use crate::errors::Result;
use crate::playback::params::{CrossFadeParams, SkinDrawParams, SkinMaterialConstants, TickOutput};
use crate::playback::root_motion::RootMotionAccumulator;
use crate::settings::{CullingMode, PlaybackSettings};
use crate::texture::{BakedTexture, TextureRegistry};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a playback instance, used as the registry's
/// binding key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// One animated object: which clip plays, how far along it is, and where
/// root motion has moved it.
///
/// An instance does nothing until [`init`](Self::init) binds it to a dataset.
/// Time only advances through [`tick`](Self::tick).
#[derive(Debug)]
pub struct PlaybackInstance {
    id: InstanceId,
    settings: PlaybackSettings,

    dataset: Option<Arc<AnimationDataset>>,
    texture: Option<Arc<BakedTexture>>,

    playing_clip: Option<usize>,
    time: f32,
    is_playing: bool,

    last_played_clip: Option<usize>,
    last_played_time: f32,
    cross_fade_duration: f32,
    cross_fade_progress: f32,

    /// (clip, frame) of the last emitted draw parameters
    last_output: Option<(usize, usize)>,
    /// Last frame whose events were reported
    event_frame: Option<usize>,

    root_motion: RootMotionAccumulator,
    pub position: Vec3,
    pub rotation: Quat,
}

impl PlaybackInstance {
    #[must_use]
    pub fn new(settings: PlaybackSettings) -> Self {
        Self {
            id: InstanceId::next(),
            settings,
            dataset: None,
            texture: None,
            playing_clip: None,
            time: 0.0,
            is_playing: false,
            last_played_clip: None,
            last_played_time: 0.0,
            cross_fade_duration: 0.0,
            cross_fade_progress: 0.0,
            last_output: None,
            event_frame: None,
            root_motion: RootMotionAccumulator::new(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Binds the instance to `dataset`, sharing its texture through `registry`.
    ///
    /// Initializing again with the same `Arc` does nothing. Any other
    /// dataset, including a re-bake that kept the previous id, releases the
    /// previous binding first and resets playback. If the re-baked content
    /// cannot be bound because other instances still use the old texture, the
    /// error is returned and the instance stays inert.
    pub fn init(&mut self, registry: &mut TextureRegistry, dataset: Arc<AnimationDataset>) -> Result<()> {
        if self.dataset.as_ref().is_some_and(|d| Arc::ptr_eq(d, &dataset)) {
            return Ok(());
        }
        self.teardown(registry);

        let texture = registry.bind(self.id, &dataset)?;
        log::debug!(
            "Instance {:?} initialized with dataset '{}' ({} clips)",
            self.id,
            dataset.name,
            dataset.clips.len()
        );
        self.texture = Some(texture);
        self.dataset = Some(dataset);
        Ok(())
    }

    /// Unbinds from the registry and returns to the inert state.
    ///
    /// Returns the texture if this instance was its last user.
    pub fn teardown(&mut self, registry: &mut TextureRegistry) -> Option<Arc<BakedTexture>> {
        let dataset = self.dataset.take()?;
        self.texture = None;
        self.playing_clip = None;
        self.last_played_clip = None;
        self.is_playing = false;
        self.time = 0.0;
        self.cross_fade_duration = 0.0;
        self.cross_fade_progress = 0.0;
        self.last_output = None;
        self.event_frame = None;
        self.root_motion.reset();
        registry.unbind(self.id, dataset.id)
    }

    /// Reports a device loss; returns the pixels to upload again if no other
    /// instance has done so for this `device_epoch`.
    pub fn device_lost(&mut self, registry: &mut TextureRegistry, device_epoch: u64) -> Option<Arc<BakedTexture>> {
        let dataset = self.dataset.as_ref()?;
        let texture = registry.request_reupload(dataset.id, device_epoch);
        // Draw parameters have to be emitted again for the new texture
        self.last_output = None;
        texture
    }

    // ========================================================================
    // Playback control
    // ========================================================================

    /// Starts `clip_name` from the beginning.
    ///
    /// Unknown names are ignored. Playing the clip that is already playing
    /// does nothing unless it is a finished Once clip or playback is stopped.
    pub fn play(&mut self, clip_name: &str) {
        let Some(index) = self.find_clip(clip_name) else {
            return;
        };
        if self.should_switch_to(index) {
            self.set_new_playing_clip(index);
            self.cross_fade_duration = 0.0;
        }
    }

    /// Like [`play`](Self::play) but fades from the current clip over
    /// `duration` seconds.
    pub fn cross_fade(&mut self, clip_name: &str, duration: f32) {
        if self.playing_clip.is_none() {
            self.play(clip_name);
            return;
        }
        let Some(index) = self.find_clip(clip_name) else {
            return;
        };
        if self.should_switch_to(index) {
            self.cross_fade_progress = 0.0;
            self.cross_fade_duration = duration.max(0.0);
            self.set_new_playing_clip(index);
        }
    }

    /// Freezes time; the current clip stays selected.
    pub fn stop(&mut self) {
        self.is_playing = false;
    }

    pub fn resume(&mut self) {
        if self.playing_clip.is_some() {
            self.is_playing = true;
        }
    }

    fn find_clip(&self, clip_name: &str) -> Option<usize> {
        self.dataset.as_ref()?.clip_index(clip_name)
    }

    fn should_switch_to(&self, index: usize) -> bool {
        self.playing_clip != Some(index)
            || (self.wrap_mode() == WrapMode::Once && self.is_time_at_end_of_loop())
            || !self.is_playing
    }

    fn set_new_playing_clip(&mut self, index: usize) {
        self.last_played_clip = self.playing_clip;
        self.last_played_time = self.time;

        self.is_playing = true;
        self.playing_clip = Some(index);
        self.time = 0.0;
        self.event_frame = None;
        self.root_motion.reset();
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances playback by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickOutput {
        let mut output = TickOutput::default();
        if !self.is_playing {
            return output;
        }
        let (Some(dataset), Some(clip_index)) = (self.dataset.clone(), self.playing_clip) else {
            return output;
        };
        let clip = &dataset.clips[clip_index];

        match clip.wrap_mode {
            WrapMode::Loop => self.time += dt,
            WrapMode::Once => self.time = (self.time + dt).clamp(0.0, clip.length),
        }
        self.cross_fade_progress += dt;
        self.last_played_time += dt;

        let frame_index = clip.frame_index_at(self.time);

        output.events.extend(clip.events_between(self.event_frame, frame_index).copied());
        self.event_frame = Some(frame_index);

        let root_motion_active = self.is_root_motion_active(clip);

        if (self.settings.visible || self.settings.culling_mode == CullingMode::AlwaysAnimate)
            && self.last_output != Some((clip_index, frame_index))
        {
            self.last_output = Some((clip_index, frame_index));
            output.draw = Some(self.draw_params(&dataset, clip, frame_index, root_motion_active));
        }

        if root_motion_active && dt > 0.0 && self.settings.culling_mode != CullingMode::CullCompletely {
            let forward = self.forward();
            let translation = self.root_motion.advance(clip, frame_index, dt, forward);
            self.position += translation;
            output.translation = translation;
        }

        output
    }

    fn draw_params(
        &self,
        dataset: &AnimationDataset,
        clip: &BakedClip,
        frame_index: usize,
        root_motion_active: bool,
    ) -> SkinDrawParams {
        let cross_fade = self.cross_fade_blend_factor().and_then(|blend_factor| {
            let last = dataset.clips.get(self.last_played_clip?)?;
            Some(CrossFadeParams {
                frame_index: self.cross_fade_frame_index(last),
                pixel_segmentation: last.pixel_segmentation,
                blend_factor,
            })
        });

        let root_motion = match clip.frame(frame_index) {
            Some(frame) if root_motion_active => {
                dataset.root_transform_matrix * frame.root_motion_inverse(dataset.root_bone_index)
            }
            _ => Mat4::IDENTITY,
        };

        SkinDrawParams {
            frame_index,
            pixel_segmentation: clip.pixel_segmentation,
            cross_fade,
            root_motion,
        }
    }

    fn cross_fade_frame_index(&self, last: &BakedClip) -> usize {
        if last.wrap_mode == WrapMode::Once && self.last_played_time >= last.length {
            last.last_frame_index()
        } else {
            last.frame_index_at(self.last_played_time)
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Wrap mode of the playing clip; `Once` when nothing is selected.
    #[must_use]
    pub fn wrap_mode(&self) -> WrapMode {
        self.current_clip().map_or(WrapMode::Once, |clip| clip.wrap_mode)
    }

    /// Whether the playing clip currently shows its last frame.
    #[must_use]
    pub fn is_time_at_end_of_loop(&self) -> bool {
        self.current_clip()
            .is_some_and(|clip| clip.frame_index_at(self.time) == clip.last_frame_index())
    }

    #[must_use]
    pub fn animation_data(&self) -> Option<&Arc<AnimationDataset>> {
        self.dataset.as_ref()
    }

    #[must_use]
    pub fn texture(&self) -> Option<&Arc<BakedTexture>> {
        self.texture.as_ref()
    }

    #[must_use]
    pub fn material_constants(&self) -> Option<SkinMaterialConstants> {
        self.texture.as_deref().map(SkinMaterialConstants::of)
    }

    #[must_use]
    pub fn current_clip(&self) -> Option<&BakedClip> {
        self.dataset.as_ref()?.clips.get(self.playing_clip?)
    }

    #[must_use]
    pub fn last_played_clip(&self) -> Option<&BakedClip> {
        self.dataset.as_ref()?.clips.get(self.last_played_clip?)
    }

    /// Playback time in seconds of the current clip.
    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[must_use]
    pub fn frame_index(&self) -> Option<usize> {
        self.current_clip().map(|clip| clip.frame_index_at(self.time))
    }

    /// Weight of the current clip while a cross-fade is running.
    #[must_use]
    pub fn cross_fade_blend_factor(&self) -> Option<f32> {
        let blending = self.last_played_clip.is_some()
            && self.cross_fade_duration > 0.0
            && self.cross_fade_progress <= self.cross_fade_duration;
        blending.then(|| (self.cross_fade_progress / self.cross_fade_duration).clamp(0.0, 1.0))
    }

    // ========================================================================
    // Per-instance settings
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.settings.visible = visible;
    }

    pub fn set_culling_mode(&mut self, mode: CullingMode) {
        self.settings.culling_mode = mode;
    }

    /// Toggles root motion; tracking restarts from the next tick.
    pub fn set_root_motion_enabled(&mut self, enabled: bool) {
        self.root_motion.reset();
        self.settings.root_motion_enabled = enabled;
    }

    fn is_root_motion_active(&self, clip: &BakedClip) -> bool {
        clip.root_motion_enabled && self.settings.root_motion_enabled
    }

    /// Facing direction used for root motion: local +Z under `rotation`.
    #[inline]
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}
