use std::sync::Arc;

use glam::Vec3;
use slotmap::{SlotMap, new_key_type};

use crate::animation::AnimationDataset;
use crate::errors::Result;
use crate::playback::instance::PlaybackInstance;
use crate::playback::params::TickOutput;
use crate::settings::SkinSettings;
use crate::texture::{BakedTexture, TextureRegistry};

new_key_type! {
    pub struct InstanceHandle;
}

/// Owns the shared texture registry and every playback instance.
///
/// Drives the per-frame update of all instances from one caller-provided
/// `dt`, and keeps bind/unbind on the registry serialized.
pub struct SkinSystem {
    settings: SkinSettings,
    registry: TextureRegistry,
    instances: SlotMap<InstanceHandle, PlaybackInstance>,
    device_epoch: u64,
}

impl SkinSystem {
    #[must_use]
    pub fn new(settings: SkinSettings) -> Self {
        Self {
            registry: TextureRegistry::new(settings.encoding),
            settings,
            instances: SlotMap::with_key(),
            device_epoch: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &SkinSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &TextureRegistry {
        &self.registry
    }

    /// Creates an instance bound to `dataset` with the default playback
    /// settings.
    pub fn spawn(&mut self, dataset: Arc<AnimationDataset>) -> Result<InstanceHandle> {
        let mut instance = PlaybackInstance::new(self.settings.playback);
        instance.init(&mut self.registry, dataset)?;
        Ok(self.instances.insert(instance))
    }

    /// Removes an instance and unbinds it.
    ///
    /// Returns the texture when the instance was its last user.
    pub fn despawn(&mut self, handle: InstanceHandle) -> Option<Arc<BakedTexture>> {
        let mut instance = self.instances.remove(handle)?;
        instance.teardown(&mut self.registry)
    }

    #[must_use]
    pub fn get(&self, handle: InstanceHandle) -> Option<&PlaybackInstance> {
        self.instances.get(handle)
    }

    pub fn get_mut(&mut self, handle: InstanceHandle) -> Option<&mut PlaybackInstance> {
        self.instances.get_mut(handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstanceHandle, &PlaybackInstance)> {
        self.instances.iter()
    }

    /// Ticks every instance.
    ///
    /// Instances that produced nothing (no draw, no events, no movement) are
    /// left out of the result.
    pub fn tick_all(&mut self, dt: f32) -> Vec<(InstanceHandle, TickOutput)> {
        self.instances
            .iter_mut()
            .filter_map(|(handle, instance)| {
                let output = instance.tick(dt);
                let produced = output.draw.is_some()
                    || !output.events.is_empty()
                    || output.translation != Vec3::ZERO;
                produced.then_some((handle, output))
            })
            .collect()
    }

    /// Handles a lost device: starts a new device epoch and collects one
    /// texture per bound dataset for re-upload.
    pub fn device_lost(&mut self) -> Vec<Arc<BakedTexture>> {
        self.device_epoch += 1;
        log::warn!("Device lost, entering epoch {}", self.device_epoch);

        let epoch = self.device_epoch;
        self.instances
            .values_mut()
            .filter_map(|instance| instance.device_lost(&mut self.registry, epoch))
            .collect()
    }
}
