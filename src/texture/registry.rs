use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::animation::{AnimationDataset, DatasetId};
use crate::errors::{GpuSkinError, Result};
use crate::playback::InstanceId;
use crate::settings::TextureEncoding;
use crate::texture::packer::{BakedTexture, pack_dataset};

struct RegistryEntry {
    /// Dataset the texture was packed from
    dataset: Arc<AnimationDataset>,
    texture: Arc<BakedTexture>,
    instances: FxHashSet<InstanceId>,
    /// Device epoch the pixels were last uploaded for
    uploaded_epoch: u64,
}

/// Shares one packed texture between every instance bound to a dataset.
///
/// The texture is packed on the first bind and dropped when the last bound
/// instance unbinds. Bind and unbind calls are expected to be serialized by
/// the caller.
pub struct TextureRegistry {
    encoding: TextureEncoding,
    entries: FxHashMap<DatasetId, RegistryEntry>,
}

impl TextureRegistry {
    #[must_use]
    pub fn new(encoding: TextureEncoding) -> Self {
        Self {
            encoding,
            entries: FxHashMap::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn encoding(&self) -> TextureEncoding {
        self.encoding
    }

    /// Registers `instance` as a user of `dataset`'s texture, packing it if
    /// this is the first binding.
    ///
    /// Binding the same instance twice is counted once. A dataset whose
    /// content changed while its texture is still bound is rejected rather
    /// than packed a second time. Content is only hashed when `dataset` is a
    /// different allocation than the one the texture was packed from.
    pub fn bind(&mut self, instance: InstanceId, dataset: &Arc<AnimationDataset>) -> Result<Arc<BakedTexture>> {
        if let Some(entry) = self.entries.get_mut(&dataset.id) {
            if !Arc::ptr_eq(&entry.dataset, dataset) && entry.texture.fingerprint != dataset.fingerprint() {
                return Err(GpuSkinError::DatasetMismatch { id: dataset.id });
            }
            if !entry.instances.insert(instance) {
                log::warn!("Instance {instance:?} bound twice to dataset '{}'", dataset.name);
            }
            log::debug!(
                "Bound {instance:?} to '{}' ({} users)",
                dataset.name,
                entry.instances.len()
            );
            return Ok(Arc::clone(&entry.texture));
        }

        let texture = Arc::new(pack_dataset(dataset, self.encoding)?);
        let mut instances = FxHashSet::default();
        instances.insert(instance);
        self.entries.insert(
            dataset.id,
            RegistryEntry {
                dataset: Arc::clone(dataset),
                texture: Arc::clone(&texture),
                instances,
                uploaded_epoch: 0,
            },
        );
        log::debug!("Bound {instance:?} to '{}' (1 user)", dataset.name);
        Ok(texture)
    }

    /// Removes `instance` from `dataset`'s users.
    ///
    /// Returns the texture when this was the last user; the registry no
    /// longer holds it and the caller should release any GPU copy.
    pub fn unbind(&mut self, instance: InstanceId, dataset: DatasetId) -> Option<Arc<BakedTexture>> {
        let Some(entry) = self.entries.get_mut(&dataset) else {
            log::warn!("Unbind of {instance:?} from unknown dataset {dataset}");
            return None;
        };
        if !entry.instances.remove(&instance) {
            log::warn!("Unbind of {instance:?} which is not bound to dataset {dataset}");
            return None;
        }
        if !entry.instances.is_empty() {
            return None;
        }

        let entry = self.entries.remove(&dataset)?;
        log::info!("Released bone texture of dataset {dataset}");
        Some(entry.texture)
    }

    #[must_use]
    pub fn texture(&self, dataset: DatasetId) -> Option<&Arc<BakedTexture>> {
        self.entries.get(&dataset).map(|entry| &entry.texture)
    }

    /// Number of instances currently bound to `dataset`.
    #[must_use]
    pub fn ref_count(&self, dataset: DatasetId) -> usize {
        self.entries.get(&dataset).map_or(0, |entry| entry.instances.len())
    }

    #[must_use]
    pub fn contains(&self, dataset: DatasetId) -> bool {
        self.entries.contains_key(&dataset)
    }

    /// Number of live textures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hands out the cached pixels for re-upload after a device loss.
    ///
    /// The host bumps `device_epoch` whenever GPU resources were lost. Every
    /// bound instance may report the loss, but only the first report per
    /// dataset and epoch gets the texture back; later reports get `None`.
    pub fn request_reupload(&mut self, dataset: DatasetId, device_epoch: u64) -> Option<Arc<BakedTexture>> {
        let entry = self.entries.get_mut(&dataset)?;
        if entry.uploaded_epoch == device_epoch {
            return None;
        }
        entry.uploaded_epoch = device_epoch;
        log::warn!("Re-uploading bone texture of dataset {dataset} for device epoch {device_epoch}");
        Some(Arc::clone(&entry.texture))
    }
}
