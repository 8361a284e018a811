use std::fmt;

use glam::Mat4;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xxhash_rust::xxh3::Xxh3;

use crate::animation::baked::BakedClip;
use crate::skeleton::Skeleton;

/// Stable identity of a baked dataset; the texture registry is keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetId(pub Uuid);

impl DatasetId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DatasetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything one bake produces, shared read-only by every playback instance
/// bound to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationDataset {
    pub id: DatasetId,
    pub name: String,
    pub skeleton: Skeleton,
    pub clips: Vec<BakedClip>,
    /// Logical texture size in texels (the narrow encoding doubles the
    /// physical width on top of this)
    pub texture_width: u32,
    pub texture_height: u32,
    pub root_bone_index: usize,
    pub root_transform_matrix: Mat4,
}

impl AnimationDataset {
    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.skeleton.len()
    }

    /// Texels per frame: three matrix rows per bone.
    #[inline]
    #[must_use]
    pub fn pixels_per_frame(&self) -> u32 {
        (self.bone_count() * 3) as u32
    }

    #[must_use]
    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|clip| clip.name == name)
    }

    #[must_use]
    pub fn clip(&self, name: &str) -> Option<&BakedClip> {
        self.clips.iter().find(|clip| clip.name == name)
    }

    /// Content hash over the clip layout and every baked matrix.
    ///
    /// Two datasets with the same fingerprint produce byte-identical textures.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(&(self.bone_count() as u64).to_le_bytes());
        for clip in &self.clips {
            hasher.update(clip.name.as_bytes());
            hasher.update(&(clip.frames.len() as u64).to_le_bytes());
            for frame in &clip.frames {
                for matrix in &frame.matrices {
                    hasher.update(bytemuck::cast_slice(&matrix.to_cols_array()));
                }
            }
        }
        hasher.digest()
    }
}
