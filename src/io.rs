//! Dataset persistence.
//!
//! Datasets are stored as JSON through `serde_json`. Loading re-checks the
//! invariants that deserialization alone cannot: the hierarchy shape, unique
//! clip names, the frame and matrix counts of every clip and the texture size.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::animation::{AnimationDataset, BakedClip};
use crate::errors::{GpuSkinError, Result};
use crate::skeleton::Skeleton;
use crate::texture::TextureLayout;

pub fn dataset_to_json(dataset: &AnimationDataset) -> Result<String> {
    Ok(serde_json::to_string_pretty(dataset)?)
}

pub fn dataset_from_json(json: &str) -> Result<AnimationDataset> {
    let dataset: AnimationDataset = serde_json::from_str(json)?;
    validate(&dataset)?;
    Ok(dataset)
}

pub fn save_dataset(dataset: &AnimationDataset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, dataset)?;
    writer.flush()?;
    log::info!("Saved dataset '{}' to {}", dataset.name, path.display());
    Ok(())
}

pub fn load_dataset(path: impl AsRef<Path>) -> Result<AnimationDataset> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let dataset: AnimationDataset = serde_json::from_reader(reader)?;
    validate(&dataset)?;
    log::info!(
        "Loaded dataset '{}' ({} clips) from {}",
        dataset.name,
        dataset.clips.len(),
        path.display()
    );
    Ok(dataset)
}

fn validate(dataset: &AnimationDataset) -> Result<()> {
    Skeleton::new(dataset.skeleton.bones().to_vec())?;

    if dataset.root_bone_index >= dataset.bone_count() {
        return Err(GpuSkinError::InvalidHierarchy(format!(
            "root bone index {} out of range for {} bones",
            dataset.root_bone_index,
            dataset.bone_count()
        )));
    }

    for (index, clip) in dataset.clips.iter().enumerate() {
        if dataset.clips[..index].iter().any(|c| c.name == clip.name) {
            return Err(GpuSkinError::DuplicateClip(clip.name.clone()));
        }
        let expected = BakedClip::expected_frame_count(clip.length, clip.frame_rate);
        if clip.frames.len() != expected {
            return Err(GpuSkinError::BakeIncomplete {
                clip: clip.name.clone(),
                sampled: clip.frames.len(),
                expected,
            });
        }
        if let Some(frame) = clip.frames.iter().find(|f| f.matrices.len() != dataset.bone_count()) {
            return Err(GpuSkinError::PoseMismatch {
                expected: dataset.bone_count(),
                actual: frame.matrices.len(),
            });
        }
    }

    TextureLayout::of(dataset)?;
    Ok(())
}
