//! Texture Registry & System Tests
//!
//! Tests for:
//! - Shared texture lifetime across bound instances
//! - Fingerprint checks on re-bind
//! - Device-loss re-upload dedupe
//! - SkinSystem spawn / tick / despawn

use std::sync::Arc;

use glam::Mat4;

use gpuskin::animation::{AnimationDataset, BakedClip, DatasetId, Frame, RootMotionDelta, WrapMode};
use gpuskin::errors::GpuSkinError;
use gpuskin::playback::{InstanceId, PlaybackInstance};
use gpuskin::settings::{DeviceCapabilities, PlaybackSettings, SkinSettings, TextureEncoding};
use gpuskin::skeleton::{Skeleton, SourceBone};
use gpuskin::texture::{TextureLayout, TextureRegistry};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn dataset(name: &str) -> AnimationDataset {
    init_logger();
    let skeleton = Skeleton::collect(&SourceBone::new("root", None));
    let mut clips = vec![BakedClip {
        name: "idle".to_string(),
        length: 1.0,
        frame_rate: 4,
        wrap_mode: WrapMode::Loop,
        frames: (0..4)
            .map(|k| Frame {
                matrices: vec![Mat4::from_rotation_y(k as f32 * 0.1)],
                root_motion: RootMotionDelta::default(),
            })
            .collect(),
        pixel_segmentation: 0,
        root_motion_enabled: false,
        events: Vec::new(),
    }];
    let layout = TextureLayout::assign(&mut clips, skeleton.len()).unwrap();
    AnimationDataset {
        id: DatasetId::new(),
        name: name.to_string(),
        skeleton,
        clips,
        texture_width: layout.width,
        texture_height: layout.height,
        root_bone_index: 0,
        root_transform_matrix: Mat4::IDENTITY,
    }
}

// ============================================================================
// Binding
// ============================================================================

#[test]
fn instances_share_one_texture() {
    let data = Arc::new(dataset("hero"));
    let mut registry = TextureRegistry::new(TextureEncoding::Wide);
    let (a, b) = (InstanceId::next(), InstanceId::next());

    let ta = registry.bind(a, &data).unwrap();
    let tb = registry.bind(b, &data).unwrap();

    assert!(Arc::ptr_eq(&ta, &tb));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.ref_count(data.id), 2);
}

#[test]
fn unbinding_one_keeps_texture_alive() {
    let data = Arc::new(dataset("hero"));
    let mut registry = TextureRegistry::new(TextureEncoding::Wide);
    let (a, b) = (InstanceId::next(), InstanceId::next());
    registry.bind(a, &data).unwrap();
    registry.bind(b, &data).unwrap();

    assert!(registry.unbind(a, data.id).is_none());
    assert!(registry.contains(data.id));
    assert_eq!(registry.ref_count(data.id), 1);

    let released = registry.unbind(b, data.id);
    assert!(released.is_some());
    assert!(!registry.contains(data.id));
    assert!(registry.is_empty());
    assert!(registry.texture(data.id).is_none());
}

#[test]
fn duplicate_bind_counts_once() {
    let data = Arc::new(dataset("hero"));
    let mut registry = TextureRegistry::new(TextureEncoding::Narrow);
    let a = InstanceId::next();
    registry.bind(a, &data).unwrap();
    registry.bind(a, &data).unwrap();

    assert_eq!(registry.ref_count(data.id), 1);
    assert!(registry.unbind(a, data.id).is_some());
}

#[test]
fn unbind_unknown_is_harmless() {
    let data = Arc::new(dataset("hero"));
    let mut registry = TextureRegistry::new(TextureEncoding::Wide);
    assert!(registry.unbind(InstanceId::next(), data.id).is_none());

    registry.bind(InstanceId::next(), &data).unwrap();
    assert!(registry.unbind(InstanceId::next(), data.id).is_none());
    assert_eq!(registry.ref_count(data.id), 1);
}

#[test]
fn datasets_get_separate_textures() {
    let (hero, villain) = (Arc::new(dataset("hero")), Arc::new(dataset("villain")));
    let mut registry = TextureRegistry::new(TextureEncoding::Wide);
    let a = InstanceId::next();

    let t1 = registry.bind(a, &hero).unwrap();
    let t2 = registry.bind(a, &villain).unwrap();
    assert!(!Arc::ptr_eq(&t1, &t2));
    assert_eq!(registry.len(), 2);
    assert_eq!(t1.dataset, hero.id);
    assert_eq!(t2.dataset, villain.id);
}

#[test]
fn changed_dataset_under_same_id_is_rejected() {
    let data = Arc::new(dataset("hero"));
    let mut registry = TextureRegistry::new(TextureEncoding::Wide);
    registry.bind(InstanceId::next(), &data).unwrap();

    let mut rebaked = (*data).clone();
    rebaked.clips[0].frames[0].matrices[0] = Mat4::from_rotation_x(1.0);
    let err = registry.bind(InstanceId::next(), &Arc::new(rebaked)).unwrap_err();
    assert!(matches!(err, GpuSkinError::DatasetMismatch { id } if id == data.id));
}

#[test]
fn equal_copy_under_same_id_shares_texture() {
    let data = Arc::new(dataset("hero"));
    let copy = Arc::new((*data).clone());
    let mut registry = TextureRegistry::new(TextureEncoding::Wide);

    let original = registry.bind(InstanceId::next(), &data).unwrap();
    let shared = registry.bind(InstanceId::next(), &copy).unwrap();
    assert!(Arc::ptr_eq(&original, &shared));
    assert_eq!(registry.ref_count(data.id), 2);
}

// ============================================================================
// Device Loss
// ============================================================================

#[test]
fn reupload_once_per_epoch() {
    let data = Arc::new(dataset("hero"));
    let mut registry = TextureRegistry::new(TextureEncoding::Wide);
    let original = registry.bind(InstanceId::next(), &data).unwrap();
    registry.bind(InstanceId::next(), &data).unwrap();

    let first = registry.request_reupload(data.id, 1).expect("first report");
    assert!(Arc::ptr_eq(&first, &original), "Cached pixels are reused, not re-baked");
    assert!(registry.request_reupload(data.id, 1).is_none());
    assert!(registry.request_reupload(data.id, 2).is_some());
}

#[test]
fn reupload_of_released_dataset_is_none() {
    let data = Arc::new(dataset("hero"));
    let mut registry = TextureRegistry::new(TextureEncoding::Wide);
    assert!(registry.request_reupload(data.id, 1).is_none());
}

// ============================================================================
// Instances
// ============================================================================

#[test]
fn instance_reinit_moves_binding() {
    let (hero, villain) = (Arc::new(dataset("hero")), Arc::new(dataset("villain")));
    let mut registry = TextureRegistry::new(TextureEncoding::Wide);
    let mut instance = PlaybackInstance::new(PlaybackSettings::default());

    instance.init(&mut registry, Arc::clone(&hero)).unwrap();
    instance.init(&mut registry, Arc::clone(&hero)).unwrap();
    assert_eq!(registry.ref_count(hero.id), 1);

    instance.init(&mut registry, Arc::clone(&villain)).unwrap();
    assert!(!registry.contains(hero.id));
    assert_eq!(registry.ref_count(villain.id), 1);
}

/// `base` with one more clip appended, keeping its id.
fn rebaked_with(base: &AnimationDataset, clip_name: &str) -> AnimationDataset {
    let mut merged = base.clone();
    let mut extra = merged.clips[0].clone();
    extra.name = clip_name.to_string();
    merged.clips.push(extra);
    let layout = TextureLayout::assign(&mut merged.clips, merged.skeleton.len()).unwrap();
    merged.texture_width = layout.width;
    merged.texture_height = layout.height;
    merged
}

#[test]
fn instance_reinit_with_rebaked_dataset_picks_up_new_clips() {
    let hero = Arc::new(dataset("hero"));
    let mut registry = TextureRegistry::new(TextureEncoding::Wide);
    let mut instance = PlaybackInstance::new(PlaybackSettings::default());
    instance.init(&mut registry, Arc::clone(&hero)).unwrap();

    let rebaked = Arc::new(rebaked_with(&hero, "wave"));
    assert_eq!(rebaked.id, hero.id);
    instance.init(&mut registry, Arc::clone(&rebaked)).unwrap();

    assert!(Arc::ptr_eq(instance.animation_data().unwrap(), &rebaked));
    assert_eq!(
        registry.texture(hero.id).unwrap().fingerprint,
        rebaked.fingerprint(),
        "Texture was repacked for the new content"
    );
    assert_eq!(registry.ref_count(hero.id), 1);

    instance.play("wave");
    assert!(instance.is_playing());
    assert_eq!(instance.current_clip().map(|c| c.name.as_str()), Some("wave"));
}

#[test]
fn instance_reinit_with_rebaked_dataset_in_use_elsewhere_fails() {
    let hero = Arc::new(dataset("hero"));
    let mut registry = TextureRegistry::new(TextureEncoding::Wide);
    let mut a = PlaybackInstance::new(PlaybackSettings::default());
    let mut b = PlaybackInstance::new(PlaybackSettings::default());
    a.init(&mut registry, Arc::clone(&hero)).unwrap();
    b.init(&mut registry, Arc::clone(&hero)).unwrap();

    let rebaked = Arc::new(rebaked_with(&hero, "wave"));
    let err = a.init(&mut registry, rebaked).unwrap_err();
    assert!(matches!(err, GpuSkinError::DatasetMismatch { id } if id == hero.id));

    assert!(a.animation_data().is_none(), "Failed re-init leaves the instance inert");
    assert_eq!(registry.ref_count(hero.id), 1);
    assert!(b.texture().is_some());
}

// ============================================================================
// SkinSystem
// ============================================================================

mod system {
    use super::*;
    use gpuskin::playback::SkinSystem;

    fn system() -> SkinSystem {
        let settings = SkinSettings::from_capabilities(DeviceCapabilities {
            rgba16_float: false,
            rgba8_unorm: true,
        })
        .unwrap();
        SkinSystem::new(settings)
    }

    #[test]
    fn encoding_resolution() {
        assert_eq!(
            DeviceCapabilities::default().resolve_encoding().unwrap(),
            TextureEncoding::Wide
        );
        assert_eq!(system().registry().encoding(), TextureEncoding::Narrow);
        let none = DeviceCapabilities {
            rgba16_float: false,
            rgba8_unorm: false,
        };
        assert!(matches!(
            SkinSettings::from_capabilities(none),
            Err(GpuSkinError::UnsupportedTextureFormat)
        ));
    }

    #[test]
    fn spawn_and_despawn() {
        let mut system = system();
        let data = Arc::new(dataset("hero"));
        let a = system.spawn(Arc::clone(&data)).unwrap();
        let b = system.spawn(Arc::clone(&data)).unwrap();

        assert_eq!(system.len(), 2);
        assert_eq!(system.registry().ref_count(data.id), 2);
        let ta = system.get(a).unwrap().texture().unwrap();
        let tb = system.get(b).unwrap().texture().unwrap();
        assert!(Arc::ptr_eq(ta, tb));

        assert!(system.despawn(a).is_none());
        assert!(system.despawn(a).is_none(), "Stale handle");
        assert!(system.despawn(b).is_some());
        assert!(system.is_empty());
        assert!(system.registry().is_empty());
    }

    #[test]
    fn tick_all_reports_active_instances() {
        let mut system = system();
        let data = Arc::new(dataset("hero"));
        let playing = system.spawn(Arc::clone(&data)).unwrap();
        let _idle = system.spawn(Arc::clone(&data)).unwrap();
        system.get_mut(playing).unwrap().play("idle");

        let outputs = system.tick_all(0.25);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].0, playing);
        assert_eq!(outputs[0].1.draw.map(|d| d.frame_index), Some(1));
    }

    #[test]
    fn device_loss_reuploads_each_dataset_once() {
        let mut system = system();
        let hero = Arc::new(dataset("hero"));
        let villain = Arc::new(dataset("villain"));
        for _ in 0..3 {
            system.spawn(Arc::clone(&hero)).unwrap();
        }
        system.spawn(Arc::clone(&villain)).unwrap();

        let textures = system.device_lost();
        assert_eq!(textures.len(), 2);
        assert_eq!(system.device_lost().len(), 2, "A new loss is a new epoch");
    }
}
