pub mod values;
pub mod tracks;
pub mod clip;
pub mod binding;
pub mod binder;
pub mod baked;
pub mod dataset;

pub use clip::{AnimationClip, Track, TrackData, TrackMeta};
pub use binding::{BoneBinding, TargetPath};
pub use binder::Binder;
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
pub use baked::{AnimEvent, BakedClip, Frame, RootMotionDelta, WrapMode};
pub use dataset::{AnimationDataset, DatasetId};
