#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod errors;
pub mod settings;
pub mod skeleton;
pub mod animation;
pub mod bake;
pub mod texture;
pub mod playback;
pub mod io;

pub use errors::{GpuSkinError, Result};
pub use settings::{BakeSettings, CullingMode, DeviceCapabilities, PlaybackSettings, SkinSettings, TextureEncoding};
pub use skeleton::{Bone, LocalTransform, Skeleton, SourceBone};
pub use animation::{AnimEvent, AnimationClip, AnimationDataset, BakedClip, DatasetId, Frame, RootMotionDelta, WrapMode};
pub use bake::{BakeProgress, Baker, ClipBakeRequest, FrameSampler, PoseSource, TrackPoseSource};
pub use texture::{BakedTexture, TextureLayout, TextureRegistry, pack_dataset, texture_size};
pub use playback::{InstanceHandle, PlaybackInstance, SkinDrawParams, SkinSystem, TickOutput};
