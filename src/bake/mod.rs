pub mod baker;
pub mod pose;
pub mod sampler;

pub use baker::{BakeProgress, Baker, ClipBakeRequest};
pub use pose::{PoseSource, TrackPoseSource};
pub use sampler::{FrameSampler, skinning_matrices};
