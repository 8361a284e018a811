pub mod instance;
pub mod params;
pub mod root_motion;
pub mod system;

pub use instance::{InstanceId, PlaybackInstance};
pub use params::{CrossFadeParams, SkinDrawParams, SkinMaterialConstants, SkinUniform, TickOutput};
pub use root_motion::RootMotionAccumulator;
pub use system::{InstanceHandle, SkinSystem};
