pub mod half_pack;
pub mod layout;
pub mod packer;
pub mod registry;

pub use layout::{PIXELS_PER_BONE, TextureLayout, texture_size};
pub use packer::{BakedTexture, pack_dataset};
pub use registry::TextureRegistry;
