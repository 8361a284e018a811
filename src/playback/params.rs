use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use smallvec::SmallVec;

use crate::animation::AnimEvent;
use crate::texture::BakedTexture;

/// Second pose sampled while a cross-fade is running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossFadeParams {
    /// Frame of the clip being faded out
    pub frame_index: usize,
    pub pixel_segmentation: u32,
    /// 0 shows only the faded-out clip, 1 only the current one
    pub blend_factor: f32,
}

/// Per-draw inputs of the skinning shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinDrawParams {
    pub frame_index: usize,
    pub pixel_segmentation: u32,
    pub cross_fade: Option<CrossFadeParams>,
    /// Cancels the baked root displacement; identity unless root motion is active
    pub root_motion: Mat4,
}

impl SkinDrawParams {
    #[must_use]
    pub fn to_uniform(&self, material: &SkinMaterialConstants) -> SkinUniform {
        let cross_fade = match self.cross_fade {
            Some(fade) => Vec4::new(
                fade.frame_index as f32,
                fade.pixel_segmentation as f32,
                fade.blend_factor,
                0.0,
            ),
            None => Vec4::new(0.0, 0.0, 1.0, 0.0),
        };
        SkinUniform {
            root_motion: self.root_motion,
            frame: Vec4::new(
                self.frame_index as f32,
                self.pixel_segmentation as f32,
                0.0,
                0.0,
            ),
            cross_fade,
            texture: material.as_vec4(),
        }
    }
}

/// Material-wide constants shared by every instance of one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinMaterialConstants {
    /// Allocated texture width, narrow doubling included
    pub texture_width: u32,
    pub texture_height: u32,
    pub pixels_per_frame: u32,
}

impl SkinMaterialConstants {
    #[must_use]
    pub fn of(texture: &BakedTexture) -> Self {
        Self {
            texture_width: texture.width(),
            texture_height: texture.height(),
            pixels_per_frame: texture.layout.pixels_per_frame,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_vec4(&self) -> Vec4 {
        Vec4::new(
            self.texture_width as f32,
            self.texture_height as f32,
            self.pixels_per_frame as f32,
            0.0,
        )
    }
}

/// GPU layout of the per-draw skinning parameters.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SkinUniform {
    pub root_motion: Mat4,
    /// (frame index, pixel segmentation, 0, 0)
    pub frame: Vec4,
    /// (frame index, pixel segmentation, blend factor, 0); blend 1 when idle
    pub cross_fade: Vec4,
    /// (texture width, texture height, pixels per frame, 0)
    pub texture: Vec4,
}

impl Default for SkinUniform {
    fn default() -> Self {
        Self {
            root_motion: Mat4::IDENTITY,
            frame: Vec4::ZERO,
            cross_fade: Vec4::new(0.0, 0.0, 1.0, 0.0),
            texture: Vec4::ZERO,
        }
    }
}

impl SkinUniform {
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// What one tick of an instance produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    /// New draw parameters; `None` when nothing changed or the instance is culled
    pub draw: Option<SkinDrawParams>,
    /// Events of every frame entered during the tick
    pub events: SmallVec<[AnimEvent; 4]>,
    /// Root-motion translation applied to the instance
    pub translation: Vec3,
}
