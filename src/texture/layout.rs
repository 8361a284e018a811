use crate::animation::{AnimationDataset, BakedClip};
use crate::errors::{GpuSkinError, Result};
use crate::settings::TextureEncoding;

/// Texels needed to store one bone matrix (rows 0..2 of the affine 4x4).
pub const PIXELS_PER_BONE: u32 = 3;

/// Smallest power-of-two texture reached by doubling width, then height,
/// alternately from 1x1, that holds `num_pixels` texels.
#[must_use]
pub fn texture_size(num_pixels: u32) -> (u32, u32) {
    let needed = u64::from(num_pixels);
    let mut width: u64 = 1;
    let mut height: u64 = 1;
    loop {
        if width * height >= needed {
            break;
        }
        width *= 2;
        if width * height >= needed {
            break;
        }
        height *= 2;
    }
    (width as u32, height as u32)
}

/// Where every clip lives in the bone texture.
///
/// Texels are laid out clip-major, then frame, then bone, then the three
/// matrix rows, so a row is addressed as
/// `pixel_segmentation + frame * pixels_per_frame + bone * 3 + row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureLayout {
    /// Logical width in texels
    pub width: u32,
    pub height: u32,
    pub total_pixels: u32,
    pub pixels_per_frame: u32,
}

impl TextureLayout {
    /// Assigns each clip its pixel segmentation and sizes the texture.
    pub fn assign(clips: &mut [BakedClip], bone_count: usize) -> Result<Self> {
        let pixels_per_frame = pixels_per_frame(bone_count)?;
        let mut total_pixels: u32 = 0;
        for clip in clips.iter_mut() {
            clip.pixel_segmentation = total_pixels;
            log::debug!(
                "Clip '{}' segmentation at texel {}",
                clip.name,
                total_pixels
            );
            total_pixels = clip_pixels(clip, pixels_per_frame)
                .and_then(|pixels| total_pixels.checked_add(pixels))
                .ok_or_else(|| too_large(&clip.name))?;
        }
        Ok(Self::sized(total_pixels, pixels_per_frame))
    }

    /// Layout implied by a dataset's clips, without touching them.
    ///
    /// The declared texture size must be the one the doubling policy picks
    /// for the clips, so a dataset read from disk cannot ask for an
    /// arbitrarily large texture.
    pub fn of(dataset: &AnimationDataset) -> Result<Self> {
        let pixels_per_frame = pixels_per_frame(dataset.bone_count())?;
        let mut total_pixels: u32 = 0;
        for clip in &dataset.clips {
            total_pixels = clip_pixels(clip, pixels_per_frame)
                .and_then(|pixels| total_pixels.checked_add(pixels))
                .ok_or_else(|| too_large(&clip.name))?;
        }

        let layout = Self::sized(total_pixels, pixels_per_frame);
        if (dataset.texture_width, dataset.texture_height) != (layout.width, layout.height) {
            return Err(GpuSkinError::InvalidLayout(format!(
                "dataset '{}' needs {} texels in a {}x{} texture but declares {}x{}",
                dataset.name,
                total_pixels,
                layout.width,
                layout.height,
                dataset.texture_width,
                dataset.texture_height
            )));
        }
        Ok(layout)
    }

    fn sized(total_pixels: u32, pixels_per_frame: u32) -> Self {
        let (width, height) = texture_size(total_pixels);
        Self {
            width,
            height,
            total_pixels,
            pixels_per_frame,
        }
    }

    /// Width of the texture actually allocated for `encoding`.
    #[inline]
    #[must_use]
    pub fn physical_width(&self, encoding: TextureEncoding) -> u32 {
        self.width * encoding.texels_per_row()
    }

    /// First texel of `bone` in `frame` of a clip starting at `segmentation`.
    #[inline]
    #[must_use]
    pub fn pixel_index(&self, segmentation: u32, frame: usize, bone: usize) -> u32 {
        segmentation + frame as u32 * self.pixels_per_frame + bone as u32 * PIXELS_PER_BONE
    }
}

fn pixels_per_frame(bone_count: usize) -> Result<u32> {
    u32::try_from(bone_count)
        .ok()
        .and_then(|bones| bones.checked_mul(PIXELS_PER_BONE))
        .ok_or_else(|| GpuSkinError::InvalidLayout(format!("{bone_count} bones do not fit a texture")))
}

fn clip_pixels(clip: &BakedClip, pixels_per_frame: u32) -> Option<u32> {
    u32::try_from(clip.frames.len()).ok()?.checked_mul(pixels_per_frame)
}

fn too_large(clip: &str) -> GpuSkinError {
    GpuSkinError::InvalidLayout(format!("texel count overflows at clip '{clip}'"))
}
