use glam::{Mat4, Vec4};

use crate::animation::{AnimationDataset, DatasetId};
use crate::errors::{GpuSkinError, Result};
use crate::settings::TextureEncoding;
use crate::texture::half_pack::{self, fits_half};
use crate::texture::layout::{PIXELS_PER_BONE, TextureLayout};

/// CPU copy of a packed bone texture.
///
/// The pixel buffer never changes after packing. It is kept around so the
/// texture can be re-uploaded after a device loss without re-baking.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedTexture {
    pub dataset: DatasetId,
    pub encoding: TextureEncoding,
    /// Logical size in texels; one texel per matrix row
    pub layout: TextureLayout,
    /// Fingerprint of the dataset content this texture was packed from
    pub fingerprint: u64,
    data: Vec<u8>,
}

impl BakedTexture {
    /// Allocated width: doubled by the narrow encoding.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.layout.physical_width(self.encoding)
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.layout.height
    }

    /// Raw texel bytes, row-major: RGBA16F little-endian for the wide
    /// encoding, RGBA8 for the narrow one.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Bytes per row of the allocated texture.
    #[inline]
    #[must_use]
    pub fn bytes_per_row(&self) -> usize {
        self.width() as usize * self.encoding.bytes_per_texel()
    }

    /// Decodes the matrix row stored at logical texel `pixel`.
    #[must_use]
    pub fn read_row(&self, pixel: u32) -> Option<Vec4> {
        match self.encoding {
            TextureEncoding::Wide => {
                let offset = pixel as usize * 8;
                let bytes = self.data.get(offset..offset + 8)?;
                let mut bits = [0u16; 4];
                for (bit, chunk) in bits.iter_mut().zip(bytes.chunks_exact(2)) {
                    *bit = u16::from_le_bytes([chunk[0], chunk[1]]);
                }
                Some(half_pack::decode_wide(bits))
            }
            TextureEncoding::Narrow => {
                let offset = pixel as usize * 8;
                let bytes = self.data.get(offset..offset + 8)?;
                let (x, y) = half_pack::rgba8_to_float2([bytes[0], bytes[1], bytes[2], bytes[3]]);
                let (z, w) = half_pack::rgba8_to_float2([bytes[4], bytes[5], bytes[6], bytes[7]]);
                Some(Vec4::new(x, y, z, w))
            }
        }
    }

    /// Rebuilds the bone matrix whose first row sits at logical texel `pixel`.
    #[must_use]
    pub fn read_matrix(&self, pixel: u32) -> Option<Mat4> {
        let r0 = self.read_row(pixel)?;
        let r1 = self.read_row(pixel + 1)?;
        let r2 = self.read_row(pixel + 2)?;
        Some(Mat4::from_cols(r0, r1, r2, Vec4::W).transpose())
    }

    /// Matrix of `bone` in `frame` of the clip starting at `segmentation`.
    #[must_use]
    pub fn bone_matrix(&self, segmentation: u32, frame: usize, bone: usize) -> Option<Mat4> {
        self.read_matrix(self.layout.pixel_index(segmentation, frame, bone))
    }
}

/// Packs every clip of `dataset` into one texel buffer.
///
/// Each clip is written at its own pixel segmentation, so the runtime
/// addressing formula holds even for datasets that were merged or reloaded.
pub fn pack_dataset(dataset: &AnimationDataset, encoding: TextureEncoding) -> Result<BakedTexture> {
    let layout = TextureLayout::of(dataset)?;

    let texel_count = layout.width as usize * layout.height as usize;
    // Both encodings spend 8 bytes per logical texel.
    let mut data = vec![0u8; texel_count * 8];
    let mut overflowed = 0usize;

    for clip in &dataset.clips {
        let end = u64::from(clip.pixel_segmentation)
            + clip.frames.len() as u64 * u64::from(layout.pixels_per_frame);
        if end > texel_count as u64 {
            return Err(GpuSkinError::InvalidLayout(format!(
                "clip '{}' ends at texel {end}, past the {texel_count} texels of the texture",
                clip.name
            )));
        }

        let mut pixel = clip.pixel_segmentation as usize;
        for frame in &clip.frames {
            if frame.matrices.len() != dataset.bone_count() {
                return Err(GpuSkinError::PoseMismatch {
                    expected: dataset.bone_count(),
                    actual: frame.matrices.len(),
                });
            }
            for matrix in &frame.matrices {
                for row in 0..PIXELS_PER_BONE as usize {
                    let values = matrix.row(row);
                    overflowed += values.to_array().iter().filter(|v| !fits_half(**v)).count();
                    write_row(&mut data[pixel * 8..pixel * 8 + 8], values, encoding);
                    pixel += 1;
                }
            }
        }
    }

    if overflowed > 0 {
        log::warn!(
            "Dataset '{}': {} matrix components exceed half-float range and overflow to infinity",
            dataset.name,
            overflowed
        );
    }

    log::info!(
        "Packed bone texture for '{}': {}x{} {:?}, {} texels used",
        dataset.name,
        layout.physical_width(encoding),
        layout.height,
        encoding,
        layout.total_pixels
    );

    Ok(BakedTexture {
        dataset: dataset.id,
        encoding,
        layout,
        fingerprint: dataset.fingerprint(),
        data,
    })
}

fn write_row(out: &mut [u8], row: Vec4, encoding: TextureEncoding) {
    match encoding {
        TextureEncoding::Wide => {
            for (chunk, bits) in out.chunks_exact_mut(2).zip(half_pack::encode_wide(row)) {
                chunk.copy_from_slice(&bits.to_le_bytes());
            }
        }
        TextureEncoding::Narrow => {
            out[..4].copy_from_slice(&half_pack::float2_to_rgba8(row.x, row.y));
            out[4..].copy_from_slice(&half_pack::float2_to_rgba8(row.z, row.w));
        }
    }
}
