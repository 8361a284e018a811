//! Bake & Playback Settings
//!
//! This module defines the process-wide configuration for baking and playing
//! back GPU skinning data.
//!
//! The core abstraction is [`TextureEncoding`], which decides how bone matrices
//! are laid out in the shared bone texture. It is resolved exactly once from a
//! [`DeviceCapabilities`] probe and then passed explicitly to the packer and the
//! texture registry; nothing reads it from ambient global state.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use gpuskin::settings::{DeviceCapabilities, SkinSettings};
//!
//! // Probe once at startup.
//! let caps = DeviceCapabilities { rgba16_float: true, rgba8_unorm: true };
//! let settings = SkinSettings::from_capabilities(caps)?;
//!
//! // Everything else keeps its defaults.
//! let settings = SkinSettings {
//!     playback: PlaybackSettings { root_motion_enabled: true, ..Default::default() },
//!     ..settings
//! };
//! ```

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::errors::{GpuSkinError, Result};

// ---------------------------------------------------------------------------
// TextureEncoding
// ---------------------------------------------------------------------------

/// Pixel encoding of the bone matrix texture.
///
/// | Encoding | Texel format | Texels per matrix row | Physical width |
/// |----------|--------------|-----------------------|----------------|
/// | `Wide`   | RGBA16F      | 1                     | `width`        |
/// | `Narrow` | RGBA8        | 2                     | `width * 2`    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureEncoding {
    /// Four half floats per texel, one matrix row per texel.
    Wide,
    /// Two half-float bit patterns per RGBA8 texel, one matrix row per two texels.
    Narrow,
}

impl TextureEncoding {
    /// Physical texels written per logical texel.
    #[inline]
    #[must_use]
    pub fn texels_per_row(self) -> u32 {
        match self {
            Self::Wide => 1,
            Self::Narrow => 2,
        }
    }

    /// Size of one physical texel in bytes.
    #[inline]
    #[must_use]
    pub fn bytes_per_texel(self) -> usize {
        match self {
            Self::Wide => 8,
            Self::Narrow => 4,
        }
    }

    /// Shader keyword the render step should enable for this encoding.
    #[must_use]
    pub fn shader_define(self) -> &'static str {
        match self {
            Self::Wide => "GPUSKIN_SUPPORT_FLOAT_TEXTURE",
            Self::Narrow => "GPUSKIN_NOSUPPORT_FLOAT_TEXTURE",
        }
    }
}

// ---------------------------------------------------------------------------
// DeviceCapabilities
// ---------------------------------------------------------------------------

/// Result of the hardware texture-format probe performed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Sampling from RGBA16 float textures is supported.
    pub rgba16_float: bool,
    /// Sampling from RGBA8 unorm textures is supported.
    pub rgba8_unorm: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            rgba16_float: true,
            rgba8_unorm: true,
        }
    }
}

impl DeviceCapabilities {
    /// Picks the preferred encoding the device can sample.
    pub fn resolve_encoding(&self) -> Result<TextureEncoding> {
        if self.rgba16_float {
            Ok(TextureEncoding::Wide)
        } else if self.rgba8_unorm {
            Ok(TextureEncoding::Narrow)
        } else {
            Err(GpuSkinError::UnsupportedTextureFormat)
        }
    }
}

// ---------------------------------------------------------------------------
// CullingMode
// ---------------------------------------------------------------------------

/// What an instance keeps doing while it is not visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CullingMode {
    /// Render parameters and root motion are always updated.
    AlwaysAnimate,
    /// Render parameters are skipped while invisible; root motion still runs.
    #[default]
    CullUpdateTransforms,
    /// Neither render parameters nor root motion run while invisible.
    CullCompletely,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Inputs of the bake pass that are not part of the hierarchy itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BakeSettings {
    /// Forward axis of the baked object; root-motion directions are stored
    /// relative to it.
    pub owner_forward: Vec3,
    /// Transform from the root bone's space to the object's space, applied to
    /// the root-motion inverse at draw time.
    pub root_transform_matrix: Mat4,
}

impl Default for BakeSettings {
    fn default() -> Self {
        Self {
            owner_forward: Vec3::Z,
            root_transform_matrix: Mat4::IDENTITY,
        }
    }
}

/// Defaults applied to every newly created playback instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSettings {
    pub culling_mode: CullingMode,
    pub root_motion_enabled: bool,
    pub visible: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            culling_mode: CullingMode::default(),
            root_motion_enabled: false,
            visible: true,
        }
    }
}

/// Process-wide configuration, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinSettings {
    pub encoding: TextureEncoding,
    pub bake: BakeSettings,
    pub playback: PlaybackSettings,
}

impl Default for SkinSettings {
    fn default() -> Self {
        Self {
            encoding: TextureEncoding::Wide,
            bake: BakeSettings::default(),
            playback: PlaybackSettings::default(),
        }
    }
}

impl SkinSettings {
    /// Resolves the texture encoding from a capability probe and keeps every
    /// other setting at its default.
    pub fn from_capabilities(caps: DeviceCapabilities) -> Result<Self> {
        let encoding = caps.resolve_encoding()?;
        log::info!(
            "Bone texture encoding resolved to {encoding:?} ({})",
            encoding.shader_define()
        );
        Ok(Self {
            encoding,
            ..Self::default()
        })
    }
}
