//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`GpuSkinError`] covers all failure modes including:
//! - Malformed bone hierarchies
//! - Missing, duplicate or inconsistent bake inputs
//! - Unsupported texture formats
//! - Dataset persistence errors
//!
//! Operations that the playback layer treats as harmless (an unknown clip
//! name, calls on an instance that was never bound) are silent no-ops and do
//! not surface here.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, GpuSkinError>`.
//!
//! ```rust,ignore
//! use gpuskin::errors::Result;
//!
//! fn bake() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::animation::DatasetId;

/// The main error type for the crate.
#[derive(Error, Debug)]
pub enum GpuSkinError {
    // ========================================================================
    // Hierarchy Errors
    // ========================================================================
    /// The bone list does not form a valid tree.
    #[error("Invalid bone hierarchy: {0}")]
    InvalidHierarchy(String),

    /// A pose source produced a different number of transforms than bones.
    #[error("Pose size mismatch: expected {expected} bone transforms, got {actual}")]
    PoseMismatch {
        /// Number of bones in the skeleton
        expected: usize,
        /// Number of transforms supplied
        actual: usize,
    },

    // ========================================================================
    // Bake Errors
    // ========================================================================
    /// A required bake input was not supplied.
    #[error("Missing bake input: {0}")]
    MissingInput(&'static str),

    /// A clip would contain zero frames.
    #[error("Clip '{name}' has no frames (length {length}s at {frame_rate} fps)")]
    EmptyClip {
        /// Clip name
        name: String,
        /// Clip length in seconds
        length: f32,
        /// Sampling rate
        frame_rate: u32,
    },

    /// The bake was finished before every frame had been sampled.
    #[error("Bake incomplete: clip '{clip}' has {sampled} of {expected} frames")]
    BakeIncomplete {
        /// Clip that was being sampled
        clip: String,
        /// Frames sampled so far
        sampled: usize,
        /// Frames required
        expected: usize,
    },

    /// Two clips of one dataset share a name.
    #[error("Duplicate clip name '{0}'")]
    DuplicateClip(String),

    /// A pose source refused to pose the hierarchy.
    #[error("Pose source error: {0}")]
    PoseSource(String),

    // ========================================================================
    // Texture Errors
    // ========================================================================
    /// Neither the wide nor the narrow texture format is available.
    #[error("No supported bone texture format (RGBA16F and RGBA8 both unavailable)")]
    UnsupportedTextureFormat,

    /// A dataset's clip segmentation does not fit its texture size.
    #[error("Invalid texture layout: {0}")]
    InvalidLayout(String),

    /// A dataset was re-baked under an id that still has a live texture.
    #[error("Dataset {id} changed while its texture is still bound")]
    DatasetMismatch {
        /// Identity of the dataset
        id: DatasetId,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Alias for `Result<T, GpuSkinError>`.
pub type Result<T> = std::result::Result<T, GpuSkinError>;
