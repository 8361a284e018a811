//! Half-float texel codec.
//!
//! The wide encoding stores matrix rows as four IEEE 754 binary16 values per
//! RGBA16F texel. The narrow encoding stores the same binary16 bit patterns
//! split into bytes: one RGBA8 texel carries two values as
//! `(hi(a), lo(a), hi(b), lo(b))`.
//!
//! [`decode_half_channels`] is the reference for the shader-side decode. It
//! works on normalized channel values as a sampler returns them and reproduces
//! binary16 exactly, subnormals and zero included.

use glam::Vec4;
use half::f16;

/// Largest finite binary16 value.
pub const HALF_MAX: f32 = 65504.0;

/// One wide texel: the four components of a matrix row as binary16 bits.
#[inline]
#[must_use]
pub fn encode_wide(row: Vec4) -> [u16; 4] {
    row.to_array().map(|v| f16::from_f32(v).to_bits())
}

#[inline]
#[must_use]
pub fn decode_wide(bits: [u16; 4]) -> Vec4 {
    Vec4::from_array(bits.map(|b| f16::from_bits(b).to_f32()))
}

/// One narrow texel holding two floats.
#[inline]
#[must_use]
pub fn float2_to_rgba8(a: f32, b: f32) -> [u8; 4] {
    let [a_hi, a_lo] = f16::from_f32(a).to_bits().to_be_bytes();
    let [b_hi, b_lo] = f16::from_f32(b).to_bits().to_be_bytes();
    [a_hi, a_lo, b_hi, b_lo]
}

/// Both floats of one narrow texel.
#[inline]
#[must_use]
pub fn rgba8_to_float2(texel: [u8; 4]) -> (f32, f32) {
    (
        decode_half_bytes(texel[0], texel[1]),
        decode_half_bytes(texel[2], texel[3]),
    )
}

#[inline]
#[must_use]
pub fn decode_half_bytes(hi: u8, lo: u8) -> f32 {
    decode_half_channels(f32::from(hi) / 255.0, f32::from(lo) / 255.0)
}

/// Rebuilds a binary16 value from two normalized 8-bit channels.
///
/// `hi` carries the sign bit, the 5-bit exponent (bias 15) and the top two
/// mantissa bits; `lo` carries the low eight mantissa bits.
#[allow(clippy::float_cmp)]
#[must_use]
pub fn decode_half_channels(hi: f32, lo: f32) -> f32 {
    let mut high = (hi * 255.0).round();
    let low = (lo * 255.0).round();

    let sign_bit = (high / 128.0).floor();
    high -= sign_bit * 128.0;
    let sign = 1.0 - 2.0 * sign_bit;

    let exponent = (high / 4.0).floor();
    let mantissa = low + (high % 4.0) * 256.0;

    if exponent == 0.0 {
        // Subnormal (and signed zero): no implicit leading one
        sign * 2f32.powi(-14) * (mantissa / 1024.0)
    } else if exponent == 31.0 {
        if mantissa == 0.0 { sign * f32::INFINITY } else { f32::NAN }
    } else {
        sign * 2f32.powi(exponent as i32 - 15) * (1.0 + mantissa / 1024.0)
    }
}

/// Whether `value` survives the binary16 conversion without overflowing.
#[inline]
#[must_use]
pub fn fits_half(value: f32) -> bool {
    value.is_finite() && value.abs() <= HALF_MAX
}
