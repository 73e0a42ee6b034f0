//! Lossless 16-bit packing of heights into two color channels.
//!
//! The render target is an 8-bit-per-channel color buffer, so the winning
//! height is split across two channels: `[-1, 1]` is quantized to
//! `0..=65535`, the high byte lands in the red channel and the low byte in
//! green. The blue channel is unused and alpha carries the coverage flag.
//! [`encode_height`] mirrors what the fragment shader writes;
//! [`decode_height`] reverses it on readback.

/// Quantization steps across the `[-1, 1]` height range.
const STEPS: f32 = 65535.0;

/// Worst-case round-trip error: one quantization step of the range.
pub const QUANTIZATION_STEP: f32 = 2.0 / 65535.0;

/// Encode a height in `[-1, 1]` into (high, low) byte channels.
///
/// Out-of-range heights are clamped. This is the CPU mirror of the
/// encoding in `shaders/offset_raster.wgsl`.
///
/// # Example
///
/// ```
/// use mesh_heightfield::encoding::encode_height;
///
/// assert_eq!(encode_height(-1.0), (0, 0));
/// assert_eq!(encode_height(1.0), (255, 255));
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
// Truncation/sign: the quantized value is clamped to 0..=65535
pub fn encode_height(h: f32) -> (u8, u8) {
    let h = h.clamp(-1.0, 1.0);
    let v = ((h + 1.0) * STEPS / 2.0 + 0.5).floor() as u32;
    let v = v.min(65535);
    ((v >> 8) as u8, (v & 0xff) as u8)
}

/// Decode two byte channels back into a height in `[-1, 1]`.
///
/// # Example
///
/// ```
/// use mesh_heightfield::encoding::{decode_height, encode_height};
///
/// let (high, low) = encode_height(0.25);
/// assert!((decode_height(high, low) - 0.25).abs() < 2.0 / 65535.0);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
// Precision loss: values up to 65535 are exact in f32
pub fn decode_height(high: u8, low: u8) -> f32 {
    let v = (u32::from(high) << 8) | u32::from(low);
    v as f32 / STEPS * 2.0 - 1.0
}
