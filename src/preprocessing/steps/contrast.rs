use crate::preprocessing::buffer::PixelBuffer;

/// Reference stretch factor
pub const DEFAULT_FACTOR: f32 = 1.5;

const MIDPOINT: f32 = 128.0;

/// Linear contrast stretch around mid-gray
/// Each color channel becomes `factor * (v - 128) + 128`, rounded and clamped to 0-255
pub fn apply(buffer: &mut PixelBuffer, factor: f32) {
    for pixel in buffer.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = stretch(*channel, factor);
        }
    }
}

#[inline]
fn stretch(value: u8, factor: f32) -> u8 {
    (factor * (value as f32 - MIDPOINT) + MIDPOINT)
        .round()
        .clamp(0.0, 255.0) as u8
}
