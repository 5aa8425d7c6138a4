use crate::preprocessing::buffer::{luminance, set_level, PixelBuffer};

/// Replace red, green and blue with their unweighted mean
/// This is the foundation for every other preprocessing step
pub fn apply(buffer: &mut PixelBuffer) {
    for pixel in buffer.pixels_mut() {
        let level = luminance(pixel);
        set_level(pixel, level);
    }
}
