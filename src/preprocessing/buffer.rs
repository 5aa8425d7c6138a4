use crate::error::ScanError;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// RGBA pixel grid handed from stage to stage.
///
/// From the grayscale stage onward the red, green and blue channels of every
/// pixel hold the same value; alpha is never written by any stage.
pub type PixelBuffer = RgbaImage;

/// Unweighted mean of the color channels, truncated
#[inline]
pub fn luminance(pixel: &Rgba<u8>) -> u8 {
    let [r, g, b, _] = pixel.0;
    ((r as u16 + g as u16 + b as u16) / 3) as u8
}

/// Write one value into the color channels, leaving alpha alone
#[inline]
pub fn set_level(pixel: &mut Rgba<u8>, level: u8) {
    pixel.0[0] = level;
    pixel.0[1] = level;
    pixel.0[2] = level;
}

/// Encode a buffer as PNG for submission to an OCR engine
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>, ScanError> {
    let mut bytes = Vec::new();
    buffer
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| ScanError::Pipeline(format!("Failed to encode PNG: {}", e)))?;
    Ok(bytes)
}

/// Decode an uploaded still or camera frame into RGBA
pub fn decode_frame(bytes: &[u8]) -> Result<PixelBuffer, ScanError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ScanError::InvalidRequest(format!("Failed to decode image: {}", e)))?;
    Ok(img.into_rgba8())
}
