use super::buffer::PixelBuffer;
use crate::error::ScanError;
use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

/// Crop rectangle in display coordinates, relative to the displayed video.
///
/// `display_width` and `display_height` are the size the video is shown at;
/// the ratio between them and the frame's natural size scales the rectangle
/// into frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub display_width: f64,
    pub display_height: f64,
}

impl CropRegion {
    /// Region covering a whole frame shown at its natural size
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: width as f64,
            height: height as f64,
            display_width: width as f64,
            display_height: height as f64,
        }
    }

    /// Keep the rectangle fully inside the displayed video.
    ///
    /// Oversized regions shrink to the display; otherwise the rectangle is
    /// moved, not resized, the way a dragged box stops at the video edge.
    pub fn clamped(&self) -> Self {
        let display_width = finite_or_zero(self.display_width).max(0.0);
        let display_height = finite_or_zero(self.display_height).max(0.0);
        let width = finite_or_zero(self.width).clamp(0.0, display_width);
        let height = finite_or_zero(self.height).clamp(0.0, display_height);
        let left = finite_or_zero(self.left).clamp(0.0, display_width - width);
        let top = finite_or_zero(self.top).clamp(0.0, display_height - height);

        Self {
            left,
            top,
            width,
            height,
            display_width,
            display_height,
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Copy the frame pixels under `region` into a new buffer.
///
/// The x and y axes scale independently by natural size over display size.
/// Fractional offsets and sizes truncate toward zero, and the scaled rectangle
/// is clipped to the frame.
pub fn sample(frame: &RgbaImage, region: &CropRegion) -> Result<PixelBuffer, ScanError> {
    let (natural_width, natural_height) = frame.dimensions();
    if natural_width == 0 || natural_height == 0 {
        return Err(ScanError::NotReady);
    }
    // Video element not laid out yet
    if !(region.display_width > 0.0 && region.display_height > 0.0) {
        return Err(ScanError::NotReady);
    }

    let scale_x = natural_width as f64 / region.display_width;
    let scale_y = natural_height as f64 / region.display_height;

    let left = (region.left * scale_x).max(0.0) as u32;
    let top = (region.top * scale_y).max(0.0) as u32;
    let mut width = (region.width * scale_x).max(0.0) as u32;
    let mut height = (region.height * scale_y).max(0.0) as u32;

    width = width.min(natural_width.saturating_sub(left));
    height = height.min(natural_height.saturating_sub(top));

    if width == 0 || height == 0 {
        return Err(ScanError::DegenerateGeometry { width, height });
    }

    Ok(imageops::crop_imm(frame, left, top, width, height).to_image())
}
