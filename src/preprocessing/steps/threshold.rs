use crate::preprocessing::buffer::{luminance, set_level, PixelBuffer};

/// Reference level for fixed-threshold binarization
pub const DEFAULT_LEVEL: u8 = 128;

/// How the binarization level is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binarize {
    /// Constant level
    Fixed(u8),
    /// Global level from Otsu's method, computed per buffer
    Otsu,
}

/// Binarize the buffer and return the level that was used
pub fn apply(buffer: &mut PixelBuffer, strategy: Binarize) -> u8 {
    let level = match strategy {
        Binarize::Fixed(level) => level,
        Binarize::Otsu => otsu_level(&histogram(buffer)),
    };
    binarize(buffer, level);
    level
}

/// Pixels brighter than `level` become 255, the rest 0
pub fn binarize(buffer: &mut PixelBuffer, level: u8) {
    for pixel in buffer.pixels_mut() {
        let value = if luminance(pixel) > level { 255 } else { 0 };
        set_level(pixel, value);
    }
}

/// 256-bucket histogram of per-pixel luminance
pub fn histogram(buffer: &PixelBuffer) -> [u32; 256] {
    let mut histogram = [0u32; 256];
    for pixel in buffer.pixels() {
        histogram[luminance(pixel) as usize] += 1;
    }
    histogram
}

/// Otsu's method: the level maximizing between-class variance.
///
/// Levels with an empty background class are skipped and the scan stops as
/// soon as the foreground class empties. Only a strictly larger variance
/// replaces the current best, so ties keep the lowest level. A histogram with
/// a single populated bucket never produces a positive variance and yields 0.
pub fn otsu_level(histogram: &[u32; 256]) -> u8 {
    let total: f64 = histogram.iter().map(|&c| c as f64).sum();
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut weight_background = 0.0f64;
    let mut sum_background = 0.0f64;
    let mut maximum = 0.0f64;
    let mut threshold = 0u8;

    for (level, &count) in histogram.iter().enumerate() {
        weight_background += count as f64;
        if weight_background == 0.0 {
            continue;
        }

        let weight_foreground = total - weight_background;
        if weight_foreground == 0.0 {
            break;
        }

        sum_background += level as f64 * count as f64;
        let mean_background = sum_background / weight_background;
        let mean_foreground = (weighted_total - sum_background) / weight_foreground;

        let between = weight_background
            * weight_foreground
            * (mean_background - mean_foreground).powi(2);

        if between > maximum {
            maximum = between;
            threshold = level as u8;
        }
    }

    threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            let v = f(x, y);
            Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn test_threshold_output_is_binary() {
        let mut buffer = PixelBuffer::from_fn(50, 50, |x, y| {
            Rgba([(x * 5) as u8, (y * 3) as u8, (x * y % 256) as u8, 255])
        });
        apply(&mut buffer, Binarize::Otsu);

        for pixel in buffer.pixels() {
            for &channel in &pixel.0[..3] {
                assert!(
                    channel == 0 || channel == 255,
                    "Expected binary pixel, got {}",
                    channel
                );
            }
        }
    }

    #[test]
    fn test_fixed_threshold_is_strict() {
        let mut buffer = gray(3, 1, |x, _| [128, 129, 0][x as usize]);
        let level = apply(&mut buffer, Binarize::Fixed(DEFAULT_LEVEL));

        assert_eq!(level, 128);
        assert_eq!(buffer.get_pixel(0, 0).0[0], 0);
        assert_eq!(buffer.get_pixel(1, 0).0[0], 255);
        assert_eq!(buffer.get_pixel(2, 0).0[0], 0);
    }

    #[test]
    fn test_otsu_separates_two_levels() {
        let mut buffer = gray(20, 10, |x, _| if x < 10 { 50 } else { 200 });
        let level = apply(&mut buffer, Binarize::Otsu);

        assert!((50..200).contains(&level), "level {}", level);
        assert_eq!(level, 50);
        assert_eq!(buffer.get_pixel(3, 4).0[0], 0);
        assert_eq!(buffer.get_pixel(15, 4).0[0], 255);
    }

    #[test]
    fn test_otsu_uniform_image_yields_zero() {
        let mut histogram = [0u32; 256];
        histogram[100] = 64;
        assert_eq!(otsu_level(&histogram), 0);

        let mut bright = gray(8, 8, |_, _| 100);
        assert_eq!(apply(&mut bright, Binarize::Otsu), 0);
        assert!(bright.pixels().all(|p| p.0[..3] == [255, 255, 255]));

        let mut black = gray(8, 8, |_, _| 0);
        assert_eq!(apply(&mut black, Binarize::Otsu), 0);
        assert!(black.pixels().all(|p| p.0[..3] == [0, 0, 0]));
    }

    #[test]
    fn test_otsu_empty_histogram() {
        assert_eq!(otsu_level(&[0u32; 256]), 0);
    }

    #[test]
    fn test_otsu_handles_text_pattern() {
        // Dark text on light background, with some sensor noise
        let mut buffer = gray(50, 20, |x, y| {
            if y == 10 && (10..40).contains(&x) {
                20
            } else {
                240 - (x % 5) as u8
            }
        });
        let level = apply(&mut buffer, Binarize::Otsu);

        assert!(level >= 20 && level < 236, "level {}", level);
        assert_eq!(buffer.get_pixel(25, 10).0[0], 0);
        assert_eq!(buffer.get_pixel(25, 5).0[0], 255);
    }

    #[test]
    fn test_histogram_counts_luminance() {
        let buffer = PixelBuffer::from_fn(4, 1, |x, _| {
            if x < 3 {
                Rgba([30, 60, 90, 255])
            } else {
                Rgba([255, 255, 255, 0])
            }
        });
        let histogram = histogram(&buffer);
        assert_eq!(histogram[60], 3);
        assert_eq!(histogram[255], 1);
        assert_eq!(histogram.iter().sum::<u32>(), 4);
    }

    #[test]
    fn test_binarize_keeps_alpha() {
        let mut buffer = PixelBuffer::from_pixel(2, 2, Rgba([200, 200, 200, 17]));
        binarize(&mut buffer, 100);
        assert_eq!(buffer.get_pixel(1, 1), &Rgba([255, 255, 255, 17]));
    }
}
