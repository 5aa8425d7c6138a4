use crate::preprocessing::buffer::PixelBuffer;

/// 3x3 approximate Gaussian kernel, normalized by 16
const KERNEL: [[u32; 3]; 3] = [[1, 2, 1], [2, 4, 2], [1, 2, 1]];
const DIVISOR: u32 = 16;

/// Smooth the color channels with a fixed 3x3 weighted kernel
///
/// Neighbors are read from an untouched snapshot so already-blurred values
/// never feed back in. The outermost row and column on every side pass
/// through unchanged; buffers two pixels wide or tall have no interior and
/// come back as they went in.
pub fn apply(buffer: &mut PixelBuffer) {
    let (width, height) = buffer.dimensions();
    if width <= 2 || height <= 2 {
        return;
    }

    let snapshot = buffer.clone();

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sums = [0u32; 3];
            for (ky, row) in KERNEL.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    let neighbor = snapshot.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1);
                    for (sum, value) in sums.iter_mut().zip(&neighbor.0[..3]) {
                        *sum += weight * *value as u32;
                    }
                }
            }

            let pixel = buffer.get_pixel_mut(x, y);
            for (channel, sum) in pixel.0[..3].iter_mut().zip(sums) {
                // round to nearest
                *channel = ((sum + DIVISOR / 2) / DIVISOR) as u8;
            }
        }
    }
}
