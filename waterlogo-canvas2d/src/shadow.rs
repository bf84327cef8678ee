//! Separable Gaussian blur for text shadows.
//!
//! Works on premultiplied RGBA8 buffers with a Q16 fixed-point kernel. Samples
//! outside the buffer count as transparent, so a shadow fades out at its edges
//! instead of smearing the border pixels.

const Q16_ONE: u32 = 1 << 16;

/// Canvas `shadowBlur` maps to a Gaussian with sigma equal to half the blur.
pub(crate) fn sigma_for_blur(blur: f32) -> f32 {
    blur.max(0.0) / 2.0
}

/// Extra pixels a blur of `sigma` spreads beyond the shape.
pub(crate) fn blur_margin(sigma: f32) -> u32 {
    (sigma * 3.0).ceil() as u32
}

/// Normalized Gaussian weights in Q16, length `2 * radius + 1`.
fn gaussian_kernel_q16(sigma: f32) -> Vec<u32> {
    let radius = blur_margin(sigma) as i32;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let weights: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / two_sigma_sq).exp())
        .collect();
    let sum: f32 = weights.iter().sum();

    let mut kernel: Vec<u32> = weights
        .iter()
        .map(|w| ((w / sum) * Q16_ONE as f32).round() as u32)
        .collect();

    // Rounding drift goes to the center tap so the kernel sums to exactly one.
    let total: u32 = kernel.iter().sum();
    let center = radius as usize;
    if total > Q16_ONE {
        kernel[center] -= total - Q16_ONE;
    } else {
        kernel[center] += Q16_ONE - total;
    }
    kernel
}

/// Blur a premultiplied RGBA8 buffer in place.
pub(crate) fn blur_rgba8_premul(data: &mut [u8], width: u32, height: u32, sigma: f32) {
    if sigma <= 0.0 || width == 0 || height == 0 {
        return;
    }
    let kernel = gaussian_kernel_q16(sigma);
    let mut scratch = vec![0u8; data.len()];
    horizontal_pass(data, &mut scratch, width as usize, height as usize, &kernel);
    vertical_pass(&scratch, data, width as usize, height as usize, &kernel);
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: usize, height: usize, kernel: &[u32]) {
    let radius = (kernel.len() / 2) as isize;
    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            let mut acc = [0u32; 4];
            for (k, weight) in kernel.iter().enumerate() {
                let sx = x as isize + k as isize - radius;
                if sx < 0 || sx >= width as isize {
                    continue;
                }
                let idx = (row + sx as usize) * 4;
                for c in 0..4 {
                    acc[c] += src[idx + c] as u32 * weight;
                }
            }
            let out = (row + x) * 4;
            for c in 0..4 {
                dst[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: usize, height: usize, kernel: &[u32]) {
    let radius = (kernel.len() / 2) as isize;
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0u32; 4];
            for (k, weight) in kernel.iter().enumerate() {
                let sy = y as isize + k as isize - radius;
                if sy < 0 || sy >= height as isize {
                    continue;
                }
                let idx = (sy as usize * width + x) * 4;
                for c in 0..4 {
                    acc[c] += src[idx + c] as u32 * weight;
                }
            }
            let out = (y * width + x) * 4;
            for c in 0..4 {
                dst[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(v: u32) -> u8 {
    ((v + (Q16_ONE / 2)) >> 16).min(255) as u8
}
