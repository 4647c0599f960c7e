//! Separable gaussian blur over premultiplied RGBA8, in 16.16 fixed point.

use crate::foundation::error::{AssemblyError, AssemblyResult};

/// Kernel radius for a blur of `blur_px`. Zero means no blur.
pub fn blur_radius(blur_px: f32) -> u32 {
    if !blur_px.is_finite() || blur_px <= 0.0 {
        return 0;
    }
    blur_px.round().min(256.0) as u32
}

/// Normalized gaussian weights for `radius`, summing to exactly `1 << 16`.
pub fn gaussian_kernel_q16(radius: u32, sigma: f32) -> AssemblyResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(AssemblyError::validation("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(AssemblyError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

/// Reusable scratch for [`blur_in_place`].
#[derive(Default)]
pub struct BlurScratch {
    tmp: Vec<u8>,
    kernel: Vec<u32>,
    kernel_radius: u32,
}

/// Blur `buf` in place with a radius of `round(blur_px)` and `sigma = radius / 2`.
///
/// Edges clamp to the nearest pixel. A radius of zero leaves `buf` untouched.
pub fn blur_in_place(
    buf: &mut [u8],
    width: u32,
    height: u32,
    blur_px: f32,
    scratch: &mut BlurScratch,
) -> AssemblyResult<()> {
    let radius = blur_radius(blur_px);
    if radius == 0 {
        return Ok(());
    }
    if buf.len() != (width as usize) * (height as usize) * 4 {
        return Err(AssemblyError::render("blur buffer size mismatch"));
    }
    if scratch.kernel.is_empty() || scratch.kernel_radius != radius {
        scratch.kernel = gaussian_kernel_q16(radius, radius as f32 / 2.0)?;
        scratch.kernel_radius = radius;
    }
    scratch.tmp.resize(buf.len(), 0);

    horizontal_blur_q16(buf, &mut scratch.tmp, width, height, &scratch.kernel);
    vertical_blur_q16(&scratch.tmp, buf, width, height, &scratch.kernel);
    Ok(())
}

fn horizontal_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = i64::from(width);
    for y in 0..i64::from(height) {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i64 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = i64::from(width);
    let h = i64::from(height);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i64 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
