use crate::assets::decode::DecodedImage;
use crate::effects::transitions::CompositeParams;
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::foundation::math::{mul_div255_u8, opacity_u8};

pub type PremulRgba8 = [u8; 4];

/// Source-over for one premultiplied pixel, with `src` scaled by `op / 255`.
pub fn over_px(dst: PremulRgba8, src: PremulRgba8, op: u16) -> PremulRgba8 {
    if op == 0 || src[3] == 0 {
        return dst;
    }
    if op == 255 && src[3] == 255 {
        return src;
    }

    let sa = mul_div255_u8(u16::from(src[3]), op);
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Composite a same-sized premultiplied layer over `dst` at `opacity`.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> AssemblyResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(AssemblyError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    let op = opacity_u8(opacity);
    if op == 0 {
        return Ok(());
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over_px([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], op);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Draw `img` over a `width`x`height` premultiplied buffer.
///
/// The image is stretched to the full frame, scaled about the frame centre by `params.scale` and
/// shifted right by `params.x_offset_px`, then sampled nearest-neighbour and blended at
/// `params.opacity`. Blur is not applied here.
pub fn draw_image_over(
    dst: &mut [u8],
    width: u32,
    height: u32,
    img: &DecodedImage,
    params: &CompositeParams,
) -> AssemblyResult<()> {
    let expected = (width as usize) * (height as usize) * 4;
    if dst.len() != expected {
        return Err(AssemblyError::render(format!(
            "draw_image_over: buffer is {} bytes, expected {expected}",
            dst.len()
        )));
    }
    if img.rgba8_premul.len() != (img.width as usize) * (img.height as usize) * 4 {
        return Err(AssemblyError::render("decoded image buffer size mismatch"));
    }
    let op = opacity_u8(params.opacity);
    if op == 0 {
        return Ok(());
    }
    let scale = if params.scale.is_finite() && params.scale > 0.0 {
        f64::from(params.scale)
    } else {
        return Err(AssemblyError::render("scale must be finite and > 0"));
    };
    let x_offset = if params.x_offset_px.is_finite() {
        f64::from(params.x_offset_px)
    } else {
        0.0
    };

    let (w, h) = (f64::from(width), f64::from(height));
    let rw = w * scale;
    let rh = h * scale;
    let x0 = (w - rw) / 2.0 + x_offset;
    let y0 = (h - rh) / 2.0;
    let (iw, ih) = (img.width as usize, img.height as usize);
    let src = img.rgba8_premul.as_slice();

    for y in 0..height as usize {
        let fy = (y as f64 + 0.5 - y0) / rh;
        if !(0.0..1.0).contains(&fy) {
            continue;
        }
        let sy = ((fy * ih as f64) as usize).min(ih - 1);
        let row = y * width as usize * 4;
        for x in 0..width as usize {
            let fx = (x as f64 + 0.5 - x0) / rw;
            if !(0.0..1.0).contains(&fx) {
                continue;
            }
            let sx = ((fx * iw as f64) as usize).min(iw - 1);
            let si = (sy * iw + sx) * 4;
            let di = row + x * 4;
            let s = [src[si], src[si + 1], src[si + 2], src[si + 3]];
            let d = [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]];
            dst[di..di + 4].copy_from_slice(&over_px(d, s, op));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
