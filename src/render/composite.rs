use kurbo::Rect;

use crate::{
    composition::model::WatermarkSpec,
    foundation::core::RasterImage,
    foundation::error::MarkbatchResult,
    layout::placement::snapped_rect,
};

/// A single premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Premultiplied source-over: `src` drawn on top of `dst`.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));
    for i in 0..3 {
        out[i] = add_sat_u8(src[i], mul_div255(u16::from(dst[i]), inv));
    }
    out
}

/// Composite the watermark onto a fresh copy of `base`.
///
/// The watermark rectangle comes from [`snapped_rect`] (the same rounding as
/// [`crate::layout::placement::place`]) and may extend past the canvas; invisible parts are
/// clipped. Neither `base` nor `watermark.image` is modified.
pub fn composite(base: &RasterImage, watermark: &WatermarkSpec) -> MarkbatchResult<RasterImage> {
    let (bw, bh) = base.dimensions();
    let wm = &watermark.image;
    let rect = snapped_rect(
        bw,
        bh,
        wm.width(),
        wm.height(),
        watermark.params.position_x,
        watermark.params.position_y,
        watermark.params.scale,
    );

    let mut out = base.pixels().to_vec();
    draw_scaled_over(&mut out, bw, bh, wm, rect);
    RasterImage::from_premul_rgba8(bw, bh, out)
}

/// Draw `src` resampled into `rect` over the `dst_w × dst_h` premultiplied buffer.
fn draw_scaled_over(dst: &mut [u8], dst_w: u32, dst_h: u32, src: &RasterImage, rect: Rect) {
    let Some((x0, y0, x1, y1)) = visible_span(rect, dst_w, dst_h) else {
        return;
    };

    let sx_step = f64::from(src.width()) / rect.width();
    let sy_step = f64::from(src.height()) / rect.height();

    for y in y0..y1 {
        let v = (f64::from(y) - rect.y0) + 0.5;
        let sy = v * sy_step - 0.5;
        let row = (y as usize) * (dst_w as usize);
        for x in x0..x1 {
            let u = (f64::from(x) - rect.x0) + 0.5;
            let sx = u * sx_step - 0.5;
            let s = sample_bilinear(src, sx, sy);
            let i = (row + x as usize) * 4;
            let d = [dst[i], dst[i + 1], dst[i + 2], dst[i + 3]];
            dst[i..i + 4].copy_from_slice(&over(d, s));
        }
    }
}

/// Pixel span `(x0, y0, x1, y1)` (exclusive ends) of `rect` inside the canvas, clipped in `f64`.
fn visible_span(rect: Rect, canvas_w: u32, canvas_h: u32) -> Option<(u32, u32, u32, u32)> {
    // Also rejects NaN extents.
    if !(rect.width() > 0.0 && rect.height() > 0.0) {
        return None;
    }
    let x0 = rect.x0.max(0.0);
    let y0 = rect.y0.max(0.0);
    let x1 = rect.x1.min(f64::from(canvas_w));
    let y1 = rect.y1.min(f64::from(canvas_h));
    if !(x0 < x1 && y0 < y1) {
        return None;
    }
    Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
}

/// Bilinear sample of premultiplied pixels at continuous texel coordinates, clamped to the edge.
fn sample_bilinear(src: &RasterImage, sx: f64, sy: f64) -> PremulRgba8 {
    let max_x = f64::from(src.width() - 1);
    let max_y = f64::from(src.height() - 1);
    let sx = sx.clamp(0.0, max_x);
    let sy = sy.clamp(0.0, max_y);

    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;
    let x0 = x0 as u32;
    let y0 = y0 as u32;
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);

    let p00 = texel(src, x0, y0);
    let p10 = texel(src, x1, y0);
    let p01 = texel(src, x0, y1);
    let p11 = texel(src, x1, y1);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = f64::from(p00[c]) * (1.0 - fx) + f64::from(p10[c]) * fx;
        let bottom = f64::from(p01[c]) * (1.0 - fx) + f64::from(p11[c]) * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    // premultiplied invariant: color <= alpha
    for c in 0..3 {
        out[c] = out[c].min(out[3]);
    }
    out
}

fn texel(src: &RasterImage, x: u32, y: u32) -> PremulRgba8 {
    let i = ((y as usize) * (src.width() as usize) + (x as usize)) * 4;
    let p = &src.pixels()[i..i + 4];
    [p[0], p[1], p[2], p[3]]
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
