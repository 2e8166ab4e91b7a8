use kurbo::Rect;

use crate::foundation::core::DrawRect;

/// Exact (unrounded) watermark rectangle on a `canvas_w × canvas_h` canvas.
///
/// `position_x`/`position_y` are the watermark center as a fraction of the *canvas* size; `scale`
/// multiplies the watermark's natural size. Negative or NaN scale behaves like 0.
pub fn placement_rect(
    canvas_w: u32,
    canvas_h: u32,
    wm_w: u32,
    wm_h: u32,
    position_x: f32,
    position_y: f32,
    scale: f32,
) -> Rect {
    let scale = f64::from(scale).max(0.0);
    let w = f64::from(wm_w) * scale;
    let h = f64::from(wm_h) * scale;
    let cx = f64::from(canvas_w) * f64::from(position_x);
    let cy = f64::from(canvas_h) * f64::from(position_y);
    Rect::from_origin_size((cx - w / 2.0, cy - h / 2.0), (w, h))
}

/// Watermark rectangle snapped to whole pixels, still in `f64`.
///
/// Origin and size are rounded half away from zero. Sizes are not limited to `u32`, so very large
/// scales keep a far edge on the correct side of the canvas.
pub fn snapped_rect(
    canvas_w: u32,
    canvas_h: u32,
    wm_w: u32,
    wm_h: u32,
    position_x: f32,
    position_y: f32,
    scale: f32,
) -> Rect {
    let r = placement_rect(canvas_w, canvas_h, wm_w, wm_h, position_x, position_y, scale);
    Rect::from_origin_size(
        (r.x0.round(), r.y0.round()),
        (r.width().round(), r.height().round()),
    )
}

/// Integer draw rectangle for the watermark; never clamped to the canvas.
///
/// Edges and size are rounded half away from zero. `scale == 0` yields a `0×0` rectangle. Sizes
/// saturate at `u32::MAX`; rasterizing uses [`snapped_rect`] instead.
pub fn place(
    canvas_w: u32,
    canvas_h: u32,
    wm_w: u32,
    wm_h: u32,
    position_x: f32,
    position_y: f32,
    scale: f32,
) -> DrawRect {
    let r = snapped_rect(canvas_w, canvas_h, wm_w, wm_h, position_x, position_y, scale);
    DrawRect {
        x: round_i64(r.x0),
        y: round_i64(r.y0),
        width: round_u32(r.width()),
        height: round_u32(r.height()),
    }
}

fn round_i64(v: f64) -> i64 {
    if v.is_finite() { v.round() as i64 } else { 0 }
}

fn round_u32(v: f64) -> u32 {
    if v.is_finite() {
        v.round().clamp(0.0, f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/placement.rs"]
mod tests;
