use image::imageops::{self, FilterType};

use crate::foundation::{core::RasterImage, error::MarkbatchResult};

/// Downscale `raster` to fit inside `max_w × max_h`, keeping its aspect ratio.
///
/// Returns a clone (sharing pixels) when it already fits. Never upscales. Resampling runs on the
/// premultiplied data, so transparent edges do not bleed color.
pub fn fit_within(raster: &RasterImage, max_w: u32, max_h: u32) -> MarkbatchResult<RasterImage> {
    let (w, h) = raster.dimensions();
    if max_w == 0 || max_h == 0 || (w <= max_w && h <= max_h) {
        return Ok(raster.clone());
    }

    let ratio = (f64::from(max_w) / f64::from(w)).min(f64::from(max_h) / f64::from(h));
    let nw = ((f64::from(w) * ratio).round() as u32).clamp(1, max_w);
    let nh = ((f64::from(h) * ratio).round() as u32).clamp(1, max_h);

    let buf = image::RgbaImage::from_raw(w, h, raster.pixels().to_vec())
        .ok_or_else(|| anyhow::anyhow!("raster buffer does not match its dimensions"))?;
    let resized = imageops::resize(&buf, nw, nh, FilterType::Triangle);
    RasterImage::from_premul_rgba8(nw, nh, resized.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/render/resample.rs"]
mod tests;
