use std::io::Cursor;

use anyhow::Context as _;

use crate::foundation::{core::RasterImage, error::MarkbatchResult};

/// Encode a raster as PNG (straight-alpha RGBA8), the fixed export format.
pub fn encode_png(raster: &RasterImage) -> MarkbatchResult<Vec<u8>> {
    let rgba = to_straight_rgba8(raster)?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Convert a premultiplied raster to a straight-alpha `RgbaImage`.
fn to_straight_rgba8(raster: &RasterImage) -> MarkbatchResult<image::RgbaImage> {
    let mut data = raster.pixels().to_vec();
    unpremultiply_rgba8_in_place(&mut data);
    let rgba = image::RgbaImage::from_raw(raster.width(), raster.height(), data)
        .ok_or_else(|| anyhow::anyhow!("raster buffer does not match its dimensions"))?;
    Ok(rgba)
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = (((*c as u16).min(a) * 255 + a / 2) / a) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
