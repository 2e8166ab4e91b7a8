use std::sync::Arc;

use crate::foundation::error::{MarkbatchError, MarkbatchResult};

/// A decoded raster: premultiplied RGBA8, row-major, tightly packed.
///
/// Pixel storage is shared behind an [`Arc`] and never mutated after construction, so cloning is
/// cheap and every compositing step writes into a freshly allocated surface instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
}

impl RasterImage {
    /// Build a raster from premultiplied RGBA8 bytes.
    ///
    /// Fails when either dimension is zero or the buffer length is not `width * height * 4`.
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> MarkbatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(MarkbatchError::validation("raster width/height must be > 0"));
        }
        let expected = byte_len(width, height)?;
        if rgba8_premul.len() != expected {
            return Err(MarkbatchError::validation(format!(
                "raster buffer must be width*height*4 = {expected} bytes, got {}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// A raster filled with a single premultiplied pixel value.
    pub fn solid(width: u32, height: u32, px: [u8; 4]) -> MarkbatchResult<Self> {
        let len = byte_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..(len / 4) {
            data.extend_from_slice(&px);
        }
        Self::from_premul_rgba8(width, height, data)
    }

    /// Natural width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Natural height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Premultiplied RGBA8 pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.rgba8_premul
    }

    /// Pixel at `(x, y)`; `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = &self.rgba8_premul[i..i + 4];
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Whether `self` and `other` share the same pixel allocation.
    pub fn shares_pixels_with(&self, other: &RasterImage) -> bool {
        Arc::ptr_eq(&self.rgba8_premul, &other.rgba8_premul)
    }
}

/// Integer draw rectangle in canvas pixels. May extend past the canvas on any side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DrawRect {
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl DrawRect {
    /// Whether the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersection with a `canvas_w × canvas_h` canvas as `(x0, y0, x1, y1)` (exclusive ends),
    /// or `None` when nothing is visible.
    pub fn clip_to(self, canvas_w: u32, canvas_h: u32) -> Option<(u32, u32, u32, u32)> {
        if self.is_empty() {
            return None;
        }
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + i64::from(self.width)).min(i64::from(canvas_w));
        let y1 = (self.y + i64::from(self.height)).min(i64::from(canvas_h));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

fn byte_len(width: u32, height: u32) -> MarkbatchResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| MarkbatchError::validation("raster buffer size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
