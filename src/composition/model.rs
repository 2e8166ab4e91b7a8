use crate::foundation::{
    core::RasterImage,
    error::{MarkbatchError, MarkbatchResult},
};

/// User-adjustable watermark placement.
///
/// Positions are the watermark *center* as a fraction of the base image size; `scale` multiplies
/// the watermark's natural width and height.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatermarkParams {
    /// Horizontal center, `0.0..=1.0` of the base width.
    #[serde(default = "default_position")]
    pub position_x: f32,
    /// Vertical center, `0.0..=1.0` of the base height.
    #[serde(default = "default_position")]
    pub position_y: f32,
    /// Uniform multiplier on the natural watermark size (`>= 0`).
    #[serde(default = "default_scale")]
    pub scale: f32,
}

impl Default for WatermarkParams {
    fn default() -> Self {
        Self {
            position_x: default_position(),
            position_y: default_position(),
            scale: default_scale(),
        }
    }
}

impl WatermarkParams {
    /// Validate ranges: positions in `[0, 1]`, scale finite and `>= 0`.
    pub fn validate(&self) -> MarkbatchResult<()> {
        for (name, value) in [("position_x", self.position_x), ("position_y", self.position_y)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(MarkbatchError::validation(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if !self.scale.is_finite() || self.scale < 0.0 {
            return Err(MarkbatchError::validation(format!(
                "scale must be finite and >= 0, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

fn default_position() -> f32 {
    0.5
}

fn default_scale() -> f32 {
    1.0
}

/// A decoded watermark image plus its current placement parameters.
#[derive(Clone, Debug)]
pub struct WatermarkSpec {
    /// Decoded watermark raster.
    pub image: RasterImage,
    /// Placement parameters.
    pub params: WatermarkParams,
}

impl WatermarkSpec {
    /// Pair a decoded watermark with parameters.
    pub fn new(image: RasterImage, params: WatermarkParams) -> Self {
        Self { image, params }
    }
}

/// Ordered input images. Index is identity and drives output naming.
#[derive(Clone, Debug, Default)]
pub struct ImageSet {
    images: Vec<RasterImage>,
}

impl ImageSet {
    /// Wrap decoded images in supplied order.
    pub fn new(images: Vec<RasterImage>) -> Self {
        Self { images }
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Image at `index`.
    pub fn get(&self, index: usize) -> Option<&RasterImage> {
        self.images.get(index)
    }

    /// The image used for previews.
    pub fn first(&self) -> Option<&RasterImage> {
        self.images.first()
    }

    /// Iterate in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, RasterImage> {
        self.images.iter()
    }

    /// Borrow all images in index order.
    pub fn as_slice(&self) -> &[RasterImage] {
        &self.images
    }
}

impl From<Vec<RasterImage>> for ImageSet {
    fn from(images: Vec<RasterImage>) -> Self {
        Self::new(images)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/model.rs"]
mod tests;
