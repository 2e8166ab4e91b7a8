use crate::{
    composition::model::{ImageSet, WatermarkParams, WatermarkSpec},
    encode::archive::ArchiveWriter,
    export::{
        batch::{BatchExporter, ExportReport},
        progress::ProgressObserver,
        sink::BlobSink,
    },
    foundation::core::RasterImage,
    foundation::error::{MarkbatchError, MarkbatchResult},
    preview::controller::{DisplaySurface, PreviewController, PreviewOutcome},
};

/// Editing state for one watermarking session.
///
/// Holds the current images, watermark and parameters. Every change triggers a preview refresh;
/// exporting reads the same state so the archive matches what the preview shows.
pub struct WatermarkSession<D: DisplaySurface> {
    images: ImageSet,
    watermark: Option<RasterImage>,
    params: WatermarkParams,
    preview: PreviewController<D>,
}

impl<D: DisplaySurface> WatermarkSession<D> {
    /// Empty session publishing previews to `display`.
    pub fn new(display: D) -> Self {
        Self {
            images: ImageSet::default(),
            watermark: None,
            params: WatermarkParams::default(),
            preview: PreviewController::new(display),
        }
    }

    /// Replace the image set.
    pub fn set_images(&mut self, images: ImageSet) -> MarkbatchResult<PreviewOutcome> {
        self.images = images;
        self.refresh()
    }

    /// Replace the watermark image.
    pub fn set_watermark(&mut self, watermark: RasterImage) -> MarkbatchResult<PreviewOutcome> {
        self.watermark = Some(watermark);
        self.refresh()
    }

    /// Replace all parameters at once. Invalid parameters leave the session unchanged.
    pub fn set_params(&mut self, params: WatermarkParams) -> MarkbatchResult<PreviewOutcome> {
        params.validate()?;
        self.params = params;
        self.refresh()
    }

    /// Move the watermark center horizontally (`0.0..=1.0`).
    pub fn set_position_x(&mut self, x: f32) -> MarkbatchResult<PreviewOutcome> {
        self.set_params(WatermarkParams {
            position_x: x,
            ..self.params
        })
    }

    /// Move the watermark center vertically (`0.0..=1.0`).
    pub fn set_position_y(&mut self, y: f32) -> MarkbatchResult<PreviewOutcome> {
        self.set_params(WatermarkParams {
            position_y: y,
            ..self.params
        })
    }

    /// Change the watermark scale (`>= 0`).
    pub fn set_scale(&mut self, scale: f32) -> MarkbatchResult<PreviewOutcome> {
        self.set_params(WatermarkParams {
            scale,
            ..self.params
        })
    }

    pub fn images(&self) -> &ImageSet {
        &self.images
    }

    pub fn params(&self) -> WatermarkParams {
        self.params
    }

    /// The watermark with current parameters, once one is loaded.
    pub fn current_spec(&self) -> Option<WatermarkSpec> {
        self.watermark
            .as_ref()
            .map(|image| WatermarkSpec::new(image.clone(), self.params))
    }

    /// The preview controller (and through it, the display).
    pub fn preview(&self) -> &PreviewController<D> {
        &self.preview
    }

    /// Recompute the preview from the current state.
    pub fn refresh(&self) -> MarkbatchResult<PreviewOutcome> {
        let spec = self.current_spec();
        self.preview.refresh_preview(&self.images, spec.as_ref())
    }

    /// Export every image with the current watermark and parameters.
    pub fn export<A, S>(
        &self,
        exporter: &BatchExporter,
        archive: A,
        sink: &mut S,
        observer: &mut dyn ProgressObserver,
    ) -> MarkbatchResult<ExportReport>
    where
        A: ArchiveWriter,
        S: BlobSink + ?Sized,
    {
        let spec = self
            .current_spec()
            .ok_or_else(|| MarkbatchError::export("no watermark loaded"))?;
        exporter.export_all(&self.images, &spec, archive, sink, observer)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/preview/session.rs"]
mod tests;
