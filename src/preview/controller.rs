use std::path::{Path, PathBuf};
use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicU64, Ordering},
};

use anyhow::Context as _;

use crate::{
    composition::model::{ImageSet, WatermarkSpec},
    encode::png::encode_png,
    foundation::core::RasterImage,
    foundation::error::{MarkbatchError, MarkbatchResult},
    render::{composite::composite, resample::fit_within},
};

/// Receives published previews. Each `present` replaces the previous frame entirely.
pub trait DisplaySurface: Send {
    /// Replace the displayed frame.
    fn present(&mut self, frame: Arc<RasterImage>) -> MarkbatchResult<()>;
    /// Remove whatever is displayed.
    fn clear(&mut self) -> MarkbatchResult<()>;
}

/// In-memory display holding the latest published frame.
#[derive(Clone, Debug, Default)]
pub struct PreviewSlot {
    current: Option<Arc<RasterImage>>,
    presents: u64,
}

impl PreviewSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently displayed frame.
    pub fn current(&self) -> Option<&Arc<RasterImage>> {
        self.current.as_ref()
    }

    /// Number of frames presented so far.
    pub fn presents(&self) -> u64 {
        self.presents
    }
}

impl DisplaySurface for PreviewSlot {
    fn present(&mut self, frame: Arc<RasterImage>) -> MarkbatchResult<()> {
        self.current = Some(frame);
        self.presents += 1;
        Ok(())
    }

    fn clear(&mut self) -> MarkbatchResult<()> {
        self.current = None;
        Ok(())
    }
}

/// Writes each published preview to a PNG file, optionally downscaled to fit a box.
///
/// Files are replaced atomically (temp file + rename).
#[derive(Clone, Debug)]
pub struct PngFileDisplay {
    path: PathBuf,
    max_size: Option<(u32, u32)>,
}

impl PngFileDisplay {
    /// Display writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size: None,
        }
    }

    /// Downscale previews to fit `max_w × max_h`.
    pub fn fit_within(mut self, max_w: u32, max_h: u32) -> Self {
        self.max_size = Some((max_w, max_h));
        self
    }

    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DisplaySurface for PngFileDisplay {
    fn present(&mut self, frame: Arc<RasterImage>) -> MarkbatchResult<()> {
        let shown = match self.max_size {
            Some((w, h)) => fit_within(&frame, w, h)?,
            None => frame.as_ref().clone(),
        };
        let png = encode_png(&shown)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create preview dir '{}'", parent.display()))?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".partial");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, &png).with_context(|| format!("write '{}'", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(anyhow::Error::new(e)
                .context(format!("move preview into '{}'", self.path.display()))
                .into());
        }
        Ok(())
    }

    fn clear(&mut self) -> MarkbatchResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("remove preview '{}'", self.path.display()))
                .into()),
        }
    }
}

/// Generation number identifying one preview computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreviewTicket(pub u64);

/// Result of a preview refresh.
#[derive(Clone, Debug)]
pub enum PreviewOutcome {
    /// The composite was published to the display.
    Published(Arc<RasterImage>),
    /// No images or no watermark yet; the display was left as is.
    Skipped,
    /// A newer refresh was started meanwhile; this result was discarded.
    Superseded,
}

impl PreviewOutcome {
    /// The published frame, if any.
    pub fn published(&self) -> Option<&Arc<RasterImage>> {
        match self {
            Self::Published(frame) => Some(frame),
            _ => None,
        }
    }
}

struct DisplayState<D> {
    display: D,
    shown: Option<PreviewTicket>,
}

/// Composites the first image with the watermark and publishes it, last write wins.
///
/// Every refresh takes a ticket from a generation counter. A result is only presented when its
/// ticket is still the newest one issued; the check and the present happen under one lock, so a
/// stale frame can never replace a newer one.
pub struct PreviewController<D: DisplaySurface> {
    generation: AtomicU64,
    state: Mutex<DisplayState<D>>,
}

impl<D: DisplaySurface> PreviewController<D> {
    /// Controller publishing to `display`.
    pub fn new(display: D) -> Self {
        Self {
            generation: AtomicU64::new(0),
            state: Mutex::new(DisplayState {
                display,
                shown: None,
            }),
        }
    }

    /// Start a new computation, superseding every earlier ticket.
    pub fn begin(&self) -> PreviewTicket {
        PreviewTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` is still the newest computation.
    pub fn is_current(&self, ticket: PreviewTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Begin a computation and run it to completion.
    #[tracing::instrument(skip_all, fields(images = images.len(), has_watermark = watermark.is_some()))]
    pub fn refresh_preview(
        &self,
        images: &ImageSet,
        watermark: Option<&WatermarkSpec>,
    ) -> MarkbatchResult<PreviewOutcome> {
        let ticket = self.begin();
        self.render(ticket, images, watermark)
    }

    /// Run the computation identified by `ticket` (from [`Self::begin`]).
    ///
    /// Parameters are validated exactly as export validates them; an invalid spec is a
    /// [`MarkbatchError::Validation`] and leaves the display untouched.
    pub fn render(
        &self,
        ticket: PreviewTicket,
        images: &ImageSet,
        watermark: Option<&WatermarkSpec>,
    ) -> MarkbatchResult<PreviewOutcome> {
        let (Some(base), Some(watermark)) = (images.first(), watermark) else {
            return Ok(PreviewOutcome::Skipped);
        };
        watermark.params.validate()?;
        if !self.is_current(ticket) {
            return Ok(PreviewOutcome::Superseded);
        }
        let frame = composite(base, watermark)?;
        self.publish(ticket, Arc::new(frame))
    }

    /// Present `frame` unless a newer computation has started since `ticket` was issued.
    pub fn publish(
        &self,
        ticket: PreviewTicket,
        frame: Arc<RasterImage>,
    ) -> MarkbatchResult<PreviewOutcome> {
        let mut state = self.lock()?;
        if !self.is_current(ticket) {
            tracing::warn!(ticket = ticket.0, "discarding stale preview");
            return Ok(PreviewOutcome::Superseded);
        }
        state.display.present(frame.clone())?;
        state.shown = Some(ticket);
        tracing::debug!(
            ticket = ticket.0,
            width = frame.width(),
            height = frame.height(),
            "published preview"
        );
        Ok(PreviewOutcome::Published(frame))
    }

    /// Clear the display and supersede any in-flight computation.
    pub fn clear(&self) -> MarkbatchResult<()> {
        let ticket = self.begin();
        let mut state = self.lock()?;
        state.display.clear()?;
        state.shown = Some(ticket);
        Ok(())
    }

    /// Inspect the display.
    pub fn with_display<R>(&self, f: impl FnOnce(&D) -> R) -> MarkbatchResult<R> {
        let state = self.lock()?;
        Ok(f(&state.display))
    }

    /// Ticket of the frame currently presented.
    pub fn shown(&self) -> MarkbatchResult<Option<PreviewTicket>> {
        Ok(self.lock()?.shown)
    }

    fn lock(&self) -> MarkbatchResult<MutexGuard<'_, DisplayState<D>>> {
        self.state
            .lock()
            .map_err(|_| MarkbatchError::validation("preview display lock poisoned"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/preview/controller.rs"]
mod tests;
