//! markbatch applies one watermark image onto a batch of images.
//!
//! The crate is organised as a small pipeline:
//!
//! 1. **Decode**: bytes -> [`RasterImage`] (premultiplied RGBA8), see [`decode_image`].
//! 2. **Place**: pure placement of the watermark rectangle, see [`place`].
//! 3. **Composite**: base + watermark -> fresh [`RasterImage`], see [`composite`].
//! 4. **Preview**: composite the first image on every parameter change and publish it with
//!    last-write-wins semantics, see [`PreviewController`] and [`WatermarkSession`].
//! 5. **Export**: composite + PNG-encode every image, commit entries in index order into a ZIP
//!    archive, report progress and deliver the payload, see [`BatchExporter`].
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: placement and compositing are pure; preview and export share one code path.
//! - **Fresh surfaces**: every composite allocates its own output, inputs are never mutated.
//! - **Ordered commits**: archive entries and progress follow image order even when items are
//!   rendered in parallel.
#![forbid(unsafe_code)]

mod assets;
mod composition;
mod encode;
mod export;
mod foundation;
mod layout;
mod preview;
mod render;

pub use assets::decode::{decode_image, decode_image_set};
pub use composition::job::ExportJob;
pub use composition::model::{ImageSet, WatermarkParams, WatermarkSpec};
pub use encode::archive::{ArchiveWriter, ZipArchiveWriter};
pub use encode::png::encode_png;
pub use export::batch::{
    ARCHIVE_NAME, BatchExporter, ExportReport, ExportThreading, entry_name,
};
pub use export::progress::{ExportProgress, ProgressObserver};
pub use export::sink::{BlobSink, DirectorySink, MemorySink};
pub use foundation::core::{DrawRect, RasterImage};
pub use foundation::error::{MarkbatchError, MarkbatchResult};
pub use layout::placement::{place, placement_rect, snapped_rect};
pub use preview::controller::{
    DisplaySurface, PngFileDisplay, PreviewController, PreviewOutcome, PreviewSlot, PreviewTicket,
};
pub use preview::session::WatermarkSession;
pub use render::composite::{composite, over};
pub use render::resample::fit_within;
