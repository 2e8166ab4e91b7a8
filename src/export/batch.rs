use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc,
};

use rayon::prelude::*;

use crate::{
    composition::model::{ImageSet, WatermarkSpec},
    encode::{archive::ArchiveWriter, png::encode_png},
    export::{
        progress::{ProgressObserver, ProgressTracker},
        sink::BlobSink,
    },
    foundation::error::{MarkbatchError, MarkbatchResult},
    render::composite::composite,
};

/// Suggested file name for the delivered archive.
pub const ARCHIVE_NAME: &str = "watermarked_images.zip";

/// Environment variable overriding [`ExportThreading::threads`].
pub const THREADS_ENV: &str = "MARKBATCH_THREADS";

/// Archive entry name for the image at `index` (0-based): `watermarked_image_{index + 1}.png`.
pub fn entry_name(index: usize) -> String {
    format!("watermarked_image_{}.png", index + 1)
}

/// Options controlling how export work is scheduled.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportThreading {
    /// Render and encode items on a dedicated rayon pool.
    pub parallel: bool,
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Bounded channel capacity between render workers and the commit thread.
    pub channel_capacity: usize,
}

impl Default for ExportThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            channel_capacity: 4,
        }
    }
}

impl ExportThreading {
    /// Apply `MARKBATCH_THREADS` when set to a positive integer; it also enables `parallel`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = std::env::var(THREADS_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
        {
            self.threads = Some(n);
            self.parallel = true;
        }
        self
    }

    /// Reject `threads == Some(0)`.
    pub fn validate(&self) -> MarkbatchResult<()> {
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(MarkbatchError::validation(
                "export threading 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

/// Summary of a successful export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportReport {
    /// Entry names in archive order.
    pub entries: Vec<String>,
    /// Size of the delivered archive.
    pub archive_bytes: usize,
    /// Name the archive was delivered under.
    pub archive_name: String,
}

/// Renders every image of a set with one watermark and packages the results.
///
/// Archive entries and progress updates always follow image order. With
/// [`ExportThreading::parallel`], out-of-order worker completion is reordered at the commit
/// boundary (bounded channel backpressure).
#[derive(Clone, Debug, Default)]
pub struct BatchExporter {
    threading: ExportThreading,
}

impl BatchExporter {
    /// Exporter with the given scheduling options.
    pub fn new(threading: ExportThreading) -> Self {
        Self { threading }
    }

    /// Scheduling options in use.
    pub fn threading(&self) -> &ExportThreading {
        &self.threading
    }

    /// Composite, encode and archive every image, then deliver the archive to `sink`.
    ///
    /// On any failure nothing is delivered, `archive` is dropped unfinished, and the observer is
    /// reset to idle. A failing item is reported as [`MarkbatchError::ExportItem`] naming its index.
    #[tracing::instrument(skip_all, fields(images = images.len(), parallel = self.threading.parallel))]
    pub fn export_all<A, S>(
        &self,
        images: &ImageSet,
        watermark: &WatermarkSpec,
        archive: A,
        sink: &mut S,
        observer: &mut dyn ProgressObserver,
    ) -> MarkbatchResult<ExportReport>
    where
        A: ArchiveWriter,
        S: BlobSink + ?Sized,
    {
        if images.is_empty() {
            return Err(MarkbatchError::export("no images to export"));
        }
        watermark
            .params
            .validate()
            .map_err(|e| MarkbatchError::export(format!("invalid watermark parameters: {e}")))?;
        self.threading.validate()?;

        let res = self.run(images, watermark, archive, sink, observer);
        // Whatever happened, the observer ends idle.
        observer.reset();
        match &res {
            Ok(report) => tracing::info!(
                entries = report.entries.len(),
                bytes = report.archive_bytes,
                "export finished"
            ),
            Err(e) => tracing::warn!(error = %e, "export aborted"),
        }
        res
    }

    fn run<A, S>(
        &self,
        images: &ImageSet,
        watermark: &WatermarkSpec,
        archive: A,
        sink: &mut S,
        observer: &mut dyn ProgressObserver,
    ) -> MarkbatchResult<ExportReport>
    where
        A: ArchiveWriter,
        S: BlobSink + ?Sized,
    {
        let (archive, entries) = if self.threading.parallel {
            let pool = build_thread_pool(self.threading.threads)?;
            self.commit_parallel(images, watermark, archive, observer, &pool)?
        } else {
            commit_sequential(images, watermark, archive, observer)?
        };

        let payload = archive
            .finish()
            .map_err(|e| MarkbatchError::export(format!("finalize archive: {e}")))?;
        let archive_bytes = payload.len();
        sink.deliver(payload, ARCHIVE_NAME)
            .map_err(|e| MarkbatchError::export(format!("deliver archive: {e}")))?;

        Ok(ExportReport {
            entries,
            archive_bytes,
            archive_name: ARCHIVE_NAME.to_string(),
        })
    }

    fn commit_parallel<A: ArchiveWriter>(
        &self,
        images: &ImageSet,
        watermark: &WatermarkSpec,
        mut archive: A,
        observer: &mut dyn ProgressObserver,
        pool: &rayon::ThreadPool,
    ) -> MarkbatchResult<(A, Vec<String>)> {
        let total = images.len();
        let cap = self.threading.channel_capacity.max(1);
        let aborted = AtomicBool::new(false);

        // Commit thread: enforce in-order archive insertion and progress regardless of render
        // completion order.
        std::thread::scope(|scope| -> MarkbatchResult<(A, Vec<String>)> {
            let (tx, rx) = mpsc::sync_channel::<EntryMsg>(cap);
            let aborted_ref = &aborted;

            let committer = scope.spawn(move || -> MarkbatchResult<(A, Vec<String>)> {
                let res = commit_in_order(&rx, &mut archive, observer, total);
                if res.is_err() {
                    aborted_ref.store(true, Ordering::SeqCst);
                }
                drop(rx);
                res.map(|entries| (archive, entries))
            });

            let produce_res = pool.install(|| {
                (0..total).into_par_iter().try_for_each_with(tx, |tx, index| {
                    if aborted.load(Ordering::SeqCst) {
                        return Err(MarkbatchError::export("export aborted"));
                    }
                    let encoded = render_entry(images, watermark, index);
                    tx.send(EntryMsg { index, encoded }).map_err(|_| {
                        MarkbatchError::export("commit thread is not accepting entries")
                    })
                })
            });

            let commit_res = committer
                .join()
                .map_err(|_| MarkbatchError::export("commit thread panicked"))?;

            // The commit thread owns the authoritative failure (first failing index in order).
            match (commit_res, produce_res) {
                (Err(e), _) => Err(e),
                (Ok(_), Err(e)) => Err(e),
                (Ok(done), Ok(())) => Ok(done),
            }
        })
    }
}

#[derive(Debug)]
struct EntryMsg {
    index: usize,
    encoded: MarkbatchResult<Vec<u8>>,
}

/// Receive rendered entries in any order and commit them strictly by index.
fn commit_in_order<A: ArchiveWriter>(
    rx: &mpsc::Receiver<EntryMsg>,
    archive: &mut A,
    observer: &mut dyn ProgressObserver,
    total: usize,
) -> MarkbatchResult<Vec<String>> {
    let mut tracker = ProgressTracker::begin(observer, total);
    let mut entries = Vec::with_capacity(total);
    let mut pending = HashMap::<usize, MarkbatchResult<Vec<u8>>>::new();
    let mut next = 0usize;
    while next < total {
        if let Some(encoded) = pending.remove(&next) {
            commit_entry(archive, &mut tracker, &mut entries, next, encoded)?;
            next += 1;
            continue;
        }

        let msg = rx
            .recv()
            .map_err(|_| MarkbatchError::export("render workers stopped unexpectedly"))?;
        pending.insert(msg.index, msg.encoded);
    }
    Ok(entries)
}

fn commit_sequential<A: ArchiveWriter>(
    images: &ImageSet,
    watermark: &WatermarkSpec,
    mut archive: A,
    observer: &mut dyn ProgressObserver,
) -> MarkbatchResult<(A, Vec<String>)> {
    let mut tracker = ProgressTracker::begin(observer, images.len());
    let mut entries = Vec::with_capacity(images.len());
    for index in 0..images.len() {
        let encoded = render_entry(images, watermark, index);
        commit_entry(&mut archive, &mut tracker, &mut entries, index, encoded)?;
    }
    Ok((archive, entries))
}

/// Composite + encode one item. Pure with respect to shared inputs.
fn render_entry(
    images: &ImageSet,
    watermark: &WatermarkSpec,
    index: usize,
) -> MarkbatchResult<Vec<u8>> {
    let base = images
        .get(index)
        .ok_or_else(|| MarkbatchError::export(format!("image index {index} out of range")))?;
    let composed = composite(base, watermark)?;
    encode_png(&composed)
}

fn commit_entry<A: ArchiveWriter>(
    archive: &mut A,
    tracker: &mut ProgressTracker<'_>,
    entries: &mut Vec<String>,
    index: usize,
    encoded: MarkbatchResult<Vec<u8>>,
) -> MarkbatchResult<()> {
    let bytes = encoded.map_err(|e| MarkbatchError::export_item(index, e))?;
    let name = entry_name(index);
    archive
        .add_entry(&name, &bytes)
        .map_err(|e| MarkbatchError::export_item(index, e))?;
    tracker.committed(index);
    tracing::debug!(index, entry = %name, percent = tracker.state().percent(), "committed entry");
    entries.push(name);
    Ok(())
}

fn build_thread_pool(threads: Option<usize>) -> MarkbatchResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MarkbatchError::validation(
            "export threading 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MarkbatchError::export(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/export/batch.rs"]
mod tests;
