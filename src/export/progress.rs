/// Completed/total counters for one export run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ExportProgress {
    /// Items committed so far.
    pub completed: usize,
    /// Items in the run.
    pub total: usize,
}

impl ExportProgress {
    /// The idle state, `{0, 0}`.
    pub fn idle() -> Self {
        Self::default()
    }

    /// A fresh run over `total` items.
    pub fn start(total: usize) -> Self {
        Self {
            completed: 0,
            total,
        }
    }

    /// Whether no run is in progress.
    pub fn is_idle(self) -> bool {
        self.total == 0
    }

    /// `completed / total` as a percentage rounded to the nearest integer; 0 when idle.
    pub fn percent(self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let completed = self.completed.min(self.total) as f64;
        ((completed / self.total as f64) * 100.0).round() as u8
    }
}

/// Receives progress for export runs.
///
/// Contract per run: `reset` once before the first item, `update` once per committed item with
/// non-decreasing `completed`, then `reset` again after completion or failure.
pub trait ProgressObserver: Send {
    /// One more item has been committed.
    fn update(&mut self, progress: ExportProgress);
    /// Back to idle (percentage 0).
    fn reset(&mut self);
}

/// Any `FnMut(u8)` receives the rounded percentage; `reset` delivers 0.
impl<F> ProgressObserver for F
where
    F: FnMut(u8) + Send,
{
    fn update(&mut self, progress: ExportProgress) {
        self(progress.percent())
    }

    fn reset(&mut self) {
        self(0)
    }
}

/// Tracks a single run and forwards changes to an observer, guaranteeing monotonic updates.
pub(crate) struct ProgressTracker<'a> {
    state: ExportProgress,
    observer: &'a mut dyn ProgressObserver,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn begin(observer: &'a mut dyn ProgressObserver, total: usize) -> Self {
        observer.reset();
        Self {
            state: ExportProgress::start(total),
            observer,
        }
    }

    /// Record that item `index` (0-based) has been committed.
    pub(crate) fn committed(&mut self, index: usize) {
        let completed = index + 1;
        debug_assert!(completed > self.state.completed, "progress must not decrease");
        self.state.completed = completed.max(self.state.completed);
        self.observer.update(self.state);
    }

    pub(crate) fn state(&self) -> ExportProgress {
        self.state
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/progress.rs"]
mod tests;
