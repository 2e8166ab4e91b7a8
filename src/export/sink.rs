use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{MarkbatchError, MarkbatchResult};

/// Delivers a finalized archive payload to the user.
pub trait BlobSink {
    /// Hand over `payload` under `suggested_name`.
    fn deliver(&mut self, payload: Vec<u8>, suggested_name: &str) -> MarkbatchResult<()>;
}

/// Writes payloads as files inside a directory.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    overwrite: bool,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Sink writing into `dir` (created on first delivery).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overwrite: false,
            written: Vec::new(),
        }
    }

    /// Allow replacing existing files.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl BlobSink for DirectorySink {
    fn deliver(&mut self, payload: Vec<u8>, suggested_name: &str) -> MarkbatchResult<()> {
        if suggested_name.is_empty() || suggested_name.contains(['/', '\\']) || suggested_name == ".."
        {
            return Err(MarkbatchError::validation(format!(
                "blob name must be a plain file name, got '{suggested_name}'"
            )));
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output dir '{}'", self.dir.display()))?;

        let path = self.dir.join(suggested_name);
        if path.exists() && !self.overwrite {
            return Err(MarkbatchError::export(format!(
                "'{}' already exists (overwrite disabled)",
                path.display()
            )));
        }

        // Write next to the target and rename so readers never see a partial file.
        let tmp = self.dir.join(format!(".{suggested_name}.partial"));
        std::fs::write(&tmp, &payload)
            .with_context(|| format!("write '{}'", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(anyhow::Error::new(e)
                .context(format!("move '{}' into place", path.display()))
                .into());
        }

        tracing::info!(path = %path.display(), bytes = payload.len(), "delivered archive");
        self.written.push(path);
        Ok(())
    }
}

/// Keeps delivered payloads in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    deliveries: Vec<(String, Vec<u8>)>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(name, payload)` delivered so far.
    pub fn deliveries(&self) -> &[(String, Vec<u8>)] {
        &self.deliveries
    }

    /// The most recent delivery.
    pub fn last(&self) -> Option<&(String, Vec<u8>)> {
        self.deliveries.last()
    }
}

impl BlobSink for MemorySink {
    fn deliver(&mut self, payload: Vec<u8>, suggested_name: &str) -> MarkbatchResult<()> {
        self.deliveries.push((suggested_name.to_string(), payload));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/sink.rs"]
mod tests;
