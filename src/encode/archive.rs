use std::io::{Cursor, Write as _};

use anyhow::Context as _;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::foundation::error::{MarkbatchError, MarkbatchResult};

/// Accepts named entries in order and finalizes them into a single payload.
///
/// Ordering contract: entries are added in the order they should appear in the archive.
pub trait ArchiveWriter: Send {
    /// Append one entry.
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> MarkbatchResult<()>;
    /// Finalize and return the archive bytes.
    fn finish(self) -> MarkbatchResult<Vec<u8>>
    where
        Self: Sized;
}

/// In-memory ZIP archive.
///
/// Entries are stored uncompressed by default: PNG payloads are already compressed.
pub struct ZipArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    names: Vec<String>,
}

impl ZipArchiveWriter {
    /// Create an empty archive that stores entries without compression.
    pub fn new() -> Self {
        Self::with_compression(CompressionMethod::Stored)
    }

    /// Create an empty archive using `method` for every entry.
    pub fn with_compression(method: CompressionMethod) -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            // Fixed timestamps keep archives byte-identical across runs.
            options: SimpleFileOptions::default()
                .compression_method(method)
                .last_modified_time(zip::DateTime::default()),
            names: Vec::new(),
        }
    }

    /// Names added so far, in archive order.
    pub fn entry_names(&self) -> &[String] {
        &self.names
    }
}

impl Default for ZipArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> MarkbatchResult<()> {
        if self.names.iter().any(|n| n == name) {
            return Err(MarkbatchError::export(format!(
                "duplicate archive entry '{name}'"
            )));
        }
        self.zip
            .start_file(name, self.options)
            .with_context(|| format!("start zip entry '{name}'"))?;
        self.zip
            .write_all(bytes)
            .with_context(|| format!("write zip entry '{name}'"))?;
        self.names.push(name.to_string());
        Ok(())
    }

    fn finish(self) -> MarkbatchResult<Vec<u8>> {
        let cursor = self.zip.finish().context("finalize zip archive")?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/archive.rs"]
mod tests;
