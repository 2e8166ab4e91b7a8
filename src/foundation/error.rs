/// Convenience result type used across markbatch.
pub type MarkbatchResult<T> = Result<T, MarkbatchError>;

/// Top-level error taxonomy used by the pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum MarkbatchError {
    /// Invalid user-provided parameters, job files or raster data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Bytes that are not a recognized raster format, or are truncated/corrupt.
    #[error("decode error: {0}")]
    Decode(String),

    /// Export could not start or could not be delivered (no specific image at fault).
    #[error("export error: {0}")]
    Export(String),

    /// Export aborted because the image at `index` (0-based) failed to composite, encode or commit.
    #[error("export error at image index {index}: {source}")]
    ExportItem {
        /// 0-based index of the failing image.
        index: usize,
        /// Underlying failure.
        source: Box<MarkbatchError>,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MarkbatchError {
    /// Build a [`MarkbatchError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MarkbatchError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`MarkbatchError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Wrap `source` as the failure of the image at `index`.
    pub fn export_item(index: usize, source: MarkbatchError) -> Self {
        Self::ExportItem {
            index,
            source: Box::new(source),
        }
    }

    /// The failing image index for per-item export failures.
    pub fn failing_index(&self) -> Option<usize> {
        match self {
            Self::ExportItem { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Whether this error belongs to the export family (`Export` or `ExportItem`).
    pub fn is_export(&self) -> bool {
        matches!(self, Self::Export(_) | Self::ExportItem { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
