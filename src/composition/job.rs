use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::{
    assets::decode::{decode_image, decode_image_set},
    composition::model::{ImageSet, WatermarkParams, WatermarkSpec},
    export::batch::ExportThreading,
    foundation::error::{MarkbatchError, MarkbatchResult},
};

/// A batch export described as JSON.
///
/// ```json
/// { "images": ["a.png", "b.jpg"], "watermark": "logo.png",
///   "params": { "position_x": 0.9, "scale": 0.5 }, "output_dir": "out" }
/// ```
///
/// Relative paths are resolved against a root directory, usually the job file's directory.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportJob {
    /// Base images in export order.
    pub images: Vec<PathBuf>,
    /// Watermark image.
    pub watermark: PathBuf,
    #[serde(default)]
    pub params: WatermarkParams,
    /// Directory receiving the archive. Defaults to the resolution root.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Replace an existing archive in `output_dir`.
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub threading: ExportThreading,
}

impl ExportJob {
    /// Parse a job from a JSON reader. Paths are left as written.
    pub fn from_reader<R: std::io::Read>(r: R) -> MarkbatchResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| MarkbatchError::validation(format!("parse export job JSON: {e}")))
    }

    /// Parse a job file and resolve its relative paths against the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> MarkbatchResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MarkbatchError::validation(format!("open export job '{}': {e}", path.display()))
        })?;
        let job = Self::from_reader(BufReader::new(f))?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(job.resolve(root))
    }

    /// Make every relative path absolute with respect to `root`; fills in `output_dir`.
    pub fn resolve(mut self, root: &Path) -> Self {
        let join = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };
        self.images = self.images.iter().map(|p| join(p)).collect();
        self.watermark = join(&self.watermark);
        self.output_dir = Some(match &self.output_dir {
            Some(dir) => join(dir),
            None => root.to_path_buf(),
        });
        self
    }

    pub fn validate(&self) -> MarkbatchResult<()> {
        if self.images.is_empty() {
            return Err(MarkbatchError::validation(
                "export job must list at least one image",
            ));
        }
        self.params.validate()?;
        self.threading.validate()
    }

    /// Read and decode the images and the watermark.
    #[tracing::instrument(skip(self), fields(images = self.images.len()))]
    pub fn load_sources(&self) -> MarkbatchResult<(ImageSet, WatermarkSpec)> {
        let buffers = self
            .images
            .iter()
            .map(|p| read_file(p))
            .collect::<MarkbatchResult<Vec<_>>>()?;
        let images = decode_image_set(&buffers)?;

        let bytes = read_file(&self.watermark)?;
        let watermark = decode_image(&bytes).map_err(|e| {
            MarkbatchError::decode(format!("watermark '{}': {e}", self.watermark.display()))
        })?;
        Ok((images, WatermarkSpec::new(watermark, self.params)))
    }
}

fn read_file(path: &Path) -> MarkbatchResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| MarkbatchError::validation(format!("read '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/composition/job.rs"]
mod tests;
