use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::config::ConfigStore;
use super::error::AppError;
use crate::watermark::Watermarker;

/// How the generated file should be named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// `<name>.watermark.png`, overwritten on every run.
    Final,
    /// `<name>.<unix-seconds>.png`, so repeated previews are not served stale.
    Preview,
}

pub fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("inkstamp")
}

/// URL under which the frontend asset handler serves a generated file.
///
/// The path is query-escaped: spaces become `+`, other reserved bytes `%XX`.
pub fn preview_url(path: &Path) -> String {
    let escaped = urlencoding::encode(&path.to_string_lossy()).replace("%20", "+");
    format!("/static/{}", escaped)
}

/// Applies the configured watermark to image files.
pub struct Pipeline {
    store: ConfigStore,
    output_dir: PathBuf,
}

impl Pipeline {
    pub fn new(store: ConfigStore, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            output_dir: output_dir.into(),
        }
    }

    /// Create the output directory and return a pipeline writing into it.
    pub fn startup(store: ConfigStore, output_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let pipeline = Self::new(store, output_dir);
        std::fs::create_dir_all(&pipeline.output_dir)?;
        info!("Watermark output directory: {:?}", pipeline.output_dir);
        Ok(pipeline)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Watermark `path` according to the current config.
    ///
    /// Returns the path of the written PNG, or `path` itself when no
    /// watermark is configured.
    pub fn watermark_by_path(&self, path: &Path, mode: OutputMode) -> Result<PathBuf, AppError> {
        let config = self.store.load()?;

        let Some(handle) = config.watermark.as_ref().filter(|h| h.is_enabled()) else {
            debug!("No watermark configured, using {:?} as is", path);
            return Ok(path.to_path_buf());
        };

        let watermarker = match &config.font_path {
            Some(font_path) => Watermarker::from_file(font_path)?,
            None => Watermarker::embedded()?,
        };
        let image = image::open(path)?;
        let stamped = watermarker.apply(&image, handle)?;

        let save_path = self.output_path(path, mode);
        stamped.save_with_format(&save_path, ImageFormat::Png)?;
        info!("Watermarked {:?} -> {:?}", path, save_path);

        Ok(save_path)
    }

    pub fn preview(&self, path: &Path) -> Result<String, AppError> {
        let saved = self.watermark_by_path(path, OutputMode::Preview)?;
        Ok(preview_url(&saved))
    }

    fn output_path(&self, path: &Path, mode: OutputMode) -> PathBuf {
        let base = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let file_name = match mode {
            OutputMode::Final => format!("{}.watermark.png", base),
            OutputMode::Preview => format!("{}.{}.png", base, chrono::Utc::now().timestamp()),
        };
        self.output_dir.join(file_name)
    }
}
