use std::path::PathBuf;
use thiserror::Error;

use crate::watermark::WatermarkError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config file not found: {0:?}")]
    ConfigNotFound(PathBuf),

    #[error("Malformed config: {0}")]
    MalformedConfig(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Watermark error: {0}")]
    Watermark(#[from] WatermarkError),
}
