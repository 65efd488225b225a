use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("Malformed watermark input: {0}")]
    MalformedInput(String),

    #[error("Watermark text is empty")]
    EmptyText,

    #[error("Failed to parse font: {0}")]
    Font(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),
}

impl From<serde_json::Error> for WatermarkError {
    fn from(err: serde_json::Error) -> Self {
        WatermarkError::MalformedInput(err.to_string())
    }
}
