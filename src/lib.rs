pub mod app;
pub mod watermark;

pub use app::{AppConfig, AppError, ConfigStore, OutputMode, Pipeline};
pub use watermark::{WatermarkError, WatermarkHandle, WatermarkSource, Watermarker};
