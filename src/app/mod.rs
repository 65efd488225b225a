// App module - config persistence and the watermark-by-path pipeline
mod config;
mod error;
mod pipeline;

pub use config::{AppConfig, ConfigStore, DEFAULT_CONFIG_PATH};
pub use error::AppError;
pub use pipeline::{OutputMode, Pipeline, default_output_dir, preview_url};
