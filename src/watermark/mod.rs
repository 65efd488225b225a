// Watermark module - the handle passed from the UI and the renderer that consumes it
mod anchor;
mod color;
mod error;
mod handle;
mod render;

pub use anchor::Anchor;
pub use color::{DEFAULT_COLOR, parse_hex_color};
pub use error::WatermarkError;
pub use handle::{WatermarkHandle, WatermarkSource};
pub use render::{DEFAULT_DPI, DEFAULT_SIZE, Placement, RenderSettings, Watermarker};
