use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::AppError;
use crate::watermark::WatermarkHandle;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Settings document shared with the frontend.
///
/// Only `watermark` and `font_path` are interpreted here. Everything else
/// (upload targets and the like) is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<WatermarkHandle>,
    /// Font file for the watermark text; the bundled DejaVu Sans when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A JSON config file on disk, written verbatim and parsed on read.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save_raw(&self, json: &str) -> Result<(), AppError> {
        debug!("Writing config to {:?}", self.path);
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn load_raw(&self) -> Result<String, AppError> {
        std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::ConfigNotFound(self.path.clone()),
            _ => AppError::IoError(e),
        })
    }

    pub fn load(&self) -> Result<AppConfig, AppError> {
        AppConfig::from_json(&self.load_raw()?)
    }
}
