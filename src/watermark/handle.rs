use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::error::WatermarkError;

/// Input accepted by [`WatermarkHandle::construct`].
///
/// The frontend hands over either an already-decoded object or the same
/// object encoded as JSON text. Omitting the source is the same as passing an
/// empty object.
#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkSource {
    Json(String),
    Fields(Map<String, Value>),
}

impl Default for WatermarkSource {
    fn default() -> Self {
        WatermarkSource::Fields(Map::new())
    }
}

impl From<&str> for WatermarkSource {
    fn from(text: &str) -> Self {
        WatermarkSource::Json(text.to_string())
    }
}

impl From<String> for WatermarkSource {
    fn from(text: String) -> Self {
        WatermarkSource::Json(text)
    }
}

impl From<Map<String, Value>> for WatermarkSource {
    fn from(fields: Map<String, Value>) -> Self {
        WatermarkSource::Fields(fields)
    }
}

/// Parameters for stamping a text watermark onto an image.
///
/// Every field is optional. Values are carried through exactly as the caller
/// supplied them (numbers keep their integer or float form); defaults are
/// only chosen later, at render time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct WatermarkHandle {
    text: Option<String>,
    size: Option<Number>,
    dpi: Option<Number>,
    color: Option<String>,
    x: Option<Number>,
    y: Option<Number>,
    position: Option<String>,
    angle: Option<Number>,
}

impl WatermarkHandle {
    /// Build a handle from either a mapping or a JSON-encoded object.
    ///
    /// Only the string form can fail: text that is not valid JSON, or valid
    /// JSON that is not an object, yields [`WatermarkError::MalformedInput`].
    /// Missing keys and keys holding a value of the wrong type become `None`.
    pub fn construct(source: impl Into<WatermarkSource>) -> Result<Self, WatermarkError> {
        match source.into() {
            WatermarkSource::Json(text) => Self::from_json_str(&text),
            WatermarkSource::Fields(fields) => Ok(Self::from_map(&fields)),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, WatermarkError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(fields) => Ok(Self::from_map(&fields)),
            other => Err(WatermarkError::MalformedInput(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_map(fields: &Map<String, Value>) -> Self {
        Self {
            text: string_field(fields, "text"),
            size: number_field(fields, "size"),
            dpi: number_field(fields, "dpi"),
            color: string_field(fields, "color"),
            x: number_field(fields, "x"),
            y: number_field(fields, "y"),
            position: string_field(fields, "position"),
            angle: number_field(fields, "angle"),
        }
    }

    /// All eight fields as a JSON object, absent ones as `null`.
    ///
    /// `Value` does not keep key order; the `Display` and `Serialize` impls
    /// produce the canonical text.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "text": self.text,
            "size": self.size,
            "dpi": self.dpi,
            "color": self.color,
            "x": self.x,
            "y": self.y,
            "position": self.position,
            "angle": self.angle,
        })
    }

    /// Whether this handle actually asks for a watermark.
    pub fn is_enabled(&self) -> bool {
        self.text.as_deref().is_some_and(|text| !text.is_empty())
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn size(&self) -> Option<f64> {
        self.size.as_ref().and_then(Number::as_f64)
    }

    pub fn dpi(&self) -> Option<f64> {
        self.dpi.as_ref().and_then(Number::as_f64)
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn x(&self) -> Option<f64> {
        self.x.as_ref().and_then(Number::as_f64)
    }

    pub fn y(&self) -> Option<f64> {
        self.y.as_ref().and_then(Number::as_f64)
    }

    pub fn position(&self) -> Option<&str> {
        self.position.as_deref()
    }

    pub fn angle(&self) -> Option<f64> {
        self.angle.as_ref().and_then(Number::as_f64)
    }
}

impl From<Map<String, Value>> for WatermarkHandle {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(&fields)
    }
}

/// Canonical JSON text, keys in field order.
impl fmt::Display for WatermarkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl FromStr for WatermarkHandle {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json_str(s)
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => {
            debug!(
                "Ignoring watermark field '{}': expected string, found {}",
                key,
                json_kind(other)
            );
            None
        }
    }
}

fn number_field(fields: &Map<String, Value>, key: &str) -> Option<Number> {
    match fields.get(key)? {
        Value::Number(n) => Some(n.clone()),
        Value::Null => None,
        other => {
            debug!(
                "Ignoring watermark field '{}': expected number, found {}",
                key,
                json_kind(other)
            );
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
