//! Heat layer configuration, loadable from JSON

use crate::error::Result;
use crate::heat::{ColorStop, MaxIntensity, DEFAULT_BLUR, DEFAULT_MIN_OPACITY, DEFAULT_RADIUS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_radius() -> f64 {
    DEFAULT_RADIUS
}

fn default_blur() -> f64 {
    DEFAULT_BLUR
}

fn default_min_opacity() -> f64 {
    DEFAULT_MIN_OPACITY
}

/// Options recognized by the heat layer. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatOptions {
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default = "default_blur")]
    pub blur: f64,
    /// `None` means the built-in blue -> red gradient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Vec<ColorStop>>,
    #[serde(default = "default_min_opacity")]
    pub min_opacity: f64,
    #[serde(default)]
    pub max_intensity: MaxIntensity,
    /// Attachment target name forwarded to the viewport host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pane: Option<String>,
}

impl Default for HeatOptions {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            blur: DEFAULT_BLUR,
            gradient: None,
            min_opacity: DEFAULT_MIN_OPACITY,
            max_intensity: MaxIntensity::default(),
            pane: None,
        }
    }
}

impl HeatOptions {
    /// Replace unusable values with defaults, logging each substitution.
    /// Zero radius or blur count as unset.
    pub fn sanitized(&self) -> Self {
        let mut out = self.clone();

        if !(self.radius.is_finite() && self.radius > 0.0) {
            log::warn!("options: radius {} invalid, using {}", self.radius, DEFAULT_RADIUS);
            out.radius = DEFAULT_RADIUS;
        }
        if !(self.blur.is_finite() && self.blur > 0.0) {
            log::warn!("options: blur {} invalid, using {}", self.blur, DEFAULT_BLUR);
            out.blur = DEFAULT_BLUR;
        }
        if !(self.min_opacity.is_finite() && self.min_opacity > 0.0) {
            log::warn!(
                "options: minOpacity {} invalid, using {}",
                self.min_opacity,
                DEFAULT_MIN_OPACITY
            );
            out.min_opacity = DEFAULT_MIN_OPACITY;
        } else if self.min_opacity > 1.0 {
            out.min_opacity = 1.0;
        }
        if let Some(stops) = &self.gradient {
            if stops.is_empty() {
                log::warn!("options: empty gradient, using default");
                out.gradient = None;
            }
        }
        out
    }

    /// Gradient stops to build the lookup table from; empty means default
    pub fn gradient_stops(&self) -> &[ColorStop] {
        self.gradient.as_deref().unwrap_or(&[])
    }

    /// Load options from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse options from JSON. The gradient may be a list of
    /// `{ "offset", "color" }` stops or a `{ "0.4": "blue", ... }` map.
    pub fn from_json(json: &str) -> Result<Self> {
        use serde_json::Value;

        let mut value: Value = serde_json::from_str(json)?;
        let stops = match value.get("gradient") {
            Some(Value::Object(map)) => Some(
                map.iter()
                    .map(|(offset, color)| {
                        // Unparseable offsets become null and fail deserialization below
                        let offset = offset
                            .parse::<f64>()
                            .ok()
                            .and_then(serde_json::Number::from_f64)
                            .map_or(Value::Null, Value::Number);
                        serde_json::json!({ "offset": offset, "color": color })
                    })
                    .collect::<Vec<Value>>(),
            ),
            _ => None,
        };
        if let Some(stops) = stops {
            value["gradient"] = Value::Array(stops);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Save options to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
