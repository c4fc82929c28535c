use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CanvasError, Result};
use crate::geometry::{DEFAULT_GRID_SIZE, Point, ZoomLimits};

const NEW_NODE_TEXT: &str = "New Node";
const NEW_NODE_POSITION: Point = Point::new(100.0, 100.0);

/// Tunables for one canvas instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Drag positions snap to multiples of this; `None` disables snapping.
    pub grid_size: Option<f32>,
    pub zoom: ZoomLimits,
    pub new_node_position: Point,
    pub new_node_text: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }
}

impl CanvasConfig {
    /// Built-in defaults with `DOCUCANVAS_*` overrides read through `lookup`.
    /// Zoom overrides that would leave the limits invalid are dropped as a
    /// group.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |key: &str| -> Option<f32> { lookup(key)?.trim().parse().ok() };

        let mut zoom = ZoomLimits::default();
        if let Some(step) = number("DOCUCANVAS_ZOOM_STEP") {
            zoom.step = step;
        }
        if let Some(min) = number("DOCUCANVAS_MIN_SCALE") {
            zoom.min_scale = min;
        }
        if let Some(max) = number("DOCUCANVAS_MAX_SCALE") {
            zoom.max_scale = max;
        }
        if !zoom.is_valid() {
            warn!(?zoom, "ignoring zoom overrides from the environment");
            zoom = ZoomLimits::default();
        }

        let grid_size = match lookup("DOCUCANVAS_GRID_SIZE") {
            Some(raw) if raw.trim().eq_ignore_ascii_case("off") => None,
            Some(raw) => match raw.trim().parse::<f32>() {
                Ok(size) if size.is_finite() && size > 0.0 => Some(size),
                Ok(_) => None,
                Err(_) => {
                    warn!(value = %raw, "ignoring unparsable DOCUCANVAS_GRID_SIZE");
                    Some(DEFAULT_GRID_SIZE)
                }
            },
            None => Some(DEFAULT_GRID_SIZE),
        };

        Self {
            grid_size,
            zoom,
            new_node_position: NEW_NODE_POSITION,
            new_node_text: NEW_NODE_TEXT.to_string(),
        }
    }

    /// Reads a JSON config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&contents).map_err(|err| CanvasError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.zoom.is_valid() {
            return Err(CanvasError::Config(format!(
                "zoom limits need finite values with 0 < minScale <= maxScale and step > 1, got \
                 step {}, minScale {}, maxScale {}",
                self.zoom.step, self.zoom.min_scale, self.zoom.max_scale
            )));
        }
        if let Some(size) = self.grid_size {
            if !size.is_finite() || size <= 0.0 {
                return Err(CanvasError::Config(format!(
                    "gridSize must be a positive number or null, got {size}"
                )));
            }
        }
        Ok(())
    }

    pub fn without_snapping(mut self) -> Self {
        self.grid_size = None;
        self
    }
}
