/// Viewer configuration
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::BuildingSpec;
use crate::projection::ProjectionStrategy;

/// Everything a session needs besides the render surface.
///
/// Every field has a default, so a config file only lists what it changes:
///
/// ```json
/// { "building": { "width": 600, "length": 1200, "swaEaveHeight": 200, "swcEaveHeight": 200 },
///   "projection": { "kind": "matrix_perspective", "near": 1.0, "far": 10000.0 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub building: BuildingSpec,
    /// Field of view in degrees; converted to radians for the session.
    pub fov_degrees: f64,
    /// Yaw applied about y once the building is centered (radians).
    pub initial_yaw: f64,
    /// Closest zoom, as a multiple of the building's largest dimension.
    pub zoom_min_factor: f64,
    /// Farthest zoom, as a multiple of the building's largest dimension.
    pub zoom_max_factor: f64,
    pub projection: ProjectionStrategy,
    /// Seed for face colors; `None` lets the host pick one.
    pub seed: Option<u64>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            building: BuildingSpec::default(),
            fov_degrees: 70.0,
            initial_yaw: 0.65,
            zoom_min_factor: 1.5,
            zoom_max_factor: 5.0,
            projection: ProjectionStrategy::SimplePinhole,
            seed: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn fov_radians(&self) -> f64 {
        self.fov_degrees.to_radians()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.building.validate()?;
        if !(self.fov_degrees.is_finite() && self.fov_degrees > 0.0 && self.fov_degrees < 360.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_degrees must be within (0, 360), got {}",
                self.fov_degrees
            )));
        }
        if !self.initial_yaw.is_finite() {
            return Err(ConfigError::Invalid("initial_yaw must be finite".into()));
        }
        let (min, max) = (self.zoom_min_factor, self.zoom_max_factor);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min < max) {
            return Err(ConfigError::Invalid(format!(
                "zoom factors need 0 < min < max, got min={min} max={max}"
            )));
        }
        self.projection.validate()?;
        Ok(())
    }
}
