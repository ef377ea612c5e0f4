//! Tunable constants of the observation pipeline
//!
//! [`PipelineConfig::default`] reproduces the standard values; a JSON file
//! may override any subset of them.

use crate::planetlib::Body;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings consumed by light-time iteration, deflection and refraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bodies whose gravity bends incoming light, in application order
    pub deflectors: Vec<Body>,
    /// Minimum limb angle, radians, at which Earth's own deflection applies
    pub earth_deflection_limb_angle: f64,
    /// Upper bound on light-time iterations
    pub light_time_max_iterations: usize,
    /// Light-time convergence threshold, days
    pub light_time_tolerance_days: f64,
    /// Temperature used when "standard" conditions are requested, °C
    pub standard_temperature_c: f64,
    /// Sea-level pressure of the standard atmosphere, millibars
    pub sea_level_pressure_mbar: f64,
    /// Scale height for pressure falloff with elevation, meters
    pub pressure_scale_height_m: f64,
    /// Refraction iteration convergence threshold, degrees
    pub refraction_tolerance_deg: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deflectors: vec![Body::Sun, Body::Jupiter, Body::Saturn],
            earth_deflection_limb_angle: 0.8,
            light_time_max_iterations: 10,
            light_time_tolerance_days: 1e-12,
            standard_temperature_c: 10.0,
            sea_level_pressure_mbar: 1010.0,
            pressure_scale_height_m: 9100.0,
            refraction_tolerance_deg: crate::earthlib::REFRACTION_TOLERANCE_DEG,
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Write this configuration as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Standard atmospheric pressure at an elevation, millibars
    pub fn standard_pressure_mbar(&self, elevation_m: f64) -> f64 {
        self.sea_level_pressure_mbar * (-elevation_m / self.pressure_scale_height_m).exp()
    }

    fn validate(&self) -> Result<()> {
        if self.light_time_max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "light_time_max_iterations must be at least 1".to_string(),
            ));
        }
        let positive = [
            ("light_time_tolerance_days", self.light_time_tolerance_days),
            ("pressure_scale_height_m", self.pressure_scale_height_m),
            ("refraction_tolerance_deg", self.refraction_tolerance_deg),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            PipelineConfig::from_json_str(r#"{"deflectors": ["sun"], "standard_temperature_c": 0.0}"#)
                .unwrap();
        assert_eq!(config.deflectors, vec![Body::Sun]);
        assert_eq!(config.standard_temperature_c, 0.0);
        assert_eq!(config.light_time_max_iterations, 10);
        assert_eq!(config.earth_deflection_limb_angle, 0.8);
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let result = PipelineConfig::from_json_str(r#"{"light_time_max_iterations": 0}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_unknown_body() {
        let result = PipelineConfig::from_json_str(r#"{"deflectors": ["vulcan"]}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_standard_pressure() {
        let config = PipelineConfig::default();
        assert_eq!(config.standard_pressure_mbar(0.0), 1010.0);
        assert_relative_eq!(
            config.standard_pressure_mbar(9100.0),
            1010.0 / std::f64::consts::E,
            epsilon = 1e-10
        );
    }
}
