//! Rule thresholds and category constants.
//!
//! Defaults match what the air-monitoring forms enforce today. A deployment
//! can override them from JSON, e.g. a lab with a different tolerance band.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Thresholds used by the sample and equipment rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    /// Allowed |initial - final| as a fraction of the initial flow rate
    pub drift_tolerance_fraction: f64,
    /// The only flow rate (L/min) usable with a 13 mm filter
    pub thirteen_mm_flowrate: f64,
    /// Tolerance when comparing a flow rate against `thirteen_mm_flowrate`
    pub flowrate_epsilon: f64,
    /// Minimum minutes x L/min for 25 mm (and unset) filters
    pub min_volume_25mm: f64,
    /// Minimum minutes x L/min for 13 mm filters
    pub min_volume_13mm: f64,
    /// A pump needs a passing calibration dated within this many days
    pub calibration_window_days: i64,
    /// Location forced onto field blank samples
    pub field_blank_location: String,
    /// Sample type forced onto field blank samples
    pub field_blank_type: String,
    /// Location pre-filled for neg air exhaust samples
    pub neg_air_exhaust_location: String,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            drift_tolerance_fraction: 0.10,
            thirteen_mm_flowrate: 1.5,
            flowrate_epsilon: 0.01,
            min_volume_25mm: 360.0,
            min_volume_13mm: 72.0,
            calibration_window_days: 365,
            field_blank_location: "Field blank".into(),
            field_blank_type: "-".into(),
            neg_air_exhaust_location: "Neg air exhaust".into(),
        }
    }
}

impl RulesConfig {
    /// Parse and validate a config from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: RulesConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading rules config {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("parsing rules config {}", path.display()))
    }

    /// Check every threshold is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("drift_tolerance_fraction", self.drift_tolerance_fraction),
            ("thirteen_mm_flowrate", self.thirteen_mm_flowrate),
            ("flowrate_epsilon", self.flowrate_epsilon),
            ("min_volume_25mm", self.min_volume_25mm),
            ("min_volume_13mm", self.min_volume_13mm),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be a positive number, got {}", value),
                });
            }
        }

        if self.calibration_window_days <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "calibration_window_days",
                reason: format!("must be positive, got {}", self.calibration_window_days),
            });
        }

        if self.field_blank_location.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "field_blank_location",
                reason: "must not be empty".into(),
            });
        }

        Ok(())
    }
}
