//! Seam rewriting configuration
//!
//! All distances are in the units of the G-code file (millimetres for every
//! slicer seamshift targets). Settings can be stored as TOML or JSON; missing
//! keys fall back to their defaults.

use seamshift_core::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Constants that drive loop detection and the seam rewrite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeamSettings {
    /// Tolerance for every floating point comparison
    pub tolerance: f64,
    /// Distance along the loop at which the flow change is relocated
    pub transition_distance: f64,
    /// Largest XY gap allowed between where a loop ends and where it started
    pub max_end_gap: f64,
    /// Scale applied to the loop's average flow for the seam move
    pub seam_width_factor: f64,
    /// Upper bound on the short travel that leads into a loop
    pub max_approach_distance: f64,
    /// Section label of the loops printed just before the external one
    pub interior_label: String,
    /// Section label of the external perimeter
    pub external_label: String,
    /// Prefix of section annotation comments
    pub section_prefix: String,
    /// Decimal places for generated X/Y words
    pub xy_precision: usize,
    /// Decimal places for generated E words
    pub e_precision: usize,
}

impl Default for SeamSettings {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-6,
            transition_distance: 0.5,
            max_end_gap: 0.1,
            seam_width_factor: 0.5,
            max_approach_distance: 1.0,
            interior_label: "Perimeter".to_string(),
            external_label: "External perimeter".to_string(),
            section_prefix: ";TYPE:".to_string(),
            xy_precision: 3,
            e_precision: 5,
        }
    }
}

/// Largest precision accepted for generated words
const MAX_PRECISION: usize = 9;

impl SeamSettings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let settings: Self = match extension(path) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ConfigError::Parse(format!("Invalid JSON config: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| ConfigError::Parse(format!("Invalid TOML config: {}", e)))?,
            other => {
                return Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into())
            }
        };

        settings.validate()?;
        tracing::debug!(path = %path.display(), "loaded seam settings");
        Ok(settings)
    }

    /// Save settings to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = match extension(path) {
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?,
            other => {
                return Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into())
            }
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(invalid("tolerance", "must be a finite value > 0"));
        }

        if !(self.transition_distance.is_finite() && self.transition_distance > self.tolerance) {
            return Err(invalid(
                "transition_distance",
                "must be finite and greater than the tolerance",
            ));
        }

        if !(self.max_end_gap.is_finite() && self.max_end_gap > 0.0) {
            return Err(invalid("max_end_gap", "must be a finite value > 0"));
        }

        if !self.seam_width_factor.is_finite() {
            return Err(invalid("seam_width_factor", "must be finite"));
        }

        if !(self.max_approach_distance.is_finite()
            && self.max_approach_distance > self.tolerance)
        {
            return Err(invalid(
                "max_approach_distance",
                "must be finite and greater than the tolerance",
            ));
        }

        if self.interior_label.trim().is_empty() {
            return Err(invalid("interior_label", "must not be empty"));
        }

        if self.external_label.trim().is_empty() {
            return Err(invalid("external_label", "must not be empty"));
        }

        if self.interior_label == self.external_label {
            return Err(invalid(
                "external_label",
                "must differ from interior_label",
            ));
        }

        if self.section_prefix.is_empty() {
            return Err(invalid("section_prefix", "must not be empty"));
        }

        if self.xy_precision > MAX_PRECISION || self.e_precision > MAX_PRECISION {
            return Err(invalid(
                "precision",
                format!("must be at most {} decimal places", MAX_PRECISION),
            ));
        }

        Ok(())
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

fn invalid(name: &str, reason: impl Into<String>) -> Error {
    ConfigError::InvalidValue {
        name: name.to_string(),
        reason: reason.into(),
    }
    .into()
}
