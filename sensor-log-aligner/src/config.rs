//! Edge detector configuration types
//!
//! The detector is tuned by three numbers only. They are exposed as a serde
//! struct so the application layer can read them straight from its config file.

use crate::types::{AlignerError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the falling-edge detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Signal value that marks a transition
    #[serde(default = "default_target_value")]
    pub target_value: f64,

    /// Maximum (exclusive) distance from `target_value` for a sample to match
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Number of samples skipped after each accepted edge
    #[serde(default = "default_refractory")]
    pub refractory: usize,
}

fn default_target_value() -> f64 {
    1.5
}

fn default_tolerance() -> f64 {
    0.1
}

fn default_refractory() -> usize {
    300
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            target_value: default_target_value(),
            tolerance: default_tolerance(),
            refractory: default_refractory(),
        }
    }
}

impl EdgeConfig {
    /// Create a new edge configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the target value
    pub fn with_target_value(mut self, target_value: f64) -> Self {
        self.target_value = target_value;
        self
    }

    /// Builder method: set the match tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Builder method: set the refractory window in samples
    pub fn with_refractory(mut self, refractory: usize) -> Self {
        self.refractory = refractory;
        self
    }

    /// Reject values the scan cannot give a meaning to
    pub fn validate(&self) -> Result<()> {
        if !self.target_value.is_finite() {
            return Err(AlignerError::InvalidArgument(format!(
                "target value must be finite, got {}",
                self.target_value
            )));
        }
        if !self.tolerance.is_finite() {
            return Err(AlignerError::InvalidArgument(format!(
                "tolerance must be finite, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_config_builder() {
        let config = EdgeConfig::new()
            .with_target_value(2.0)
            .with_tolerance(0.2)
            .with_refractory(10);

        assert_eq!(config.target_value, 2.0);
        assert_eq!(config.tolerance, 0.2);
        assert_eq!(config.refractory, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = EdgeConfig::default();
        assert_eq!(config.target_value, 1.5);
        assert_eq!(config.tolerance, 0.1);
        assert_eq!(config.refractory, 300);
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        assert!(EdgeConfig::new().with_tolerance(f64::NAN).validate().is_err());
        assert!(EdgeConfig::new().with_tolerance(f64::INFINITY).validate().is_err());
        assert!(EdgeConfig::new().with_target_value(f64::NEG_INFINITY).validate().is_err());
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: EdgeConfig = serde_json::from_str(r#"{ "target_value": 2.0 }"#).unwrap();
        assert_eq!(config.target_value, 2.0);
        assert_eq!(config.tolerance, 0.1);
        assert_eq!(config.refractory, 300);
    }
}
