//! Analysis configuration
//!
//! One `AnalysisConfig` governs a whole analysis request: how coordinates are snapped,
//! how far a picked point may lie from a vertex, and what the decomposer does with
//! components it cannot attach to the hierarchy.

use serde::{Deserialize, Serialize};

use crate::errors::{NetworkError, NetworkResult};
use crate::value_objects::PrecisionModel;

/// Handling of remaining components that touch no vertex of the preceding level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Drop the component and record it in the result
    #[default]
    Drop,
    /// Drop the component, record it and log a warning
    Warn,
    /// Join the component to the nearest assigned vertex within the snap tolerance;
    /// components with nothing in reach are dropped as with `Drop`
    SnapToNearest,
    /// Abort the decomposition with `NetworkError::OrphanComponent`
    Fail,
}

/// Configuration for a network analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Snapping rule applied to every input coordinate
    pub precision: PrecisionModel,
    /// Search radius used when a picked point has no exactly matching vertex
    pub snap_tolerance: f64,
    /// Decomposer behaviour for unattachable components
    pub orphan_policy: OrphanPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            precision: PrecisionModel::Floating,
            snap_tolerance: 0.0,
            orphan_policy: OrphanPolicy::Drop,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> NetworkResult<Self> {
        let config: AnalysisConfig =
            serde_json::from_str(json).map_err(|e| NetworkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field for usable values
    pub fn validate(&self) -> NetworkResult<()> {
        self.precision.validate()?;
        if !self.snap_tolerance.is_finite() || self.snap_tolerance < 0.0 {
            return Err(NetworkError::Config(format!(
                "snap tolerance must be finite and non-negative, got {}",
                self.snap_tolerance
            )));
        }
        Ok(())
    }

    /// Replace the precision model
    pub fn with_precision(mut self, precision: PrecisionModel) -> Self {
        self.precision = precision;
        self
    }

    /// Replace the snap tolerance
    pub fn with_snap_tolerance(mut self, snap_tolerance: f64) -> Self {
        self.snap_tolerance = snap_tolerance;
        self
    }

    /// Replace the orphan policy
    pub fn with_orphan_policy(mut self, orphan_policy: OrphanPolicy) -> Self {
        self.orphan_policy = orphan_policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.precision, PrecisionModel::Floating);
        assert_eq!(config.snap_tolerance, 0.0);
        assert_eq!(config.orphan_policy, OrphanPolicy::Drop);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = AnalysisConfig::from_json_str(
            r#"{"precision":{"type":"fixed","scale":100.0},"orphan_policy":"warn"}"#,
        )
        .unwrap();

        assert_eq!(config.precision, PrecisionModel::Fixed { scale: 100.0 });
        assert_eq!(config.orphan_policy, OrphanPolicy::Warn);
        assert_eq!(config.snap_tolerance, 0.0);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{"snap_tolerance":-1.0}"#),
            Err(NetworkError::Config(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{"precision":{"type":"fixed","scale":0.0}}"#),
            Err(NetworkError::Config(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json_str("not json"),
            Err(NetworkError::Config(_))
        ));
    }
}
