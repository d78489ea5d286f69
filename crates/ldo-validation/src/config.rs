//! Validation configuration

use serde::{Deserialize, Serialize};

/// Scoring and quality gate rules, the `[validation]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Minimum similarity percentage for two gold entries to match (0-100)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: u32,

    /// Reject documents with missing mandatory fields
    #[serde(default = "default_true")]
    pub reject_missing_fields: bool,

    /// Reject documents with data type errors
    #[serde(default = "default_true")]
    pub reject_type_errors: bool,

    /// Enable the minimum conformity rate check
    #[serde(default = "default_true")]
    pub check_conformity_rate: bool,

    /// Lowest acceptable conformity rate (0.0-1.0)
    #[serde(default = "default_min_conformity_rate")]
    pub min_conformity_rate: f64,

    /// Enable the maximum unknown rate check
    #[serde(default = "default_true")]
    pub check_unknown_rate: bool,

    /// Highest acceptable unknown rate (0.0-1.0)
    #[serde(default = "default_max_unknown_rate")]
    pub max_unknown_rate: f64,
}

fn default_similarity_threshold() -> u32 {
    80
}

fn default_true() -> bool {
    true
}

fn default_min_conformity_rate() -> f64 {
    0.9
}

fn default_max_unknown_rate() -> f64 {
    0.1
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            reject_missing_fields: true,
            reject_type_errors: true,
            check_conformity_rate: true,
            min_conformity_rate: default_min_conformity_rate(),
            check_unknown_rate: true,
            max_unknown_rate: default_max_unknown_rate(),
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (only missing fields reject)
    pub fn permissive() -> Self {
        Self {
            similarity_threshold: 70,
            reject_missing_fields: true,
            reject_type_errors: false,
            check_conformity_rate: false,
            min_conformity_rate: 0.0,
            check_unknown_rate: false,
            max_unknown_rate: 1.0,
        }
    }

    /// Create a strict configuration (all checks, tighter rates)
    pub fn strict() -> Self {
        Self {
            similarity_threshold: 90,
            reject_missing_fields: true,
            reject_type_errors: true,
            check_conformity_rate: true,
            min_conformity_rate: 0.95,
            check_unknown_rate: true,
            max_unknown_rate: 0.05,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.similarity_threshold > 100 {
            return Err("similarity_threshold must be between 0 and 100".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_conformity_rate) {
            return Err("min_conformity_rate must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.max_unknown_rate) {
            return Err("max_unknown_rate must be between 0.0 and 1.0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        assert_eq!(config.similarity_threshold, 80);
        assert_eq!(config.min_conformity_rate, 0.9);
        assert_eq!(config.max_unknown_rate, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_permissive_config() {
        let config = ValidationConfig::permissive();
        assert!(!config.reject_type_errors);
        assert!(!config.check_conformity_rate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_config() {
        let config = ValidationConfig::strict();
        assert_eq!(config.min_conformity_rate, 0.95);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_rate_rejected() {
        let mut config = ValidationConfig::default();
        config.max_unknown_rate = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ValidationConfig = toml::from_str("min_conformity_rate = 0.5").unwrap();
        assert_eq!(config.min_conformity_rate, 0.5);
        assert_eq!(config.similarity_threshold, 80);
        assert!(config.reject_missing_fields);
    }
}
