//! Configuration for pipeline runs
//!
//! Defines stage concurrency, stage timeouts and the completion policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the pipeline, the `[pipeline]` section
///
/// # Examples
///
/// ```
/// use ldo_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.max_etl_processors, 4);
///
/// let config = PipelineConfig::from_toml("strict = true").unwrap();
/// assert!(config.strict);
/// assert_eq!(config.max_db_insertion_chunk_size, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Documents summarized or parsed at the same time
    /// Default: 4
    #[serde(default = "default_max_etl_processors")]
    pub max_etl_processors: usize,

    /// Abort the run when any document is rejected by summarization
    /// Default: false
    #[serde(default)]
    pub stop_if_invalidated_document: bool,

    /// Count failed inserts and gate rejections against the run
    /// Default: false
    #[serde(default)]
    pub strict: bool,

    /// Rejected documents tolerated before the run counts as failed
    /// Default: unlimited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rejected_documents: Option<usize>,

    /// Rows per multi-row INSERT
    /// Default: 100
    #[serde(default = "default_max_db_insertion_chunk_size")]
    pub max_db_insertion_chunk_size: usize,

    /// Time limit for the summarization stage (seconds)
    /// Default: 3600
    #[serde(default = "default_stage_timeout_secs")]
    pub validation_stage_timeout_secs: u64,

    /// Time limit for the parse stage (seconds)
    /// Default: 3600
    #[serde(default = "default_stage_timeout_secs")]
    pub parse_stage_timeout_secs: u64,
}

fn default_max_etl_processors() -> usize {
    4
}

fn default_max_db_insertion_chunk_size() -> usize {
    100
}

fn default_stage_timeout_secs() -> u64 {
    3600
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_etl_processors: default_max_etl_processors(),
            stop_if_invalidated_document: false,
            strict: false,
            max_rejected_documents: None,
            max_db_insertion_chunk_size: default_max_db_insertion_chunk_size(),
            validation_stage_timeout_secs: default_stage_timeout_secs(),
            parse_stage_timeout_secs: default_stage_timeout_secs(),
        }
    }
}

impl PipelineConfig {
    /// Get the summarization stage timeout as Duration
    pub fn validation_stage_timeout(&self) -> Duration {
        Duration::from_secs(self.validation_stage_timeout_secs)
    }

    /// Get the parse stage timeout as Duration
    pub fn parse_stage_timeout(&self) -> Duration {
        Duration::from_secs(self.parse_stage_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_etl_processors == 0 {
            return Err("max_etl_processors must be greater than 0".to_string());
        }
        if self.max_db_insertion_chunk_size == 0 {
            return Err("max_db_insertion_chunk_size must be greater than 0".to_string());
        }
        if self.validation_stage_timeout_secs == 0 || self.parse_stage_timeout_secs == 0 {
            return Err("stage timeouts must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}
