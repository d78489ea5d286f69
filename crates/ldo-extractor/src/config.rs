//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for segment extraction, the `[extraction]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Concurrent segment calls per document
    #[serde(default = "default_max_executor_threads")]
    pub max_executor_threads: usize,

    /// Extraction calls allowed in any one-second window, across all documents
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: usize,

    /// Attempts per segment before the document fails
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, doubled after every failure (milliseconds)
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,

    /// Time in-flight segments get to finish after a failure (seconds)
    #[serde(default = "default_worker_join_timeout_secs")]
    pub worker_join_timeout_secs: u64,
}

fn default_max_executor_threads() -> usize {
    10
}

fn default_requests_per_second() -> usize {
    7
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_retry_delay_ms() -> u64 {
    600
}

fn default_worker_join_timeout_secs() -> u64 {
    60
}

impl ExtractorConfig {
    /// Get the initial retry delay as a Duration
    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }

    /// Get the worker join timeout as a Duration
    pub fn worker_join_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_join_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_executor_threads == 0 {
            return Err("max_executor_threads must be greater than 0".to_string());
        }
        if self.requests_per_second == 0 {
            return Err("requests_per_second must be greater than 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.worker_join_timeout_secs == 0 {
            return Err("worker_join_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration matching typical hosted API quotas
    fn default() -> Self {
        Self {
            max_executor_threads: default_max_executor_threads(),
            requests_per_second: default_requests_per_second(),
            max_attempts: default_max_attempts(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
            worker_join_timeout_secs: default_worker_join_timeout_secs(),
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: more workers, higher request rate, fewer retries
    pub fn aggressive() -> Self {
        Self {
            max_executor_threads: 20,
            requests_per_second: 15,
            max_attempts: 3,
            initial_retry_delay_ms: 300,
            worker_join_timeout_secs: 30,
        }
    }

    /// Conservative preset for local models or tight quotas
    pub fn conservative() -> Self {
        Self {
            max_executor_threads: 2,
            requests_per_second: 2,
            max_attempts: 8,
            initial_retry_delay_ms: 1_000,
            worker_join_timeout_secs: 300,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
