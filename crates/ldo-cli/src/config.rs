//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use ldo_extractor::ExtractorConfig;
use ldo_llm::LlmConfig;
use ldo_pipeline::PipelineConfig;
use ldo_store::StoreConfig;
use ldo_validation::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable consulted when `[llm].api_key` is not set
pub const API_KEY_ENV: &str = "LDO_API_KEY";

/// Application configuration, one section per component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Stage concurrency, timeouts and completion policy
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Segment extraction, rate limit and retries
    #[serde(default)]
    pub extraction: ExtractorConfig,

    /// Scoring and quality gate
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Extraction provider
    #[serde(default)]
    pub llm: LlmConfig,

    /// Target database
    #[serde(default)]
    pub database: StoreConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Terminal output
    #[serde(default)]
    pub output: OutputSettings,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (`info`, `ldo_pipeline=debug`, ...)
    #[serde(default = "default_level")]
    pub level: String,
}

/// Terminal output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl AppConfig {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".ldo").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one the default path is
    /// read when present, otherwise defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Fill the API key from `value` when the file does not set one.
    pub fn with_api_key_fallback(mut self, value: Option<String>) -> Self {
        if self.llm.api_key.is_none() {
            self.llm.api_key = value.filter(|key| !key.trim().is_empty());
        }
        self
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("pipeline", self.pipeline.validate()),
            ("extraction", self.extraction.validate()),
            ("validation", self.validation.validate()),
            ("llm", self.llm.validate()),
            ("database", self.database.validate()),
        ];
        for (section, check) in checks {
            check.map_err(|e| CliError::Config(format!("[{}] {}", section, e)))?;
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_level() }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
