//! LDO Storage Layer
//!
//! Implements the `SchemaIntrospector` and `RowSink` traits on SQLite.
//!
//! # Architecture
//!
//! - `ConnectionPool`: r2d2 pool of SQLite connections with a busy timeout
//! - `SqliteIntrospector`: reads the target table description from the catalog
//! - `BatchInserter`: one transaction per document, multi-row INSERT batches
//!
//! # Examples
//!
//! ```no_run
//! use ldo_domain::traits::{RowSink, SchemaIntrospector};
//! use ldo_store::{BatchInserter, ConnectionPool, SqliteIntrospector, StoreConfig};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let pool = Arc::new(ConnectionPool::open(&StoreConfig::with_path("ldo.db")).unwrap());
//! let schema = SqliteIntrospector::new(Arc::clone(&pool)).describe_table("people").unwrap();
//!
//! let inserter = BatchInserter::new(pool, false);
//! let outcome = inserter.insert_rows(&schema, &json!([{"name": "Ann"}]), 100).unwrap();
//! assert!(outcome.committed);
//! ```

#![warn(missing_docs)]

mod coerce;
mod inserter;
mod introspect;
mod pool;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use coerce::{coerce, BoundValue};
pub use inserter::{insert_statement, quote_identifier, rows_per_statement, BatchInserter, MAX_BOUND_PARAMETERS};
pub use introspect::SqliteIntrospector;
pub use pool::{ConnectionPool, PooledConnection};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No connection could be opened or borrowed in time
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The catalog has no such table
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// A batch failed; the whole document was rolled back
    #[error("Batch {batch} into {table} failed: {reason}")]
    Batch {
        /// Target table
        table: String,
        /// Batch position within the document
        batch: usize,
        /// Database message, without the statement text
        reason: String,
        /// Underlying error
        #[source]
        source: rusqlite::Error,
    },

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Database settings, the `[database]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Upper bound on open connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// How long `get` waits for a free connection (milliseconds)
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// How long a connection waits on a locked database (milliseconds)
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Empty the target table inside the first committed transaction of a run
    #[serde(default)]
    pub truncate_table_before_insert: bool,
}

fn default_path() -> PathBuf {
    PathBuf::from("ldo.db")
}

fn default_max_connections() -> usize {
    10
}

fn default_acquire_timeout_ms() -> u64 {
    30_000
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            truncate_table_before_insert: false,
        }
    }
}

impl StoreConfig {
    /// Default settings for the given database file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Get the busy timeout as a Duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Get the acquire timeout as a Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("max_connections must be greater than 0".to_string());
        }
        if self.acquire_timeout_ms == 0 {
            return Err("acquire_timeout_ms must be greater than 0".to_string());
        }
        if self.path.as_os_str().is_empty() {
            return Err("database path must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert_eq!(config.acquire_timeout(), Duration::from_secs(30));
        assert!(!config.truncate_table_before_insert);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: StoreConfig = toml::from_str(
            r#"
            path = "/tmp/orders.db"
            truncate_table_before_insert = true
            "#,
        )
        .unwrap();
        assert_eq!(config.path, PathBuf::from("/tmp/orders.db"));
        assert!(config.truncate_table_before_insert);
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn test_zero_connections_rejected() {
        let mut config = StoreConfig::default();
        config.max_connections = 0;
        assert!(config.validate().is_err());
    }
}
