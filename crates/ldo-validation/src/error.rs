//! Validation error types

use ldo_domain::SchemaError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while scoring a parsed document
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The parsed payload is not a JSON array of rows
    #[error("Expected an array of data rows, got {0}")]
    NotAnArray(String),

    /// The table schema description is malformed
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The gold test set could not be read
    #[error("Cannot read test set {path}: {source}")]
    TestSetIo {
        /// Test set file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The gold test set is not usable
    #[error("Invalid test set: {0}")]
    TestSet(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
