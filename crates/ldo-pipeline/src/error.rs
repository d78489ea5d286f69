//! Error types for pipeline runs

use ldo_domain::DomainError;
use ldo_validation::ValidationError;
use std::time::Duration;
use thiserror::Error;

/// Errors that stop a whole run
///
/// Failures of a single document are not errors; they end up in the
/// document's outcome.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A document was rejected while `stop_if_invalidated_document` is set
    #[error("Document {index} ({document}) was rejected: {reason}")]
    RejectedDocument {
        /// Position in load order
        index: usize,
        /// Document source
        document: String,
        /// Why summarization rejected it
        reason: String,
    },

    /// A stage did not finish in time
    #[error("{stage} stage timed out after {timeout:?}")]
    Timeout {
        /// Stage name
        stage: &'static str,
        /// Configured limit
        timeout: Duration,
    },

    /// Segment workers of a document did not finish after a failure
    #[error("Segment workers did not finish within {0:?}")]
    JoinTimeout(Duration),

    /// Validation setup error (gold test set, schema)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Lifecycle violation
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// A stage task panicked or was cancelled
    #[error("Worker error: {0}")]
    Worker(String),
}
