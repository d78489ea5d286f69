//! Error types for the Extractor

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading, segmenting or parsing documents
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// A segment exhausted its retries
    #[error("Extraction failed for segment {segment}: {message}")]
    Extraction {
        /// Segment index within the document
        segment: usize,
        /// Last error reported by the service
        message: String,
    },

    /// In-flight segments did not finish after the first failure
    #[error("Segment workers did not finish within {0:?}")]
    JoinTimeout(Duration),

    /// A segment worker panicked
    #[error("Segment worker panicked: {0}")]
    WorkerPanicked(String),

    /// File type the source cannot read
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Page expression could not be parsed
    #[error("Invalid page selection: {0}")]
    InvalidPageSelection(String),

    /// Selected page does not exist
    #[error("Page {page} is out of bounds for a document with {pages} pages")]
    PageOutOfRange {
        /// Requested page (1-based)
        page: usize,
        /// Pages in the document
        pages: usize,
    },

    /// Reading a file or walking a folder failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Whether the error must stop the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExtractorError::JoinTimeout(_) | ExtractorError::Config(_))
    }
}

/// Failure of a [`SegmentWorkerPool`](crate::SegmentWorkerPool) run
#[derive(Error, Debug)]
pub enum PoolError<E> {
    /// The first work item that failed
    #[error("Work item {index} failed: {source}")]
    Task {
        /// Position of the item
        index: usize,
        /// Error returned by the item
        source: E,
    },

    /// In-flight items did not finish within the join timeout
    #[error("Workers did not finish within {0:?}")]
    JoinTimeout(Duration),

    /// A worker panicked or was cancelled
    #[error("Worker panicked: {0}")]
    Panicked(String),
}
