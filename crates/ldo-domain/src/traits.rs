//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its
//! collaborators. Implementations live in other crates.

use crate::{DocumentUnit, Segment, TableSchema};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Remote model that turns text into table rows
///
/// Implemented by the infrastructure layer (ldo-llm)
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Error type for service calls
    type Error: std::error::Error + Send + Sync + 'static;

    /// Extract rows from one segment.
    ///
    /// Returns the raw answer: possibly markdown-wrapped JSON text.
    async fn extract(&self, schema_json: &str, segment_context: &str) -> Result<String, Self::Error>;

    /// Summarize a whole document, or answer [`crate::INVALID_PARSING`]
    /// when it is unrelated to the table
    async fn summarize(&self, schema_json: &str, document_context: &str) -> Result<String, Self::Error>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Reads the target table description from the database catalog
///
/// Implemented by the infrastructure layer (ldo-store)
pub trait SchemaIntrospector {
    /// Error type for catalog lookups
    type Error;

    /// Describe the named table
    fn describe_table(&self, table: &str) -> Result<TableSchema, Self::Error>;
}

/// Loads and segments source documents
///
/// Implemented by the application layer (ldo-extractor)
pub trait DocumentSource: Send + Sync {
    /// Error type for loading
    type Error;

    /// Load a file, or every supported file under a folder
    fn load_documents(&self, path: &Path) -> Result<Vec<DocumentUnit>, Self::Error>;

    /// Split a document into extraction segments
    fn segment(&self, document: &DocumentUnit) -> Vec<Segment>;
}

/// Result of inserting one document's rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    /// Rows written
    pub rows_inserted: usize,
    /// Batches executed
    pub batches: usize,
    /// Whether the transaction was committed
    pub committed: bool,
}

/// Transactional destination for validated rows
///
/// Implemented by the infrastructure layer (ldo-store)
pub trait RowSink: Send + Sync {
    /// Error type for inserts
    type Error;

    /// Insert `rows` (a JSON array of objects) in batches of `chunk_size`,
    /// all in one transaction
    fn insert_rows(
        &self,
        schema: &TableSchema,
        rows: &Value,
        chunk_size: usize,
    ) -> Result<InsertOutcome, Self::Error>;
}
