//! LDO Domain Layer
//!
//! Core data model for the document-to-table extraction pipeline. Everything
//! the other crates exchange lives here: the target table description, the
//! document lifecycle, the per-document validation report, and the traits
//! that define the boundary with external collaborators.
//!
//! ## Key Concepts
//!
//! - **TableSchema**: ordered column description of the target table
//! - **DocumentUnit**: one source document moving through the pipeline
//! - **Segment**: a slice of a document dispatched as one extraction call
//! - **DocumentState**: lifecycle state machine of a document
//! - **ValidationReport**: quantitative scores produced after parsing
//!
//! ## Architecture
//!
//! Infrastructure (LLM clients, SQLite, the filesystem) implements the traits
//! in [`traits`]. This crate holds no I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod report;
pub mod schema;
pub mod traits;

// Re-exports for convenience
pub use document::{
    is_invalid_summary, DocumentId, DocumentState, DocumentUnit, Segment, INVALID_PARSING,
};
pub use error::{DomainError, SchemaError};
pub use report::{GoldMetrics, MissingField, ValidationReport};
pub use schema::{ColumnSpec, JsonKind, TableSchema, TypeFamily};
