//! LDO Pipeline
//!
//! Moves documents through the extraction-validation pipeline and reports
//! how each one ended.
//!
//! # Overview
//!
//! A run has four stages:
//! - **Validate**: one summarization call per document; unrelated documents
//!   are rejected
//! - **Parse**: segments are extracted concurrently and stitched into one
//!   JSON array of rows
//! - **Score**: the rows are checked against the table schema (and the gold
//!   test set, when given), then gated
//! - **Insert**: each document's rows are committed in one transaction
//!
//! ## Document lifecycle
//!
//! | Stage | Success | Failure |
//! |-------|---------|---------|
//! | Validate | `VALID` | `REJECTED` |
//! | Parse | `PARSED` | `PARSE_FAILED` |
//! | Score | `SCORED` | (none; gate results are reported) |
//! | Insert | `INSERTED` | `INSERT_FAILED` |
//!
//! # Configuration
//!
//! ```toml
//! [pipeline]
//! max_etl_processors = 4
//! stop_if_invalidated_document = false
//! strict = false
//! max_db_insertion_chunk_size = 100
//! validation_stage_timeout_secs = 3600
//! parse_stage_timeout_secs = 3600
//! ```
//!
//! # Completion policy
//!
//! ```
//! use ldo_pipeline::{RunPolicy, RunSummary};
//!
//! let summary = RunSummary::new();
//! let policy = RunPolicy { strict: true, max_rejected_documents: Some(0) };
//! assert!(summary.is_success(&policy));
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod orchestrator;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use metrics::{DocumentOutcome, PolicyViolation, RunPolicy, RunSummary};
pub use orchestrator::PipelineOrchestrator;
