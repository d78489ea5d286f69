//! LDO Extractor
//!
//! Turns documents into stitched JSON row arrays using an extraction service.
//!
//! # Overview
//!
//! A document is cut into segments, every segment is sent to the model under
//! a process-wide rate limit and a retry policy, and the answers are stitched
//! back together in segment order. Malformed answers are dropped, not fatal.
//!
//! # Architecture
//!
//! ```text
//! Files → FsDocumentSource → Segmenter → SegmentWorkerPool
//!       → (RateLimiter → RetryingCaller → ExtractionService) per segment
//!       → stitcher → StitchOutcome
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use ldo_domain::traits::DocumentSource;
//! use ldo_extractor::{DocumentExtractor, ExtractorConfig, FsDocumentSource};
//! use ldo_llm::MockProvider;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = FsDocumentSource::new();
//! let documents = source.load_documents(Path::new("./invoices"))?;
//!
//! let extractor = DocumentExtractor::new(
//!     Arc::new(MockProvider::new("[]")),
//!     &ExtractorConfig::default(),
//! );
//!
//! for document in &documents {
//!     let outcome = extractor.parse("[]", source.segment(document)).await?;
//!     println!("{}: {} rows", document.source, outcome.rows.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod pages;
mod pool;
mod rate_limit;
mod retry;
mod segmenter;
mod source;
pub mod stitcher;


pub use config::ExtractorConfig;
pub use error::{ExtractorError, PoolError};
pub use extractor::DocumentExtractor;
pub use pages::{PageSelection, PAGE_BREAK};
pub use pool::SegmentWorkerPool;
pub use rate_limit::RateLimiter;
pub use retry::RetryingCaller;
pub use segmenter::{SegmentStrategy, Segmenter, DEFAULT_MAX_SEGMENT_SIZE, LINES_MAX_SEGMENT_SIZE};
pub use source::{drop_web_address_lines, html_to_text, FsDocumentSource, SUPPORTED_EXTENSIONS};
pub use stitcher::StitchOutcome;
