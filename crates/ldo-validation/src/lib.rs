//! LDO Validation
//!
//! Scores parsed documents against the target table schema and, when a gold
//! test set is supplied, against the expected rows.
//!
//! The validation layer provides:
//! - Mandatory field detection per row
//! - Type conformity and unknown field rates
//! - Data type error listing
//! - Precision, recall, F1 and Jaccard similarity against gold rows
//! - A quality gate applying configurable thresholds
//!
//! # Examples
//!
//! ```
//! use ldo_domain::{ColumnSpec, TableSchema};
//! use ldo_validation::{QualityGate, ValidationConfig, ValidationEngine};
//! use serde_json::json;
//!
//! let schema = TableSchema::new("people", vec![ColumnSpec::new("name", "VARCHAR").not_null()]);
//! let engine = ValidationEngine::new(ValidationConfig::default());
//!
//! let report = engine.score(&schema, &json!([{"name": "Ann"}]), None).unwrap();
//! assert_eq!(report.conformity_rate, 1.0);
//!
//! let gate = QualityGate::new(ValidationConfig::default());
//! assert!(gate.evaluate(&report).is_accepted());
//! ```

#![warn(missing_docs)]

mod config;
mod engine;
mod error;
pub mod flatten;
mod gate;
pub mod similarity;
mod testset;

pub use config::ValidationConfig;
pub use engine::ValidationEngine;
pub use error::ValidationError;
pub use gate::{GateResult, GateStatus, QualityGate, RejectionReason};
pub use testset::GoldSet;
