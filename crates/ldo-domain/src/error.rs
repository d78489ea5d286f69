//! Domain error types

use crate::document::DocumentState;
use thiserror::Error;

/// Errors raised while interpreting a table schema description
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// The columns description is not a JSON array
    #[error("Malformed schema: expected an array of columns, got {0}")]
    NotAnArray(String),

    /// A column entry is missing a required attribute
    #[error("Malformed schema: column {index} is missing '{attribute}'")]
    MissingAttribute {
        /// Position of the column in the description
        index: usize,
        /// Attribute that was not found
        attribute: &'static str,
    },

    /// The schema JSON could not be decoded at all
    #[error("Malformed schema: {0}")]
    Invalid(String),
}

/// Errors raised by domain invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A document attempted a state change the lifecycle does not allow
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state
        from: DocumentState,
        /// Requested state
        to: DocumentState,
    },

    /// Schema description error
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
