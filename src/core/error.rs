//! Error types for parameter binding and pipeline evaluation

use thiserror::Error;

/// Errors raised while binding parameters or evaluating a pipeline
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Parameter '{name}' expects an integer, got '{value}'")]
    InvalidInteger { name: String, value: String },

    #[error("Parameter '{name}' expects type {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Field '{field}' references unbound parameter '{name}'")]
    UnresolvedPlaceholder { field: String, name: String },

    #[error("Field '{field}' must be a non-negative integer, got '{value}'")]
    InvalidJobField { field: String, value: String },
}
