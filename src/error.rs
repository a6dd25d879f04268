//! Error types for the vector index
//!
//! This module provides structured error types using thiserror. Every
//! variant describes caller misuse detected before any mutation happens,
//! so none of them are worth retrying unchanged.

use thiserror::Error;

/// Errors that can occur during vector operations.
///
/// All error messages include actionable suggestions for resolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors use the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(
        "Cannot quantize a vector with zero value spread (all components equal {value})\nSuggestion: Skip quantization for constant vectors or store them unquantized"
    )]
    DegenerateRange { value: f32 },

    #[error("Cannot quantize an empty vector\nSuggestion: Provide at least one component")]
    EmptyVector,

    #[error(
        "Vector component {index} is not finite\nSuggestion: Check the embedding pipeline for NaN or infinite outputs"
    )]
    NonFiniteValue { index: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error(
        "Document {id} is already indexed\nSuggestion: Use a fresh id or configure duplicate_ids = \"alias\""
    )]
    DuplicateId { id: i64 },

    #[error("Failed to build search worker pool: {0}\nSuggestion: Lower engine.parallel_threads")]
    ThreadPool(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl VectorError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that surface layers can emit in JSON
    /// responses for programmatic error handling.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::DegenerateRange { .. } => "DEGENERATE_RANGE",
            Self::EmptyVector => "EMPTY_VECTOR",
            Self::NonFiniteValue { .. } => "NON_FINITE_VALUE",
            Self::InvalidDimension { .. } => "INVALID_DIMENSION",
            Self::DuplicateId { .. } => "DUPLICATE_ID",
            Self::ThreadPool(_) => "THREAD_POOL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::DimensionMismatch { .. } => vec![
                "Check engine.dimension against the embedding model output size",
                "Rebuild the index if the embedding model changed",
            ],
            Self::DegenerateRange { .. } | Self::EmptyVector => {
                vec!["Constant vectors carry no quantizable information"]
            }
            Self::DuplicateId { .. } => vec![
                "Ids must be unique while duplicate_ids = \"reject\"",
                "Switch to duplicate_ids = \"alias\" to keep both entries searchable",
            ],
            Self::ThreadPool(_) => vec!["Set engine.parallel_threads = 0 to use the rayon default"],
            _ => vec![],
        }
    }
}

/// Result type alias for vector operations
pub type VectorResult<T> = Result<T, VectorError>;
