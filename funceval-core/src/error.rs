//! Structured error types for the funceval workspace.

use thiserror::Error;

/// Unified error type for all evaluation operations.
///
/// Undefined metric values (precision with no positive predictions, and the
/// like) are data conditions represented as NaN; they never surface here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// A required collection was empty (no thresholds, empty curve).
    #[error("input count error: {0}")]
    InputCount(String),

    /// Wrong shape, range, or content of an input (threshold outside [0, 1],
    /// duplicate object IDs, mask length mismatch, ...).
    #[error("invalid input: {0}")]
    InputValidation(String),

    /// Two structures reference different term universes.
    #[error("ontology mismatch: {0}")]
    OntologyMismatch(String),

    /// The requested metric is undefined for the given centric mode.
    #[error("metric {metric} is not defined for {centric}-centric evaluation")]
    IncompatibleMetric {
        /// Name of the requested metric.
        metric: String,
        /// Centric mode of the confusion result.
        centric: String,
    },

    /// A curve and its threshold array disagree in length.
    #[error("shape mismatch: expected length {expected}, found {found}")]
    ShapeMismatch {
        /// Expected length (number of thresholds).
        expected: usize,
        /// Length actually supplied.
        found: usize,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, EvalError>;
