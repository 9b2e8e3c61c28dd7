//! Validation Error Types

use thiserror::Error;

/// Errors during data validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Too few parameters supplied
    #[error("At least {required} numeric parameters are required for microbial-risk assessment, got {present}")]
    InsufficientFeatures { present: usize, required: usize },

    /// Value is infinite or otherwise unusable
    #[error("{field} value {value} is not a finite number")]
    NonFinite { field: &'static str, value: f64 },
}
