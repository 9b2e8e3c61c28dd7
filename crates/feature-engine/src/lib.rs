//! Feature Engineering Engine
//!
//! Provides the fixed water-quality feature schema, per-column statistics,
//! and the preprocessing stages (median imputation, standardization) shared
//! by training and inference.

mod features;
mod preprocess;
mod statistics;

pub use features::{Feature, FeatureSet, FEATURE_DIMENSION};
pub use preprocess::{MedianImputer, StandardScaler};
pub use statistics::StatisticalFeatures;

use thiserror::Error;

/// Errors raised while fitting or applying preprocessing stages
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Cannot fit {stage} on an empty matrix")]
    EmptyInput { stage: &'static str },
}
