//! Microbial-Risk Classifier
//!
//! Trains a random forest on the reference potability dataset, using the
//! rule engine's labels as ground truth, and serves predictions that pair
//! the model verdict with the rule engine's violation detail.

mod config;
mod dataset;
mod engine;
mod forest;
mod pipeline;
mod service;
mod tree;

pub use config::{ClassWeight, ClassifierConfig, ForestConfig, MaxFeatures};
pub use dataset::Dataset;
pub use engine::{PredictionResult, RiskClassifier, RiskProbabilities, SampleMeta, MODEL_VERSION};
pub use forest::RandomForest;
pub use pipeline::{RiskPipeline, TrainingReport};
pub use service::RiskService;
pub use tree::{DecisionTree, TreeNode, TreeParams, N_CLASSES};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by training and prediction
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Reference dataset not found: {}", .0.display())]
    DatasetMissing(PathBuf),
    #[error("Failed to read dataset: {0}")]
    DatasetIo(#[from] std::io::Error),
    #[error("Dataset parse error on line {line}: {message}")]
    DatasetParse { line: usize, message: String },
    #[error("Got {labels} labels for {rows} dataset rows")]
    LabelCountMismatch { labels: usize, rows: usize },
    #[error("Dataset contains no rows")]
    EmptyDataset,
    #[error("Preprocessing failed: {0}")]
    Preprocess(#[from] feature_engine::PreprocessError),
    #[error("Training failed: {0}")]
    TrainingFailed(String),
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] data_validator::ValidationError),
    #[error("Persistence failed: {0}")]
    Persistence(#[from] storage::StorageError),
}

impl ClassifierError {
    /// Whether the error was caused by caller-supplied data
    pub fn is_input_error(&self) -> bool {
        matches!(self, ClassifierError::InvalidInput(_))
    }
}
