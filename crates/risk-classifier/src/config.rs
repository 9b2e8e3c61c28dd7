//! Classifier configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// floor(sqrt(n_features))
    Sqrt,
    /// floor(log2(n_features))
    Log2,
    /// Every feature
    All,
}

impl MaxFeatures {
    /// Number of candidate features for `n_features` columns (at least 1)
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::Sqrt => n.sqrt().floor() as usize,
            MaxFeatures::Log2 => n.log2().floor() as usize,
            MaxFeatures::All => n_features,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Per-class sample weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    /// n_samples / (n_classes * class_count)
    Balanced,
    /// Every sample weighs 1
    Uniform,
}

/// Random-forest hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub class_weight: ClassWeight,
    pub seed: u64,
    pub oob_score: bool,
    /// Worker threads for training; `None` uses available parallelism
    pub n_jobs: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 12,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: MaxFeatures::Sqrt,
            class_weight: ClassWeight::Balanced,
            seed: 42,
            oob_score: true,
            n_jobs: None,
        }
    }
}

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Reference dataset (CSV)
    pub dataset_path: PathBuf,
    /// Tag reported with every model prediction
    pub model_version: String,
    pub forest: ForestConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("water_potability.csv"),
            model_version: crate::engine::MODEL_VERSION.to_string(),
            forest: ForestConfig::default(),
        }
    }
}

impl ClassifierConfig {
    /// Small forest for tests and smoke runs
    pub fn fast(dataset_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            forest: ForestConfig {
                n_trees: 15,
                n_jobs: Some(2),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
