//! Fitted Preprocessing + Model Pipeline

use crate::config::ForestConfig;
use crate::forest::RandomForest;
use crate::tree::N_CLASSES;
use crate::ClassifierError;
use feature_engine::{FeatureSet, MedianImputer, StandardScaler, FEATURE_DIMENSION};
use rule_engine::{LabelDistribution, LabeledSample};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Summary of one training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub rows: usize,
    pub distribution: LabelDistribution,
    pub oob_accuracy: Option<f64>,
    pub elapsed_ms: u64,
}

/// Imputer -> scaler -> random forest, fitted once and then read-only
#[derive(Debug, Clone)]
pub struct RiskPipeline {
    imputer: MedianImputer,
    scaler: StandardScaler,
    forest: RandomForest,
    report: TrainingReport,
}

impl RiskPipeline {
    /// Fit every stage on rule-labelled samples
    pub fn fit(samples: &[LabeledSample], config: &ForestConfig) -> Result<Self, ClassifierError> {
        if samples.is_empty() {
            return Err(ClassifierError::EmptyDataset);
        }
        let start = Instant::now();

        let rows: Vec<[f64; FEATURE_DIMENSION]> = samples.iter().map(|s| s.features.to_row()).collect();
        let labels: Vec<usize> = samples.iter().map(|s| s.label.index()).collect();

        let imputer = MedianImputer::fit(&rows)?;
        let imputed = imputer.transform_all(&rows);

        let scaler = StandardScaler::fit(&imputed)?;
        let scaled = scaler.transform_all(&imputed);

        let forest = RandomForest::fit(&scaled, &labels, config)?;

        let report = TrainingReport {
            rows: samples.len(),
            distribution: LabelDistribution::from_labels(samples.iter().map(|s| &s.label)),
            oob_accuracy: forest.oob_score(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Microbial-risk RF trained in {}ms: OOB accuracy {}, class distribution: {}",
            report.elapsed_ms,
            report
                .oob_accuracy
                .map_or_else(|| "n/a".to_string(), |a| format!("{:.3}", a)),
            report.distribution
        );

        Ok(Self {
            imputer,
            scaler,
            forest,
            report,
        })
    }

    /// Class probabilities in [`rule_engine::RiskLevel::index`] order.
    ///
    /// Missing or NaN values are imputed with the training medians.
    pub fn predict_proba(&self, features: &FeatureSet) -> [f64; N_CLASSES] {
        let row = features.to_row();
        let imputed = self.imputer.transform(&row);
        let scaled = self.scaler.transform(&imputed);
        self.forest.predict_proba(&scaled)
    }

    /// Training summary
    pub fn report(&self) -> &TrainingReport {
        &self.report
    }

    /// Fitted imputer stage
    pub fn imputer(&self) -> &MedianImputer {
        &self.imputer
    }

    /// Fitted model stage
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }
}
