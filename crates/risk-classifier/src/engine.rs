//! Classifier Inference

use crate::config::ClassifierConfig;
use crate::dataset::Dataset;
use crate::pipeline::{RiskPipeline, TrainingReport};
use crate::tree::{argmax, N_CLASSES};
use crate::ClassifierError;
use chrono::{DateTime, Utc};
use data_validator::Validator;
use feature_engine::FeatureSet;
use rule_engine::{assess, RiskLevel, Violation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Version tag reported with model predictions
pub const MODEL_VERSION: &str = "microbial_rf_v1";

/// Per-class probabilities, rounded to 4 decimal places
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskProbabilities {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl RiskProbabilities {
    fn from_array(proba: &[f64; N_CLASSES]) -> Self {
        let round = |p: f64| (p * 10_000.0).round() / 10_000.0;
        Self {
            low: round(proba[RiskLevel::Low.index()]),
            medium: round(proba[RiskLevel::Medium.index()]),
            high: round(proba[RiskLevel::High.index()]),
        }
    }

    /// Probability of one level
    pub fn get(&self, level: RiskLevel) -> f64 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }
}

/// Opaque caller metadata accompanying a sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleMeta(pub BTreeMap<String, serde_json::Value>);

impl SampleMeta {
    /// Sample identity used as the persistence key, if the caller sent one
    pub fn sample_id(&self) -> Option<String> {
        match self.0.get("sample_id")? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }
}

/// Model verdict merged with the rule engine's explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub risk_level: RiskLevel,
    pub risk_probabilities: RiskProbabilities,
    pub score: u32,
    pub max_score: u32,
    pub violations: Vec<Violation>,
    pub possible_bacteria: Vec<String>,
    pub predicted_by_model: bool,
    pub model_version: String,
    pub timestamp: DateTime<Utc>,
}

/// Trained microbial-risk classifier
pub struct RiskClassifier {
    pipeline: RiskPipeline,
    validator: Validator,
    model_version: String,
}

impl RiskClassifier {
    /// Load the reference dataset and train.
    ///
    /// Fails with [`ClassifierError::DatasetMissing`] when the dataset file
    /// does not exist.
    pub fn train(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        info!("Training microbial-risk classifier from {}", config.dataset_path.display());
        let dataset = Dataset::load(&config.dataset_path)?;
        Self::from_dataset(&dataset, config)
    }

    /// Train on an already loaded dataset
    pub fn from_dataset(dataset: &Dataset, config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let samples = dataset.labelled();
        let pipeline = RiskPipeline::fit(&samples, &config.forest)?;
        Ok(Self {
            pipeline,
            validator: Validator::default(),
            model_version: config.model_version.clone(),
        })
    }

    /// Predict the risk level of one sample.
    ///
    /// Infinite values are rejected; missing and NaN values are imputed.
    /// The model's label is authoritative; the rule engine supplies score,
    /// violations, and organisms.
    pub fn predict(&self, features: &FeatureSet) -> Result<PredictionResult, ClassifierError> {
        self.validator.validate_values(features)?;

        let proba = self.pipeline.predict_proba(features);
        let risk_level = RiskLevel::from_index(argmax(&proba)).unwrap_or(RiskLevel::Low);
        let rules = assess(features);

        debug!(
            "Model prediction: {} (rules: {}, score {}/{})",
            risk_level, rules.risk_level, rules.score, rules.max_score
        );

        Ok(PredictionResult {
            risk_level,
            risk_probabilities: RiskProbabilities::from_array(&proba),
            score: rules.score,
            max_score: rules.max_score,
            violations: rules.violations,
            possible_bacteria: rules.possible_bacteria,
            predicted_by_model: true,
            model_version: self.model_version.clone(),
            timestamp: Utc::now(),
        })
    }

    /// Training summary
    pub fn report(&self) -> &TrainingReport {
        self.pipeline.report()
    }

    /// Version tag
    pub fn model_version(&self) -> &str {
        &self.model_version
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use feature_engine::Feature;

    /// Synthetic dataset spread over all three rule-derived levels
    pub(crate) fn synthetic_csv(rows: usize) -> String {
        let mut csv = String::from(
            "ph,Hardness,Solids,Chloramines,Sulfate,Conductivity,Organic_carbon,Trihalomethanes,Turbidity,Potability\n",
        );
        for i in 0..rows {
            let f = i as f64;
            let ph = if i % 11 == 0 { String::new() } else { format!("{:.2}", 5.5 + (f * 0.37) % 4.0) };
            csv.push_str(&format!(
                "{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{}\n",
                ph,
                150.0 + (f * 13.0) % 200.0,
                15_000.0 + (f * 977.0) % 15_000.0,
                5.0 + (f * 0.61) % 6.0,
                300.0 + (f * 7.0) % 150.0,
                350.0 + (f * 29.0) % 420.0,
                10.0 + (f * 0.83) % 10.0,
                50.0 + (f * 3.1) % 40.0,
                2.5 + (f * 0.29) % 3.0,
                i % 2
            ));
        }
        csv
    }

    pub(crate) fn trained() -> RiskClassifier {
        let dataset = Dataset::parse(&synthetic_csv(400)).unwrap();
        RiskClassifier::from_dataset(&dataset, &ClassifierConfig::fast("unused.csv")).unwrap()
    }

    #[test]
    fn test_predict_merges_rule_detail() {
        let classifier = trained();
        let sample = FeatureSet::default()
            .with(Feature::Ph, 9.0)
            .with(Feature::Turbidity, 5.0);

        let result = classifier.predict(&sample).unwrap();
        assert!(result.predicted_by_model);
        assert_eq!(result.model_version, MODEL_VERSION);
        assert_eq!(result.score, 5);
        assert_eq!(result.max_score, 14);
        assert_eq!(result.violations.len(), 2);
        assert_eq!(result.violations[0].field, Feature::Ph);
        assert_eq!(result.violations[1].field, Feature::Turbidity);
        assert_eq!(result.possible_bacteria.len(), 5);

        let p = result.risk_probabilities;
        assert!((p.low + p.medium + p.high - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_label_is_argmax_of_probabilities() {
        let classifier = trained();
        let sample = FeatureSet::default()
            .with(Feature::Hardness, 320.0)
            .with(Feature::Sulfate, 420.0);
        let result = classifier.predict(&sample).unwrap();

        let p = result.risk_probabilities;
        let best = p.get(result.risk_level);
        assert!(RiskLevel::ALL.iter().all(|&l| p.get(l) <= best + 1e-4));
    }

    #[test]
    fn test_inference_is_deterministic() {
        let classifier = trained();
        let sample = FeatureSet::default()
            .with(Feature::Chloramines, 9.4)
            .with(Feature::OrganicCarbon, 19.0)
            .with(Feature::Ph, 6.0);

        let a = classifier.predict(&sample).unwrap();
        let b = classifier.predict(&sample).unwrap();
        assert_eq!(a.risk_probabilities, b.risk_probabilities);
        assert_eq!(a.risk_level, b.risk_level);
    }

    #[test]
    fn test_infinite_value_is_input_error() {
        let classifier = trained();
        let sample = FeatureSet::default()
            .with(Feature::Ph, 7.0)
            .with(Feature::Solids, f64::INFINITY);
        let err = classifier.predict(&sample).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_train_fails_without_dataset() {
        let config = ClassifierConfig::fast("/nonexistent/water_potability.csv");
        assert!(matches!(
            RiskClassifier::train(&config),
            Err(ClassifierError::DatasetMissing(_))
        ));
    }

    #[test]
    fn test_sample_id_from_meta() {
        assert_eq!(SampleMeta::default().sample_id(), None);
        assert_eq!(SampleMeta::default().with("sample_id", "abc").sample_id().as_deref(), Some("abc"));
        assert_eq!(SampleMeta::default().with("sample_id", 42).sample_id().as_deref(), Some("42"));
        assert_eq!(SampleMeta::default().with("sample_id", "  ").sample_id(), None);
    }
}
