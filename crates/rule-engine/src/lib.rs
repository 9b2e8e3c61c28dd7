//! WHO-Threshold Rule Engine
//!
//! Scores a water sample against a fixed table of threshold rules, maps the
//! weighted score to an ordinal risk level, and labels whole datasets with
//! the same policy so the labels can serve as classifier ground truth.

mod assessment;
mod labelling;
mod risk;
mod rules;

pub use assessment::{assess, compute_score, score_to_label, Assessment, Violation};
pub use labelling::{label_dataset, LabelDistribution, LabeledSample};
pub use risk::{ParseRiskLevelError, RiskLevel};
pub use rules::{
    metadata, FieldMetadata, Predicate, ThresholdRule, HIGH_THRESHOLD, MAX_SCORE,
    MEDIUM_THRESHOLD, WHO_RULES,
};
