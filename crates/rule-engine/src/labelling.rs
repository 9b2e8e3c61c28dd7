//! Training Label Generation
//!
//! Ground truth for the classifier comes from the rule engine itself. The
//! classifier therefore cannot be more accurate than this policy; it only
//! smooths the decision boundary between the discrete thresholds.

use crate::assessment::{compute_score, score_to_label};
use crate::risk::RiskLevel;
use feature_engine::FeatureSet;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// A dataset row with its rule-derived label
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSample {
    pub features: FeatureSet,
    pub label: RiskLevel,
}

/// Count of labels per risk level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl LabelDistribution {
    /// Tally a sequence of labels
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a RiskLevel>) -> Self {
        let mut dist = Self::default();
        for label in labels {
            match label {
                RiskLevel::Low => dist.low += 1,
                RiskLevel::Medium => dist.medium += 1,
                RiskLevel::High => dist.high += 1,
            }
        }
        dist
    }

    /// Count per class, indexed by [`RiskLevel::index`]
    pub fn as_array(&self) -> [usize; 3] {
        [self.low, self.medium, self.high]
    }

    /// Total labelled rows
    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

impl fmt::Display for LabelDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "low={} medium={} high={}", self.low, self.medium, self.high)
    }
}

/// Attach the rule-derived risk label to every row
pub fn label_dataset(rows: &[FeatureSet]) -> Vec<LabeledSample> {
    let labeled: Vec<LabeledSample> = rows
        .iter()
        .map(|features| {
            let (score, _) = compute_score(features);
            LabeledSample {
                features: *features,
                label: score_to_label(score),
            }
        })
        .collect();

    info!(
        "Labelled {} rows: {}",
        labeled.len(),
        LabelDistribution::from_labels(labeled.iter().map(|s| &s.label))
    );
    labeled
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::Feature;

    #[test]
    fn test_labels_follow_rules() {
        let rows = vec![
            FeatureSet::default(),
            FeatureSet::default().with(Feature::Ph, 9.0).with(Feature::Turbidity, 5.0),
            FeatureSet::default()
                .with(Feature::Turbidity, 5.0)
                .with(Feature::OrganicCarbon, 20.0)
                .with(Feature::Sulfate, 500.0),
        ];
        let labeled = label_dataset(&rows);

        let labels: Vec<RiskLevel> = labeled.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec![RiskLevel::Low, RiskLevel::Medium, RiskLevel::High]);
        assert_eq!(labeled[1].features, rows[1]);
    }

    #[test]
    fn test_labelling_is_deterministic() {
        let rows = vec![FeatureSet::default().with(Feature::Chloramines, 9.5).with(Feature::Hardness, 320.0)];
        assert_eq!(label_dataset(&rows), label_dataset(&rows));
    }

    #[test]
    fn test_distribution() {
        let labels = [RiskLevel::Low, RiskLevel::High, RiskLevel::Low];
        let dist = LabelDistribution::from_labels(labels.iter());
        assert_eq!(dist.as_array(), [2, 0, 1]);
        assert_eq!(dist.total(), 3);
        assert_eq!(dist.to_string(), "low=2 medium=0 high=1");
    }
}
