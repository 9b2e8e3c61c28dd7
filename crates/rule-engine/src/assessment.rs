//! Rule Evaluation and Assessment

use crate::risk::RiskLevel;
use crate::rules::{metadata, ThresholdRule, HIGH_THRESHOLD, MAX_SCORE, MEDIUM_THRESHOLD, WHO_RULES};
use feature_engine::{Feature, FeatureSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// A triggered threshold rule for one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub field: Feature,
    pub rule: String,
    /// Triggering value, rounded to 4 decimal places
    pub value: f64,
    pub weight: u32,
    pub bacteria: Vec<String>,
    pub health_risk: String,
    pub biofilm: String,
    pub unit: String,
}

impl Violation {
    fn from_rule(rule: &ThresholdRule, value: f64) -> Self {
        let meta = metadata(rule.field);
        Self {
            field: rule.field,
            rule: rule.rule.to_string(),
            value: round4(value),
            weight: rule.weight,
            bacteria: rule.bacteria.iter().map(|b| b.to_string()).collect(),
            health_risk: meta.health_risk.to_string(),
            biofilm: meta.biofilm.to_string(),
            unit: meta.unit.to_string(),
        }
    }
}

/// Rule-only microbial-risk assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub risk_level: RiskLevel,
    pub score: u32,
    pub max_score: u32,
    pub violations: Vec<Violation>,
    /// Union of violation organisms, first-seen order
    pub possible_bacteria: Vec<String>,
    pub predicted_by_model: bool,
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Evaluate every rule in table order.
///
/// Missing and non-finite values are skipped. Returns the weighted score and
/// the triggered violations in rule order.
pub fn compute_score(features: &FeatureSet) -> (u32, Vec<Violation>) {
    let mut score = 0;
    let mut violations = Vec::new();

    for rule in &WHO_RULES {
        let value = match features.get(rule.field) {
            Some(v) if v.is_finite() => v,
            _ => continue,
        };
        if rule.predicate.is_violated(value) {
            score += rule.weight;
            violations.push(Violation::from_rule(rule, value));
        }
    }

    (score, violations)
}

/// Map a score to a risk level using fractions of [`MAX_SCORE`].
///
/// The comparison is against the real-valued product, not a rounded integer.
pub fn score_to_label(score: u32) -> RiskLevel {
    let score = f64::from(score);
    let max = f64::from(MAX_SCORE);
    if score >= max * HIGH_THRESHOLD {
        RiskLevel::High
    } else if score >= max * MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Full rule-only assessment of one sample
pub fn assess(features: &FeatureSet) -> Assessment {
    let (score, violations) = compute_score(features);
    let risk_level = score_to_label(score);

    let mut seen = HashSet::new();
    let possible_bacteria: Vec<String> = violations
        .iter()
        .flat_map(|v| v.bacteria.iter())
        .filter(|b| seen.insert(b.as_str()))
        .cloned()
        .collect();

    debug!(
        "Rule assessment: score={}/{} level={} violations={}",
        score,
        MAX_SCORE,
        risk_level,
        violations.len()
    );

    Assessment {
        risk_level,
        score,
        max_score: MAX_SCORE,
        violations,
        possible_bacteria,
        predicted_by_model: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn safe_sample() -> FeatureSet {
        FeatureSet {
            ph: Some(7.0),
            hardness: Some(150.0),
            solids: Some(500.0),
            chloramines: Some(2.0),
            sulfate: Some(100.0),
            conductivity: Some(300.0),
            organic_carbon: Some(5.0),
            trihalomethanes: Some(20.0),
            turbidity: Some(1.0),
        }
    }

    fn violating_sample() -> FeatureSet {
        FeatureSet {
            ph: Some(9.0),
            hardness: Some(350.0),
            solids: Some(30_000.0),
            chloramines: Some(10.0),
            sulfate: Some(450.0),
            conductivity: Some(750.0),
            organic_carbon: Some(20.0),
            trihalomethanes: Some(90.0),
            turbidity: Some(5.0),
        }
    }

    #[test]
    fn test_all_null_is_low() {
        let (score, violations) = compute_score(&FeatureSet::default());
        assert_eq!(score, 0);
        assert!(violations.is_empty());
        assert_eq!(assess(&FeatureSet::default()).risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_all_violated_is_max() {
        let result = assess(&violating_sample());
        assert_eq!(result.score, MAX_SCORE);
        assert_eq!(result.max_score, 14);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.violations.len(), 9);
    }

    #[test]
    fn test_safe_sample_is_low() {
        let result = assess(&safe_sample());
        assert_eq!(result.score, 0);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.violations.is_empty());
        assert!(result.possible_bacteria.is_empty());
        assert!(!result.predicted_by_model);
    }

    #[test]
    fn test_ph_and_turbidity_example() {
        let sample = FeatureSet::default()
            .with(Feature::Ph, 9.0)
            .with(Feature::Turbidity, 5.0);
        let result = assess(&sample);

        assert_eq!(result.score, 5);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        let fields: Vec<Feature> = result.violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec![Feature::Ph, Feature::Turbidity]);
        assert_eq!(
            result.possible_bacteria,
            vec![
                "Escherichia coli",
                "Salmonella spp.",
                "Vibrio cholerae",
                "E. coli",
                "Shigella spp.",
            ]
        );
        assert_eq!(result.violations[1].unit, "NTU");
        assert_eq!(result.violations[0].health_risk, "GI irritation, reduced disinfection efficiency");
    }

    #[test]
    fn test_label_boundaries() {
        assert_eq!(score_to_label(0), RiskLevel::Low);
        assert_eq!(score_to_label(2), RiskLevel::Low);
        assert_eq!(score_to_label(3), RiskLevel::Medium);
        assert_eq!(score_to_label(5), RiskLevel::Medium);
        assert_eq!(score_to_label(6), RiskLevel::High);
        assert_eq!(score_to_label(MAX_SCORE), RiskLevel::High);
    }

    #[test]
    fn test_non_finite_values_skipped() {
        let sample = FeatureSet::default()
            .with(Feature::Ph, f64::NAN)
            .with(Feature::Turbidity, f64::INFINITY);
        assert_eq!(compute_score(&sample).0, 0);
    }

    #[test]
    fn test_value_rounded_for_presentation() {
        let sample = FeatureSet::default().with(Feature::Ph, 9.123_456_78);
        let (_, violations) = compute_score(&sample);
        assert_eq!(violations[0].value, 9.1235);
    }

    fn arb_sample() -> impl Strategy<Value = FeatureSet> {
        proptest::array::uniform9(proptest::option::of(0.0f64..40_000.0)).prop_map(|values| {
            let mut set = FeatureSet::default();
            for (feature, value) in Feature::ALL.into_iter().zip(values) {
                set.set(feature, value);
            }
            set
        })
    }

    proptest! {
        #[test]
        fn prop_score_bounded_and_idempotent(sample in arb_sample()) {
            let first = assess(&sample);
            prop_assert!(first.score <= MAX_SCORE);
            prop_assert_eq!(first.score, first.violations.iter().map(|v| v.weight).sum::<u32>());
            prop_assert_eq!(first, assess(&sample));
        }

        #[test]
        fn prop_adding_violation_never_lowers_risk(sample in arb_sample(), idx in 0usize..9) {
            let base = assess(&sample);
            let worse = sample.with(Feature::ALL[idx], violating_sample().get(Feature::ALL[idx]).unwrap());
            let after = assess(&worse);
            prop_assert!(after.score >= base.score);
            prop_assert!(after.risk_level >= base.risk_level);
        }
    }
}
