//! WHO Threshold Rule Table
//!
//! Limits are calibrated to the reference potability dataset. Where the raw
//! WHO limit flags nearly every row (the dataset is largely untreated water)
//! the break-point is moved to the dataset's 75th percentile, keeping the
//! WHO direction and the organism mapping:
//!
//! | field           | WHO limit         | used        |
//! |-----------------|-------------------|-------------|
//! | ph              | < 6.5 or > 8.5    | same        |
//! | hardness        | > 500             | > 300       |
//! | solids          | > 1000            | > 27 000    |
//! | chloramines     | > 3 or < 0.5      | > 9         |
//! | sulfate         | > 250             | > 400       |
//! | conductivity    | > 1500            | > 700       |
//! | organic_carbon  | > 5               | > 18        |
//! | trihalomethanes | > 100             | > 80        |
//! | turbidity       | > 5               | > 4         |

use feature_engine::Feature;
use serde::Serialize;

/// Comparison applied to a single parameter value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Violated when `value < low || value > high`
    Outside { low: f64, high: f64 },
    /// Violated when `value > limit`
    Above { limit: f64 },
    /// Violated when `value < limit`
    Below { limit: f64 },
}

impl Predicate {
    /// Whether `value` violates this predicate
    pub fn is_violated(&self, value: f64) -> bool {
        match *self {
            Predicate::Outside { low, high } => value < low || value > high,
            Predicate::Above { limit } => value > limit,
            Predicate::Below { limit } => value < limit,
        }
    }
}

/// One row of the rule table
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThresholdRule {
    pub field: Feature,
    pub rule: &'static str,
    pub predicate: Predicate,
    pub weight: u32,
    pub bacteria: &'static [&'static str],
}

/// Descriptive context shown alongside a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldMetadata {
    pub health_risk: &'static str,
    pub biofilm: &'static str,
    pub unit: &'static str,
}

/// Rules in evaluation order
pub const WHO_RULES: [ThresholdRule; 9] = [
    ThresholdRule {
        field: Feature::Ph,
        rule: "pH outside 6.5–8.5 range",
        predicate: Predicate::Outside { low: 6.5, high: 8.5 },
        weight: 2,
        bacteria: &["Escherichia coli", "Salmonella spp.", "Vibrio cholerae"],
    },
    ThresholdRule {
        field: Feature::Hardness,
        rule: "Hardness > 300 mg/L",
        predicate: Predicate::Above { limit: 300.0 },
        weight: 1,
        bacteria: &["Legionella pneumophila", "Pseudomonas aeruginosa"],
    },
    ThresholdRule {
        field: Feature::Solids,
        rule: "TDS > 27,000 ppm (high dissolved solids)",
        predicate: Predicate::Above { limit: 27_000.0 },
        weight: 1,
        bacteria: &["E. coli", "Enterobacter spp."],
    },
    ThresholdRule {
        field: Feature::Chloramines,
        rule: "Chloramines > 9 ppm (high residual)",
        predicate: Predicate::Above { limit: 9.0 },
        weight: 2,
        bacteria: &["Mycobacterium avium", "Legionella pneumophila", "Pseudomonas aeruginosa"],
    },
    ThresholdRule {
        field: Feature::Sulfate,
        rule: "Sulfate > 400 mg/L",
        predicate: Predicate::Above { limit: 400.0 },
        weight: 1,
        bacteria: &["Clostridium spp.", "Desulfovibrio spp.", "E. coli"],
    },
    ThresholdRule {
        field: Feature::Conductivity,
        rule: "Conductivity > 700 µS/cm",
        predicate: Predicate::Above { limit: 700.0 },
        weight: 1,
        bacteria: &["E. coli", "Klebsiella spp.", "Enterococcus spp."],
    },
    ThresholdRule {
        field: Feature::OrganicCarbon,
        rule: "TOC > 18 ppm (nutrient-rich for biofilms)",
        predicate: Predicate::Above { limit: 18.0 },
        weight: 2,
        bacteria: &[
            "E. coli",
            "Salmonella spp.",
            "Campylobacter jejuni",
            "Pseudomonas aeruginosa",
        ],
    },
    ThresholdRule {
        field: Feature::Trihalomethanes,
        rule: "THMs > 80 µg/L (elevated disinfection byproducts)",
        predicate: Predicate::Above { limit: 80.0 },
        weight: 1,
        bacteria: &["E. coli", "Enteric bacteria (risk-based)"],
    },
    ThresholdRule {
        field: Feature::Turbidity,
        rule: "Turbidity > 4 NTU (pathogen shielding risk)",
        predicate: Predicate::Above { limit: 4.0 },
        weight: 3,
        bacteria: &["E. coli", "Vibrio cholerae", "Salmonella spp.", "Shigella spp."],
    },
];

const fn total_weight(rules: &[ThresholdRule]) -> u32 {
    let mut sum = 0;
    let mut i = 0;
    while i < rules.len() {
        sum += rules[i].weight;
        i += 1;
    }
    sum
}

/// Sum of all rule weights
pub const MAX_SCORE: u32 = total_weight(&WHO_RULES);

/// Fraction of [`MAX_SCORE`] at or above which a sample is high risk
pub const HIGH_THRESHOLD: f64 = 0.40;

/// Fraction of [`MAX_SCORE`] at or above which a sample is medium risk
pub const MEDIUM_THRESHOLD: f64 = 0.20;

/// Health, biofilm, and unit context for a parameter
pub fn metadata(field: Feature) -> &'static FieldMetadata {
    match field {
        Feature::Ph => &FieldMetadata {
            health_risk: "GI irritation, reduced disinfection efficiency",
            biofilm: "Biofilm formation",
            unit: "",
        },
        Feature::Hardness => &FieldMetadata {
            health_risk: "Scaling, aesthetic issues",
            biofilm: "Pipe scale biofilms",
            unit: "mg/L",
        },
        Feature::Solids => &FieldMetadata {
            health_risk: "GI distress, dehydration",
            biofilm: "Mineral-associated biofilms",
            unit: "ppm",
        },
        Feature::Chloramines => &FieldMetadata {
            health_risk: "Eye, nose, stomach irritation",
            biofilm: "Chloramine-resistant biofilms",
            unit: "ppm",
        },
        Feature::Sulfate => &FieldMetadata {
            health_risk: "Diarrhea, dehydration",
            biofilm: "Anaerobic biofilms",
            unit: "mg/L",
        },
        Feature::Conductivity => &FieldMetadata {
            health_risk: "Salinity stress, GI discomfort",
            biofilm: "Ion-rich biofilms",
            unit: "µS/cm",
        },
        Feature::OrganicCarbon => &FieldMetadata {
            health_risk: "Increased DBPs, microbial regrowth",
            biofilm: "Nutrient-rich biofilms",
            unit: "ppm",
        },
        Feature::Trihalomethanes => &FieldMetadata {
            health_risk: "Long-term cancer risk",
            biofilm: "Indirect indicator (organic contamination)",
            unit: "µg/L",
        },
        Feature::Turbidity => &FieldMetadata {
            health_risk: "Pathogen shielding, infection risk",
            biofilm: "Particle-attached biofilms",
            unit: "NTU",
        },
    }
}
