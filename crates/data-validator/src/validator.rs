//! Feature Set Validator

use crate::error::ValidationError;
use feature_engine::FeatureSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum number of non-null parameters a request must carry
    pub min_present_features: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_present_features: 2,
        }
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the sample is acceptable
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of non-null parameters seen
    pub fields_present: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(fields_present: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            fields_present,
        }
    }

    /// Create an invalid result with errors
    pub fn invalid(errors: Vec<ValidationError>, fields_present: usize) -> Self {
        Self {
            valid: false,
            errors,
            fields_present,
        }
    }

    /// First error, if any
    pub fn into_result(self) -> Result<usize, ValidationError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.fields_present),
        }
    }
}

/// Validator for incoming water samples
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Reject infinite values. NaN is accepted and treated as missing.
    pub fn validate_values(&self, features: &FeatureSet) -> Result<(), ValidationError> {
        for (feature, value) in features.iter() {
            if let Some(v) = value {
                if v.is_infinite() {
                    return Err(ValidationError::NonFinite {
                        field: feature.as_str(),
                        value: v,
                    });
                }
            }
        }
        Ok(())
    }

    /// Enforce the minimum number of non-null parameters
    pub fn validate_presence(&self, features: &FeatureSet) -> Result<usize, ValidationError> {
        let present = features
            .iter()
            .filter(|(_, v)| v.is_some_and(|v| !v.is_nan()))
            .count();
        if present < self.config.min_present_features {
            return Err(ValidationError::InsufficientFeatures {
                present,
                required: self.config.min_present_features,
            });
        }
        Ok(present)
    }

    /// Run every check and collect all errors
    pub fn validate(&self, features: &FeatureSet) -> ValidationResult {
        let mut errors = Vec::new();

        let present = match self.validate_presence(features) {
            Ok(n) => n,
            Err(e) => {
                errors.push(e);
                features.present_count()
            }
        };
        if let Err(e) = self.validate_values(features) {
            errors.push(e);
        }

        debug!("Validated sample: {} fields present, {} errors", present, errors.len());

        if errors.is_empty() {
            ValidationResult::valid(present)
        } else {
            ValidationResult::invalid(errors, present)
        }
    }

    /// Current configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
