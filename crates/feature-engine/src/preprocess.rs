//! Preprocessing Stages
//!
//! Both stages are fitted once on the training matrix and then applied,
//! unchanged, to every inference row.

use crate::features::FEATURE_DIMENSION;
use crate::statistics::StatisticalFeatures;
use crate::PreprocessError;
use serde::{Deserialize, Serialize};
use tracing::debug;

type Row = [f64; FEATURE_DIMENSION];

/// Replaces missing (NaN) entries with the training-set column median
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    medians: Row,
}

impl MedianImputer {
    /// Fit per-column medians.
    ///
    /// A column with no observed value imputes 0.0.
    pub fn fit(rows: &[Row]) -> Result<Self, PreprocessError> {
        if rows.is_empty() {
            return Err(PreprocessError::EmptyInput { stage: "imputer" });
        }

        let mut medians = [0.0; FEATURE_DIMENSION];
        for (column, median) in medians.iter_mut().enumerate() {
            let stats = StatisticalFeatures::compute(&StatisticalFeatures::extract_column(rows, column));
            if stats.count > 0 {
                *median = stats.median;
            } else {
                debug!("Column {} has no observed values, imputing 0.0", column);
            }
        }

        Ok(Self { medians })
    }

    /// Fill missing entries of one row
    pub fn transform(&self, row: &Row) -> Row {
        let mut out = *row;
        for (value, median) in out.iter_mut().zip(self.medians.iter()) {
            if value.is_nan() {
                *value = *median;
            }
        }
        out
    }

    /// Fill missing entries of every row
    pub fn transform_all(&self, rows: &[Row]) -> Vec<Row> {
        rows.iter().map(|r| self.transform(r)).collect()
    }

    /// Fitted medians in schema order
    pub fn medians(&self) -> &Row {
        &self.medians
    }
}

/// Z-score standardization with training-set mean and standard deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Row,
    scale: Row,
}

impl StandardScaler {
    /// Fit per-column mean and population standard deviation.
    ///
    /// Zero-variance columns get a scale of 1.0.
    pub fn fit(rows: &[Row]) -> Result<Self, PreprocessError> {
        if rows.is_empty() {
            return Err(PreprocessError::EmptyInput { stage: "scaler" });
        }

        let mut mean = [0.0; FEATURE_DIMENSION];
        let mut scale = [1.0; FEATURE_DIMENSION];
        for column in 0..FEATURE_DIMENSION {
            let stats = StatisticalFeatures::compute(&StatisticalFeatures::extract_column(rows, column));
            mean[column] = stats.mean;
            if stats.std_dev > f64::EPSILON {
                scale[column] = stats.std_dev;
            }
        }

        Ok(Self { mean, scale })
    }

    /// Standardize one row
    pub fn transform(&self, row: &Row) -> Row {
        let mut out = [0.0; FEATURE_DIMENSION];
        for (i, value) in out.iter_mut().enumerate() {
            *value = (row[i] - self.mean[i]) / self.scale[i];
        }
        out
    }

    /// Standardize every row
    pub fn transform_all(&self, rows: &[Row]) -> Vec<Row> {
        rows.iter().map(|r| self.transform(r)).collect()
    }

    /// Fitted column means
    pub fn mean(&self) -> &Row {
        &self.mean
    }

    /// Fitted column scales
    pub fn scale(&self) -> &Row {
        &self.scale
    }
}
