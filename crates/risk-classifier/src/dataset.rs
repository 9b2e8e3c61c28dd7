//! Reference Dataset Loading

use crate::ClassifierError;
use feature_engine::{Feature, FeatureSet, FEATURE_DIMENSION};
use rule_engine::{label_dataset, LabeledSample, RiskLevel};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const MISSING_MARKERS: [&str; 5] = ["", "nan", "na", "null", "none"];

/// Tabular water-quality dataset normalized to the feature schema
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: Vec<String>,
    /// Source column for each feature, in schema order
    columns: [Option<usize>; FEATURE_DIMENSION],
    rows: Vec<FeatureSet>,
    /// Raw data lines, kept for rewriting with a label column
    lines: Vec<String>,
}

impl Dataset {
    /// Load a CSV file.
    ///
    /// A missing file is reported as [`ClassifierError::DatasetMissing`].
    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        if !path.exists() {
            return Err(ClassifierError::DatasetMissing(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        let dataset = Self::parse(&text)?;
        info!("Loaded dataset {} ({} rows)", path.display(), dataset.len());
        Ok(dataset)
    }

    /// Parse CSV text with a header line
    pub fn parse(text: &str) -> Result<Self, ClassifierError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

        let headers: Vec<String> = match lines.next() {
            Some((_, header)) => header.split(',').map(|h| h.trim().to_string()).collect(),
            None => return Err(ClassifierError::EmptyDataset),
        };

        let mut columns = [None; FEATURE_DIMENSION];
        for (idx, header) in headers.iter().enumerate() {
            if let Some(feature) = Feature::from_column(header) {
                columns[feature.index()].get_or_insert(idx);
            }
        }
        for feature in Feature::ALL {
            if columns[feature.index()].is_none() {
                warn!("Dataset has no {} column, treating it as missing", feature);
            }
        }

        let mut rows = Vec::new();
        let mut raw = Vec::new();
        for (line_idx, line) in lines {
            let line_no = line_idx + 1;
            let cells: Vec<&str> = line.split(',').map(str::trim).collect();
            if cells.len() > headers.len() {
                return Err(ClassifierError::DatasetParse {
                    line: line_no,
                    message: format!("expected {} fields, found {}", headers.len(), cells.len()),
                });
            }

            let mut set = FeatureSet::default();
            for feature in Feature::ALL {
                let Some(col) = columns[feature.index()] else {
                    continue;
                };
                let cell = cells.get(col).copied().unwrap_or("");
                set.set(feature, parse_cell(cell, feature, line_no)?);
            }
            rows.push(set);
            raw.push(line.to_string());
        }

        Ok(Self {
            headers,
            columns,
            rows,
            lines: raw,
        })
    }

    /// Feature rows in file order
    pub fn rows(&self) -> &[FeatureSet] {
        &self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Original header names
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Schema features with no source column
    pub fn missing_columns(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|f| self.columns[f.index()].is_none())
            .collect()
    }

    /// Rows with their rule-derived labels
    pub fn labelled(&self) -> Vec<LabeledSample> {
        label_dataset(&self.rows)
    }

    /// Render the original CSV with a label column set to `labels`.
    ///
    /// An existing column named `column` is overwritten, otherwise one is
    /// appended.
    pub fn to_csv_with_labels(&self, column: &str, labels: &[RiskLevel]) -> Result<String, ClassifierError> {
        if labels.len() != self.lines.len() {
            return Err(ClassifierError::LabelCountMismatch {
                labels: labels.len(),
                rows: self.lines.len(),
            });
        }

        let existing = self.headers.iter().position(|h| h == column);
        let mut headers = self.headers.clone();
        if existing.is_none() {
            headers.push(column.to_string());
        }

        let mut out = headers.join(",");
        out.push('\n');
        for (line, label) in self.lines.iter().zip(labels) {
            let mut cells: Vec<&str> = line.split(',').map(str::trim).collect();
            cells.resize(self.headers.len(), "");
            match existing {
                Some(idx) => cells[idx] = label.as_str(),
                None => cells.push(label.as_str()),
            }
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        Ok(out)
    }
}

fn parse_cell(cell: &str, feature: Feature, line: usize) -> Result<Option<f64>, ClassifierError> {
    if MISSING_MARKERS.contains(&cell.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }
    let value: f64 = cell.parse().map_err(|_| ClassifierError::DatasetParse {
        line,
        message: format!("{} value {:?} is not a number", feature, cell),
    })?;
    Ok(value.is_finite().then_some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
ph,Hardness,Solids,Chloramines,Sulfate,Conductivity,Organic_carbon,Trihalomethanes,Turbidity,Potability
,204.89,20791.31,7.30,368.51,564.30,10.37,86.99,2.96,0
3.71,129.42,18630.05,6.63,,592.88,15.18,56.32,4.50,0
9.1,224.23,19909.54,9.27,,418.60,16.86,66.42,3.05,1
";

    #[test]
    fn test_parse_normalizes_columns() {
        let dataset = Dataset::parse(SAMPLE).unwrap();
        assert_eq!(dataset.len(), 3);
        assert!(dataset.missing_columns().is_empty());

        let first = &dataset.rows()[0];
        assert_eq!(first.ph, None);
        assert_eq!(first.hardness, Some(204.89));
        assert_eq!(first.turbidity, Some(2.96));
        assert_eq!(dataset.rows()[1].sulfate, None);
    }

    #[test]
    fn test_leading_bom_is_ignored() {
        let dataset = Dataset::parse("\u{feff}ph,Turbidity\n7.1,2.0\n").unwrap();
        assert!(dataset.missing_columns().iter().all(|f| *f != Feature::Ph));
        assert_eq!(dataset.headers()[0], "ph");
        assert_eq!(dataset.rows()[0].ph, Some(7.1));
    }

    #[test]
    fn test_missing_column_is_all_null() {
        let dataset = Dataset::parse("ph,Turbidity\n7.0,5.0\nNaN,1.0\n").unwrap();
        assert_eq!(dataset.missing_columns().len(), 7);
        assert_eq!(dataset.rows()[0].solids, None);
        assert_eq!(dataset.rows()[1].ph, None);
    }

    #[test]
    fn test_labels_rows_with_rules() {
        let dataset = Dataset::parse(SAMPLE).unwrap();
        let labels: Vec<RiskLevel> = dataset.labelled().iter().map(|s| s.label).collect();
        // row 1: THM 86.99 -> 1; row 2: pH 3.71 (2) + turbidity 4.5 (3) -> 5;
        // row 3: pH 9.1 (2) + chloramines 9.27 (2) -> 4
        assert_eq!(labels, vec![RiskLevel::Low, RiskLevel::Medium, RiskLevel::Medium]);
    }

    #[test]
    fn test_bad_number_reports_line() {
        let err = Dataset::parse("ph,Turbidity\n7.0,abc\n").unwrap_err();
        assert!(matches!(err, ClassifierError::DatasetParse { line: 2, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = Dataset::load(Path::new("/nonexistent/water_potability.csv")).unwrap_err();
        assert!(matches!(err, ClassifierError::DatasetMissing(_)));
    }

    #[test]
    fn test_rewrite_with_labels() {
        let dataset = Dataset::parse("ph,Turbidity\n7.0,5.0\n9.0,5.0\n").unwrap();
        let labels: Vec<RiskLevel> = dataset.labelled().iter().map(|s| s.label).collect();
        let csv = dataset.to_csv_with_labels("MicrobialRisk", &labels).unwrap();
        assert_eq!(csv, "ph,Turbidity,MicrobialRisk\n7.0,5.0,medium\n9.0,5.0,medium\n");

        let again = Dataset::parse(&csv).unwrap();
        let rewritten = again.to_csv_with_labels("MicrobialRisk", &labels).unwrap();
        assert_eq!(rewritten, csv);
    }
}
