//! Feature Set Assembly

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of physicochemical parameters in the schema
pub const FEATURE_DIMENSION: usize = 9;

/// One of the nine water-quality parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Ph,
    Hardness,
    Solids,
    Chloramines,
    Sulfate,
    Conductivity,
    OrganicCarbon,
    Trihalomethanes,
    Turbidity,
}

impl Feature {
    /// All features in schema (column) order
    pub const ALL: [Feature; FEATURE_DIMENSION] = [
        Feature::Ph,
        Feature::Hardness,
        Feature::Solids,
        Feature::Chloramines,
        Feature::Sulfate,
        Feature::Conductivity,
        Feature::OrganicCarbon,
        Feature::Trihalomethanes,
        Feature::Turbidity,
    ];

    /// Schema field name
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Ph => "ph",
            Feature::Hardness => "hardness",
            Feature::Solids => "solids",
            Feature::Chloramines => "chloramines",
            Feature::Sulfate => "sulfate",
            Feature::Conductivity => "conductivity",
            Feature::OrganicCarbon => "organic_carbon",
            Feature::Trihalomethanes => "trihalomethanes",
            Feature::Turbidity => "turbidity",
        }
    }

    /// Column position in a feature row
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Map a dataset column header onto the schema.
    ///
    /// Accepts the schema names and the historical capitalized headers
    /// (`Hardness`, `Organic_carbon`, ...). Unknown columns map to `None`.
    pub fn from_column(header: &str) -> Option<Self> {
        let normalized = header.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL.into_iter().find(|f| f.as_str() == normalized)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A water sample: each parameter is optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSet {
    pub ph: Option<f64>,
    pub hardness: Option<f64>,
    pub solids: Option<f64>,
    pub chloramines: Option<f64>,
    pub sulfate: Option<f64>,
    pub conductivity: Option<f64>,
    pub organic_carbon: Option<f64>,
    pub trihalomethanes: Option<f64>,
    pub turbidity: Option<f64>,
}

impl FeatureSet {
    /// Read one parameter
    pub fn get(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::Ph => self.ph,
            Feature::Hardness => self.hardness,
            Feature::Solids => self.solids,
            Feature::Chloramines => self.chloramines,
            Feature::Sulfate => self.sulfate,
            Feature::Conductivity => self.conductivity,
            Feature::OrganicCarbon => self.organic_carbon,
            Feature::Trihalomethanes => self.trihalomethanes,
            Feature::Turbidity => self.turbidity,
        }
    }

    /// Overwrite one parameter
    pub fn set(&mut self, feature: Feature, value: Option<f64>) {
        let slot = match feature {
            Feature::Ph => &mut self.ph,
            Feature::Hardness => &mut self.hardness,
            Feature::Solids => &mut self.solids,
            Feature::Chloramines => &mut self.chloramines,
            Feature::Sulfate => &mut self.sulfate,
            Feature::Conductivity => &mut self.conductivity,
            Feature::OrganicCarbon => &mut self.organic_carbon,
            Feature::Trihalomethanes => &mut self.trihalomethanes,
            Feature::Turbidity => &mut self.turbidity,
        };
        *slot = value;
    }

    /// Builder-style setter
    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.set(feature, Some(value));
        self
    }

    /// Iterate over (feature, value) pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (Feature, Option<f64>)> + '_ {
        Feature::ALL.into_iter().map(move |f| (f, self.get(f)))
    }

    /// Number of parameters carrying a value
    pub fn present_count(&self) -> usize {
        self.iter().filter(|(_, v)| v.is_some()).count()
    }

    /// Dense row in schema order, missing values as NaN
    pub fn to_row(&self) -> [f64; FEATURE_DIMENSION] {
        let mut row = [f64::NAN; FEATURE_DIMENSION];
        for (feature, value) in self.iter() {
            if let Some(v) = value {
                row[feature.index()] = v;
            }
        }
        row
    }

    /// Inverse of [`FeatureSet::to_row`]; NaN becomes missing
    pub fn from_row(row: &[f64; FEATURE_DIMENSION]) -> Self {
        let mut set = Self::default();
        for feature in Feature::ALL {
            let v = row[feature.index()];
            set.set(feature, if v.is_nan() { None } else { Some(v) });
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_historical_headers() {
        assert_eq!(Feature::from_column("ph"), Some(Feature::Ph));
        assert_eq!(Feature::from_column("Hardness"), Some(Feature::Hardness));
        assert_eq!(Feature::from_column("Organic_carbon"), Some(Feature::OrganicCarbon));
        assert_eq!(Feature::from_column(" Trihalomethanes "), Some(Feature::Trihalomethanes));
        assert_eq!(Feature::from_column("Potability"), None);
    }

    #[test]
    fn test_row_round_trip_keeps_missing() {
        let set = FeatureSet::default()
            .with(Feature::Ph, 7.2)
            .with(Feature::Turbidity, 3.1);
        let row = set.to_row();

        assert_eq!(row[Feature::Ph.index()], 7.2);
        assert!(row[Feature::Solids.index()].is_nan());
        assert_eq!(FeatureSet::from_row(&row), set);
        assert_eq!(set.present_count(), 2);
    }

    #[test]
    fn test_deserialize_partial_payload() {
        let set: FeatureSet =
            serde_json::from_str(r#"{"ph": 6.1, "organic_carbon": null}"#).unwrap();
        assert_eq!(set.ph, Some(6.1));
        assert_eq!(set.organic_carbon, None);
        assert_eq!(set.present_count(), 1);
    }
}
