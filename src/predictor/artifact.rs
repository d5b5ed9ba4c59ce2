use anyhow::{Context, Result, bail, ensure};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::input::{FEATURE_FIELDS, FeatureRow, is_categorical};
use super::{DelayClassifier, Prediction};
use crate::error::ReportError;
use crate::fetch::read_source;
use crate::schema::Field;

/// Standardization applied to a numeric feature before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    pub mean: f64,
    pub std: f64,
}

/// Pre-trained logistic scoring model, exported as JSON:
/// ```json
/// {
///   "intercept": -0.31,
///   "numeric": { "discount_offered": 0.08, "weight_in_gms": -0.0004 },
///   "scaling": { "weight_in_gms": { "mean": 3634.0, "std": 1635.4 } },
///   "categorical": { "mode_of_shipment": { "Ship": 0.02, "Road": -0.01 } },
///   "threshold": 0.5,
///   "labels": ["0", "1"]
/// }
/// ```
/// `labels[1]` is predicted when the probability reaches `threshold`.
/// Categories the model has not seen contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    #[serde(default)]
    pub numeric: HashMap<Field, f64>,
    #[serde(default)]
    pub scaling: HashMap<Field, Scaling>,
    #[serde(default)]
    pub categorical: HashMap<Field, HashMap<String, f64>>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub labels: [String; 2],
}

fn default_threshold() -> f64 {
    0.5
}

impl LinearModel {
    /// Reads and checks an artifact from a path or URL.
    pub fn load(source: &str) -> Result<Self> {
        let bytes = read_source(source)?;
        let model: LinearModel = serde_json::from_slice(&bytes)
            .with_context(|| format!("model artifact '{source}' is not valid JSON"))?;
        model.check()?;
        Ok(model)
    }

    pub fn check(&self) -> Result<()> {
        ensure!(self.intercept.is_finite(), "intercept must be finite");
        ensure!(
            self.threshold > 0.0 && self.threshold < 1.0,
            "threshold must be in (0, 1), got {}",
            self.threshold
        );

        for (field, weight) in &self.numeric {
            if !FEATURE_FIELDS.contains(field) || is_categorical(*field) {
                bail!("'{field}' is not a numeric model feature");
            }
            ensure!(weight.is_finite(), "weight for '{field}' must be finite");
        }
        for (field, scaling) in &self.scaling {
            ensure!(
                self.numeric.contains_key(field),
                "scaling given for unweighted feature '{field}'"
            );
            ensure!(
                scaling.mean.is_finite() && scaling.std.is_finite() && scaling.std > 0.0,
                "invalid scaling for '{field}'"
            );
        }
        for (field, weights) in &self.categorical {
            if !is_categorical(*field) {
                bail!("'{field}' is not a categorical model feature");
            }
            ensure!(
                weights.values().all(|w| w.is_finite()),
                "weights for '{field}' must be finite"
            );
        }
        Ok(())
    }

    /// Log-odds of `labels[1]` for one row.
    pub fn score(&self, row: &FeatureRow) -> Result<f64, ReportError> {
        let mut z = self.intercept;

        for (field, weight) in &self.numeric {
            let value = row
                .get(*field)
                .and_then(|v| v.as_number())
                .ok_or_else(|| ReportError::invalid(field.as_str(), "expected a numeric value"))?;
            let value = match self.scaling.get(field) {
                Some(s) => (value - s.mean) / s.std,
                None => value,
            };
            z += weight * value;
        }

        for (field, weights) in &self.categorical {
            let value = row
                .get(*field)
                .and_then(|v| v.as_text())
                .ok_or_else(|| ReportError::invalid(field.as_str(), "expected a category"))?;
            z += weights.get(value).copied().unwrap_or(0.0);
        }

        Ok(z)
    }
}

impl DelayClassifier for LinearModel {
    fn predict(&self, row: &FeatureRow) -> Result<Prediction, ReportError> {
        let probability = 1.0 / (1.0 + (-self.score(row)?).exp());
        let label = if probability >= self.threshold {
            &self.labels[1]
        } else {
            &self.labels[0]
        };
        Ok(Prediction {
            label: label.clone(),
            probability: Some(probability),
        })
    }
}
