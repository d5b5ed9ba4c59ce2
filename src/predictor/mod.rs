//! Delivery-delay prediction.
//!
//! [`DelayClassifier`] is the seam for any pre-trained model.
//! [`LinearModel`] implements it from a JSON artifact.
//! [`Predictor`] owns the loaded model, or the reason it could not be loaded,
//! for as long as the caller keeps it.

mod artifact;
mod input;

pub use artifact::{LinearModel, Scaling};
pub use input::{
    CATEGORICAL_FIELDS, FEATURE_FIELDS, FeatureRow, FeatureValue, FormOptions, PredictionInput,
};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::ReportError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub probability: Option<f64>,
}

/// Turns one feature row into a single predicted label.
pub trait DelayClassifier {
    fn predict(&self, row: &FeatureRow) -> Result<Prediction, ReportError>;
}

/// Prediction capability, either backed by a model or explicitly unavailable.
pub struct Predictor {
    model: Result<Box<dyn DelayClassifier>, String>,
}

impl Predictor {
    /// Loads the artifact at `source`. Failure leaves the predictor unavailable
    /// instead of returning an error.
    #[tracing::instrument]
    pub fn load(source: &str) -> Self {
        match LinearModel::load(source) {
            Ok(model) => {
                info!("Model artifact loaded");
                Self::with_model(model)
            }
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(error = %reason, "Model artifact could not be loaded, prediction disabled");
                Self::unavailable(reason)
            }
        }
    }

    pub fn with_model(model: impl DelayClassifier + 'static) -> Self {
        Self {
            model: Ok(Box::new(model)),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            model: Err(reason.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_ok()
    }

    /// Why prediction is disabled, if it is.
    pub fn notice(&self) -> Option<&str> {
        self.model.as_ref().err().map(String::as_str)
    }

    /// Builds the model row from `input` and asks the model for one label.
    pub fn predict(&self, input: &PredictionInput) -> Result<Prediction, ReportError> {
        let model = self
            .model
            .as_ref()
            .map_err(|reason| ReportError::ModelUnavailable(reason.clone()))?;
        let row = input.to_feature_row()?;
        model.predict(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::input::tests::sample_input;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingModel {
        calls: Rc<Cell<usize>>,
    }

    impl DelayClassifier for CountingModel {
        fn predict(&self, row: &FeatureRow) -> Result<Prediction, ReportError> {
            self.calls.set(self.calls.get() + 1);
            assert_eq!(row.len(), FEATURE_FIELDS.len());
            Ok(Prediction {
                label: "1".into(),
                probability: None,
            })
        }
    }

    #[test]
    fn test_available_predictor_calls_model_once() {
        let calls = Rc::new(Cell::new(0));
        let predictor = Predictor::with_model(CountingModel {
            calls: calls.clone(),
        });

        let prediction = predictor.predict(&sample_input()).unwrap();
        assert_eq!(prediction.label, "1");
        assert_eq!(calls.get(), 1);
        assert!(predictor.notice().is_none());
    }

    #[test]
    fn test_invalid_input_never_reaches_model() {
        let calls = Rc::new(Cell::new(0));
        let predictor = Predictor::with_model(CountingModel {
            calls: calls.clone(),
        });
        let input = PredictionInput {
            customer_rating: 42,
            ..sample_input()
        };

        assert!(predictor.predict(&input).is_err());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_unavailable_predictor_reports_model_unavailable() {
        let predictor = Predictor::unavailable("model file not found");
        assert!(!predictor.is_available());
        assert_eq!(predictor.notice(), Some("model file not found"));
        assert_eq!(
            predictor.predict(&sample_input()),
            Err(ReportError::ModelUnavailable("model file not found".into()))
        );
    }

    #[test]
    fn test_load_missing_artifact_is_unavailable() {
        let path = format!("{}/delivery_insights_no_such_model.json", std::env::temp_dir().display());
        let predictor = Predictor::load(&path);
        assert!(!predictor.is_available());
        assert!(matches!(
            predictor.predict(&sample_input()),
            Err(ReportError::ModelUnavailable(_))
        ));
    }
}
