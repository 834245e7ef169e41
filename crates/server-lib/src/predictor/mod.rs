//! SLA violation prediction pipeline

mod encoder;
mod features;
mod holidays;
mod inference;
mod scaler;

pub use encoder::{
    CategoryEncoderTable, CATEGORY_FIELD, ITEM_FIELD, PRIORITY_FIELD, SUB_CATEGORY_FIELD,
    UNSEEN_CODE,
};
pub use features::{FeatureNormalizer, NormalizedFeatures, ValidationError};
pub use holidays::HolidayCalendar;
pub use inference::{Classification, Classifier, OnnxClassifier};
pub use scaler::{MinMaxScaler, ScaledColumns, FALLBACK_SCALED_COLUMN};

use std::sync::Arc;

use thiserror::Error;

use crate::artifacts::ArtifactSet;
use crate::models::{PredictionRequest, PredictionResponse};

/// Failure of one prediction call. Validation maps to a client error at
/// the API boundary; inference failures surface as structured internal
/// errors, never a panic.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0:#}")]
    Inference(anyhow::Error),
}

/// The full request-to-verdict pipeline: normalize, classify, format.
pub struct SlaPredictor {
    normalizer: FeatureNormalizer,
    classifier: Arc<dyn Classifier>,
}

impl SlaPredictor {
    pub fn new(normalizer: FeatureNormalizer, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            normalizer,
            classifier,
        }
    }

    /// Assemble the pipeline from a loaded artifact set
    pub fn from_artifacts(artifacts: &ArtifactSet) -> anyhow::Result<Self> {
        let classifier = OnnxClassifier::from_artifacts(artifacts)?;
        let normalizer = FeatureNormalizer::new(
            artifacts.feature_names.clone(),
            artifacts.encoders.clone(),
            artifacts.scaler.clone(),
            artifacts.holidays.clone(),
        );
        Ok(Self::new(normalizer, Arc::new(classifier)))
    }

    pub fn model_version(&self) -> &str {
        self.classifier.version()
    }

    pub fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, PredictError> {
        let normalized = self.normalizer.normalize(request)?;
        let verdict = self
            .classifier
            .classify(&normalized.vector)
            .map_err(PredictError::Inference)?;

        let confidence = round2(f64::from(verdict.violated_probability) * 100.0);
        Ok(PredictionResponse {
            status: "success".to_string(),
            sla_violated: verdict.violated,
            confidence,
            violation_text: if verdict.violated { "Yes" } else { "No" }.to_string(),
            days_to_due: normalized.days_to_due,
            open_hour: normalized.open_hour,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::features::DAYS_TO_DUE;
    use super::*;
    use std::collections::HashMap;

    struct FixedClassifier {
        violated: bool,
        probability: f32,
    }

    impl Classifier for FixedClassifier {
        fn classify(&self, _features: &[f32]) -> anyhow::Result<Classification> {
            Ok(Classification {
                violated: self.violated,
                violated_probability: self.probability,
            })
        }

        fn version(&self) -> &str {
            "stub"
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn classify(&self, _features: &[f32]) -> anyhow::Result<Classification> {
            anyhow::bail!("feature vector has 3 values, expected 12")
        }

        fn version(&self) -> &str {
            "stub"
        }
    }

    fn normalizer() -> FeatureNormalizer {
        let mut fields = HashMap::new();
        fields.insert(
            CATEGORY_FIELD.to_string(),
            vec!["hardware".to_string(), "nan".to_string()],
        );
        FeatureNormalizer::new(
            Arc::new(vec![DAYS_TO_DUE.to_string(), CATEGORY_FIELD.to_string()]),
            Arc::new(CategoryEncoderTable::new(fields)),
            MinMaxScaler::identity(),
            None,
        )
    }

    fn request() -> PredictionRequest {
        PredictionRequest {
            open_date: "2024-01-01T09:00".to_string(),
            due_date: "2024-01-03T17:00".to_string(),
            priority: "3 - Medium".to_string(),
            category: "hardware".to_string(),
            item: "application 84".to_string(),
            sub_category: String::new(),
        }
    }

    #[test]
    fn predict_formats_the_verdict() {
        let predictor = SlaPredictor::new(
            normalizer(),
            Arc::new(FixedClassifier {
                violated: true,
                probability: 0.87654,
            }),
        );

        let response = predictor.predict(&request()).unwrap();
        assert_eq!(response.status, "success");
        assert!(response.sla_violated);
        assert_eq!(response.violation_text, "Yes");
        assert_eq!(response.confidence, 87.65);
        assert_eq!(response.days_to_due, 2);
        assert_eq!(response.open_hour, 9);
    }

    #[test]
    fn confidence_stays_within_percent_range() {
        let predictor = SlaPredictor::new(
            normalizer(),
            Arc::new(FixedClassifier {
                violated: false,
                probability: 0.0,
            }),
        );
        let response = predictor.predict(&request()).unwrap();
        assert_eq!(response.confidence, 0.0);
        assert_eq!(response.violation_text, "No");
    }

    #[test]
    fn bad_timestamp_is_a_validation_error() {
        let predictor = SlaPredictor::new(
            normalizer(),
            Arc::new(FixedClassifier {
                violated: false,
                probability: 0.5,
            }),
        );
        let mut req = request();
        req.due_date = "next tuesday".to_string();

        match predictor.predict(&req) {
            Err(PredictError::Validation(err)) => {
                assert!(err.to_string().contains("YYYY-MM-DDTHH:MM"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn classifier_failure_is_an_inference_error() {
        let predictor = SlaPredictor::new(normalizer(), Arc::new(FailingClassifier));
        match predictor.predict(&request()) {
            Err(PredictError::Inference(err)) => {
                assert!(err.to_string().contains("expected 12"));
            }
            other => panic!("expected inference error, got {other:?}"),
        }
    }
}
