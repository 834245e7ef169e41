//! Classifier inference using tract
//!
//! Wraps the ONNX export of the offline-trained violation classifier.
//! The model is opaque: this layer only fixes the input shape, runs the
//! plan, and reads back the label and the probability assigned to the
//! violated class, whose output position comes from the model metadata
//! rather than being assumed.

use std::io::Cursor;
use std::time::Instant;

use anyhow::{Context, Result};
use tract_onnx::prelude::*;
use tracing::{debug, warn};

use crate::artifacts::ArtifactSet;

/// Inference latency target before a warning is logged
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Outcome of one classifier call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub violated: bool,
    /// Probability mass of the violated class, 0..1
    pub violated_probability: f32,
}

/// Decision function over a normalized feature vector.
///
/// Seam for the tract-backed implementation; tests substitute a stub.
pub trait Classifier: Send + Sync {
    fn classify(&self, features: &[f32]) -> Result<Classification>;

    fn version(&self) -> &str;
}

/// tract-backed classifier over the exported model
pub struct OnnxClassifier {
    model: TractModel,
    version: String,
    num_features: usize,
    violated_index: usize,
}

impl OnnxClassifier {
    pub fn from_artifacts(artifacts: &ArtifactSet) -> Result<Self> {
        let violated_index = artifacts
            .meta
            .classes
            .iter()
            .position(|class| *class == 1)
            .context("model metadata lists no violated class")?;

        let num_features = artifacts.meta.num_features;
        let model = tract_onnx::onnx()
            .model_for_read(&mut Cursor::new(&artifacts.model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, num_features]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;

        Ok(Self {
            model,
            version: artifacts.meta.model_version.clone(),
            num_features,
            violated_index,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, features: &[f32]) -> Result<Classification> {
        if features.len() != self.num_features {
            anyhow::bail!(
                "feature vector has {} values, expected {}",
                features.len(),
                self.num_features
            );
        }

        let start = Instant::now();
        let input: Tensor =
            tract_ndarray::Array2::from_shape_vec((1, self.num_features), features.to_vec())?
                .into();

        let result = self.model.run(tvec!(input.into()))?;

        let label = result
            .first()
            .context("model returned no label output")?
            .to_array_view::<i64>()?
            .iter()
            .next()
            .copied()
            .context("model label output is empty")?;

        let probabilities = result
            .get(1)
            .context("model returned no probability output")?
            .to_array_view::<f32>()?;
        let violated_probability = probabilities
            .iter()
            .nth(self.violated_index)
            .copied()
            .with_context(|| {
                format!(
                    "probability output has no class at position {}",
                    self.violated_index
                )
            })?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(
                elapsed_ms = elapsed.as_millis(),
                "Inference exceeded {}ms target", MAX_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(Classification {
            violated: label != 0,
            violated_probability,
        })
    }

    fn version(&self) -> &str {
        &self.version
    }
}
