//! ONNX estimator inference using tract
//!
//! ONNX graphs carry no column names, so each model ships with a vocabulary
//! sidecar that fixes the input order and the target transform.

use super::{Estimator, TargetTransform};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Sidecar describing an ONNX estimator's expected inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub target_transform: TargetTransform,
}

impl Vocabulary {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let vocab: Vocabulary =
            serde_json::from_slice(bytes).context("Failed to parse vocabulary sidecar")?;
        if vocab.feature_names.is_empty() {
            bail!("vocabulary sidecar lists no features");
        }
        Ok(vocab)
    }
}

/// ONNX-based estimator, typically a converted scikit-learn regressor
pub struct OnnxEstimator {
    model: TractModel,
    vocabulary: Vocabulary,
}

impl OnnxEstimator {
    pub fn new(model_bytes: &[u8], vocabulary: Vocabulary) -> Result<Self> {
        let model = Self::load_model(model_bytes, vocabulary.feature_names.len())?;
        Ok(Self { model, vocabulary })
    }

    /// Load and optimize an ONNX model for a single-row f32 input
    fn load_model(model_bytes: &[u8], width: usize) -> Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, width]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    fn row_to_tensor(&self, row: &[f64]) -> Result<Tensor> {
        let data: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let array = tract_ndarray::Array2::from_shape_vec((1, row.len()), data)
            .context("Failed to shape input row")?;
        Ok(array.into())
    }
}

impl Estimator for OnnxEstimator {
    fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.input_width() {
            bail!("Input has {} values, expected {}", row.len(), self.input_width());
        }

        let start = Instant::now();
        let input = self.row_to_tensor(row)?;
        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;

        let view = output.to_array_view::<f32>()?;
        let value = view.iter().next().copied().context("Model output is empty")?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(value as f64)
    }

    fn feature_names(&self) -> &[String] {
        &self.vocabulary.feature_names
    }

    fn target_transform(&self) -> TargetTransform {
        self.vocabulary.target_transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_sidecar() {
        let vocab = Vocabulary::from_slice(br#"{"feature_names": ["Bore", "Rod"]}"#).unwrap();
        assert_eq!(vocab.feature_names, vec!["Bore", "Rod"]);
        assert_eq!(vocab.target_transform, TargetTransform::Log1p);
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        assert!(Vocabulary::from_slice(br#"{"feature_names": []}"#).is_err());
        assert!(Vocabulary::from_slice(b"{}").is_err());
    }

    /// `output = input . [1, 2, 3] + 0.5` over a 1x3 input
    const LINEAR3: &[u8] = include_bytes!("../../tests/fixtures/linear3.onnx");

    fn linear3() -> OnnxEstimator {
        let vocab = Vocabulary::from_slice(
            br#"{"feature_names": ["Bore", "Stroke", "RPC"], "target_transform": "none"}"#,
        )
        .unwrap();
        OnnxEstimator::new(LINEAR3, vocab).unwrap()
    }

    #[test]
    fn test_predict_runs_graph() {
        let estimator = linear3();
        assert_eq!(estimator.input_width(), 3);
        assert_eq!(estimator.target_transform(), TargetTransform::None);

        let value = estimator.predict(&[1.0, 2.0, 3.0]).unwrap();
        assert!((value - 14.5).abs() < 1e-5, "got {}", value);

        let value = estimator.predict(&[0.0, 0.0, 0.0]).unwrap();
        assert!((value - 0.5).abs() < 1e-6, "got {}", value);
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        assert!(linear3().predict(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_vocabulary_width_must_match_graph() {
        let vocab = Vocabulary::from_slice(br#"{"feature_names": ["Bore", "Stroke"]}"#).unwrap();
        assert!(OnnxEstimator::new(LINEAR3, vocab).is_err());
    }

    #[test]
    fn test_garbage_model_bytes_rejected() {
        let vocab = Vocabulary::from_slice(br#"{"feature_names": ["Bore"]}"#).unwrap();
        assert!(OnnxEstimator::new(b"definitely not protobuf", vocab).is_err());
    }
}
