//! Fitted regression estimators and their loading/caching
//!
//! An estimator is opaque to the pipeline: it receives one ordered row and
//! returns one scalar. Its vocabulary is authoritative for column order.

mod artifact;
mod cache;
mod loader;
mod onnx;

pub use artifact::{Aggregation, JsonEstimator, RegressionModel, RegressionTree, TreeNode};
pub use cache::{EstimatorCache, PreloadReport};
pub use loader::{ArtifactFormat, ArtifactLoader, EstimatorSource, CHECKSUM_EXTENSION};
pub use onnx::{OnnxEstimator, Vocabulary};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Trait for fitted estimator implementations
pub trait Estimator: Send + Sync {
    /// Predict one scalar in the estimator's target space from an ordered row
    fn predict(&self, row: &[f64]) -> Result<f64>;

    /// Ordered feature names expected at prediction time
    fn feature_names(&self) -> &[String];

    /// Transform applied to the training target
    fn target_transform(&self) -> TargetTransform;

    fn input_width(&self) -> usize {
        self.feature_names().len()
    }
}

/// Transform the estimator's target was fitted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetTransform {
    /// Fitted on `ln(cost + 1)`
    #[default]
    Log1p,
    /// Fitted on raw cost
    None,
}

impl TargetTransform {
    pub fn forward(self, cost: f64) -> f64 {
        match self {
            TargetTransform::Log1p => cost.ln_1p(),
            TargetTransform::None => cost,
        }
    }

    /// Map an estimator output back to a monetary cost
    pub fn inverse(self, output: f64) -> f64 {
        match self {
            TargetTransform::Log1p => output.exp_m1(),
            TargetTransform::None => output,
        }
    }
}
