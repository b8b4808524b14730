//! JSON estimator artifacts
//!
//! Exported regressors are stored as a serde document carrying the
//! vocabulary, the target transform and either linear coefficients or a
//! flattened tree ensemble (left child taken when `x[feature] <= threshold`).

use super::{Estimator, TargetTransform};
use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// Regressor exported to a JSON artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonEstimator {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub target_transform: TargetTransform,
    pub model: RegressionModel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionModel {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    TreeEnsemble {
        trees: Vec<RegressionTree>,
        #[serde(default)]
        aggregation: Aggregation,
        #[serde(default)]
        base_score: f64,
    },
}

/// How per-tree outputs combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Random-forest style averaging
    #[default]
    Mean,
    /// Boosting style accumulation on top of `base_score`
    Sum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl RegressionTree {
    fn evaluate(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Children must point forward, which rules out cycles
    fn validate(&self, width: usize) -> Result<()> {
        ensure!(!self.nodes.is_empty(), "tree has no nodes");
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                threshold,
            } = node
            {
                ensure!(*feature < width, "node {} splits on column {} of {}", idx, feature, width);
                ensure!(threshold.is_finite(), "node {} has non-finite threshold", idx);
                for child in [*left, *right] {
                    ensure!(
                        child > idx && child < self.nodes.len(),
                        "node {} has out-of-order child {}",
                        idx,
                        child
                    );
                }
            }
        }
        Ok(())
    }
}

impl JsonEstimator {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let estimator: JsonEstimator =
            serde_json::from_slice(bytes).context("Failed to parse estimator JSON")?;
        estimator.validate()?;
        Ok(estimator)
    }

    fn validate(&self) -> Result<()> {
        let width = self.feature_names.len();
        ensure!(width > 0, "estimator has an empty vocabulary");
        match &self.model {
            RegressionModel::Linear { coefficients, .. } => {
                ensure!(
                    coefficients.len() == width,
                    "{} coefficients for {} features",
                    coefficients.len(),
                    width
                );
            }
            RegressionModel::TreeEnsemble { trees, .. } => {
                ensure!(!trees.is_empty(), "tree ensemble has no trees");
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(width).with_context(|| format!("tree {}", i))?;
                }
            }
        }
        Ok(())
    }
}

impl Estimator for JsonEstimator {
    fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.feature_names.len() {
            bail!(
                "Input has {} values, expected {}",
                row.len(),
                self.feature_names.len()
            );
        }

        let output = match &self.model {
            RegressionModel::Linear {
                coefficients,
                intercept,
            } => {
                intercept
                    + coefficients
                        .iter()
                        .zip(row)
                        .map(|(c, x)| c * x)
                        .sum::<f64>()
            }
            RegressionModel::TreeEnsemble {
                trees,
                aggregation,
                base_score,
            } => {
                let sum: f64 = trees.iter().map(|t| t.evaluate(row)).sum();
                match aggregation {
                    Aggregation::Mean => base_score + sum / trees.len() as f64,
                    Aggregation::Sum => base_score + sum,
                }
            }
        };
        Ok(output)
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn target_transform(&self) -> TargetTransform {
        self.target_transform
    }
}
