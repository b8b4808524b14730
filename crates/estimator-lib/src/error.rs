//! Error taxonomy for one estimation cycle
//!
//! Every variant is local to a single request: callers report it and keep
//! serving. Only `EstimatorNotFound` is worth retrying, and only after an
//! operator places the missing artifact.

use crate::registry::ModelType;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the pipeline
pub type Result<T, E = EstimateError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum EstimateError {
    /// Identifier outside the fixed model-type set
    #[error("unknown model type '{0}'")]
    UnknownModelType(String),

    /// Backing artifact is absent from the artifact directory
    #[error("estimator for model type {model_type} not found at {}", path.display())]
    EstimatorNotFound { model_type: ModelType, path: PathBuf },

    /// Artifact exists but cannot be read, verified, or decoded
    #[error("invalid estimator artifact {}: {reason}", path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    /// A field value could not be coerced to the expected type
    #[error("malformed input for '{feature}': {reason}")]
    MalformedInput { feature: String, reason: String },

    /// A feature the selected model requires was not supplied
    #[error("required feature '{0}' was not supplied")]
    MissingRequiredFeature(String),

    /// Vector/vocabulary mismatch or estimator-internal failure
    #[error("prediction failed: {0}")]
    PredictionError(String),
}

impl EstimateError {
    /// Stable machine-readable code, used for metrics labels and API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            EstimateError::UnknownModelType(_) => "unknown_model_type",
            EstimateError::EstimatorNotFound { .. } => "estimator_not_found",
            EstimateError::InvalidArtifact { .. } => "invalid_artifact",
            EstimateError::MalformedInput { .. } => "malformed_input",
            EstimateError::MissingRequiredFeature(_) => "missing_required_feature",
            EstimateError::PredictionError(_) => "prediction_error",
        }
    }

    /// Whether the same request could succeed later without changing inputs
    pub fn is_retryable(&self) -> bool {
        matches!(self, EstimateError::EstimatorNotFound { .. })
    }

    pub(crate) fn malformed(feature: impl Into<String>, reason: impl Into<String>) -> Self {
        EstimateError::MalformedInput {
            feature: feature.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        EstimateError::InvalidArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
