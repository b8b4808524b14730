//! Artifact resolution and deserialization

use super::{Estimator, JsonEstimator, OnnxEstimator, Vocabulary};
use crate::error::{EstimateError, Result};
use crate::registry::ModelType;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Extension appended to an artifact path for its optional SHA256 digest
pub const CHECKSUM_EXTENSION: &str = "sha256";

/// Trait for anything that can produce a fitted estimator for a model type
pub trait EstimatorSource: Send + Sync {
    fn load(&self, model_type: ModelType) -> Result<Arc<dyn Estimator>>;

    /// Whether a load attempt could find a backing artifact
    fn is_available(&self, model_type: ModelType) -> bool;
}

/// Serialization format of estimator artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    #[default]
    Json,
    Onnx,
}

impl ArtifactFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactFormat::Json => "json",
            ArtifactFormat::Onnx => "onnx",
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArtifactFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ArtifactFormat::Json),
            "onnx" => Ok(ArtifactFormat::Onnx),
            other => Err(format!("unsupported artifact format '{}'", other)),
        }
    }
}

/// Loads `{MODEL}_model.{ext}` artifacts from a base directory
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    base_dir: PathBuf,
    format: ArtifactFormat,
}

impl ArtifactLoader {
    pub fn new(base_dir: impl Into<PathBuf>, format: ArtifactFormat) -> Self {
        Self {
            base_dir: base_dir.into(),
            format,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn format(&self) -> ArtifactFormat {
        self.format
    }

    pub fn artifact_path(&self, model_type: ModelType) -> PathBuf {
        self.base_dir
            .join(format!("{}_model.{}", model_type, self.format.extension()))
    }

    /// Vocabulary sidecar used by ONNX artifacts
    pub fn vocabulary_path(&self, model_type: ModelType) -> PathBuf {
        self.base_dir.join(format!("{}_model.vocab.json", model_type))
    }

    fn read_artifact(&self, model_type: ModelType, path: &Path) -> Result<Vec<u8>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(EstimateError::EstimatorNotFound {
                    model_type,
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(EstimateError::invalid_artifact(path, e.to_string())),
        };
        verify_checksum(path, &bytes)?;
        Ok(bytes)
    }
}

impl EstimatorSource for ArtifactLoader {
    fn load(&self, model_type: ModelType) -> Result<Arc<dyn Estimator>> {
        let path = self.artifact_path(model_type);
        debug!(model_type = %model_type, path = %path.display(), "Loading estimator artifact");

        let bytes = self.read_artifact(model_type, &path)?;

        let estimator: Arc<dyn Estimator> = match self.format {
            ArtifactFormat::Json => Arc::new(
                JsonEstimator::from_slice(&bytes)
                    .map_err(|e| EstimateError::invalid_artifact(&path, format!("{:#}", e)))?,
            ),
            ArtifactFormat::Onnx => {
                let vocab_path = self.vocabulary_path(model_type);
                let vocab_bytes = fs::read(&vocab_path).map_err(|e| {
                    EstimateError::invalid_artifact(&vocab_path, format!("vocabulary sidecar: {}", e))
                })?;
                let vocabulary = Vocabulary::from_slice(&vocab_bytes)
                    .map_err(|e| EstimateError::invalid_artifact(&vocab_path, format!("{:#}", e)))?;
                Arc::new(
                    OnnxEstimator::new(&bytes, vocabulary)
                        .map_err(|e| EstimateError::invalid_artifact(&path, format!("{:#}", e)))?,
                )
            }
        };

        info!(
            event = "estimator_loaded",
            model_type = %model_type,
            format = %self.format,
            features = estimator.input_width(),
            "Estimator artifact loaded"
        );
        Ok(estimator)
    }

    fn is_available(&self, model_type: ModelType) -> bool {
        self.artifact_path(model_type).is_file()
    }
}

/// Check the artifact against `{artifact}.sha256` when that file exists
fn verify_checksum(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut checksum_path = path.as_os_str().to_owned();
    checksum_path.push(".");
    checksum_path.push(CHECKSUM_EXTENSION);
    let checksum_path = PathBuf::from(checksum_path);

    let expected = match fs::read_to_string(&checksum_path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(EstimateError::invalid_artifact(&checksum_path, e.to_string())),
    };
    // sha256sum output: "<digest>  <filename>"
    let expected = expected
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    let actual = hex::encode(Sha256::digest(bytes));
    if actual != expected {
        return Err(EstimateError::invalid_artifact(
            path,
            format!("checksum mismatch: expected {}, got {}", expected, actual),
        ));
    }
    debug!(path = %path.display(), "Artifact checksum verified");
    Ok(())
}
