//! Service configuration

use anyhow::{Context, Result};
use estimator_lib::ArtifactFormat;
use serde::Deserialize;
use std::path::PathBuf;

/// Service configuration, read from `ESTIMATOR_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Instance name attached to structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// API server port for estimate/health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding `{MODEL}_model.{ext}` artifacts
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Artifact serialization format
    #[serde(default)]
    pub artifact_format: ArtifactFormat,

    /// Reject uncoercible field values instead of defaulting them
    #[serde(default)]
    pub strict_inputs: bool,

    /// Load every estimator at startup
    #[serde(default = "default_preload")]
    pub preload: bool,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "cost-estimator".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_preload() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            artifact_dir: default_artifact_dir(),
            artifact_format: ArtifactFormat::default(),
            strict_inputs: false,
            preload: default_preload(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ESTIMATOR").try_parsing(true))
            .build()?;
        Self::from_config(config)
    }

    pub fn from_config(config: config::Config) -> Result<Self> {
        config
            .try_deserialize()
            .context("Invalid estimator service configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let config = ServiceConfig::from_config(config::Config::builder().build().unwrap()).unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.artifact_dir, PathBuf::from("models"));
        assert_eq!(config.artifact_format, ArtifactFormat::Json);
        assert!(!config.strict_inputs);
        assert!(config.preload);
    }

    #[test]
    fn test_overrides() {
        let source = config::Config::builder()
            .set_override("api_port", 9090)
            .unwrap()
            .set_override("artifact_dir", "/srv/models")
            .unwrap()
            .set_override("artifact_format", "onnx")
            .unwrap()
            .set_override("strict_inputs", true)
            .unwrap()
            .build()
            .unwrap();
        let config = ServiceConfig::from_config(source).unwrap();

        assert_eq!(config.api_port, 9090);
        assert_eq!(config.artifact_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.artifact_format, ArtifactFormat::Onnx);
        assert!(config.strict_inputs);
    }

    #[test]
    fn test_invalid_format_rejected() {
        let source = config::Config::builder()
            .set_override("artifact_format", "pickle")
            .unwrap()
            .build()
            .unwrap();
        assert!(ServiceConfig::from_config(source).is_err());
    }
}
