//! Cost Estimator - HTTP service for cylinder base-cost estimates
//!
//! Serves estimates for every registered model type from fitted artifacts
//! in a local directory, with health and Prometheus metrics endpoints.

use anyhow::Result;
use estimator_lib::{
    ArtifactLoader, CostEstimator, EstimatorCache, FeatureCollector, ModelType, StructuredLogger,
};
use estimator_service::{api, config};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting cost-estimator");

    let config = config::ServiceConfig::load()?;
    info!(
        instance = %config.instance_name,
        artifact_dir = %config.artifact_dir.display(),
        format = %config.artifact_format,
        strict_inputs = config.strict_inputs,
        "Service configured"
    );

    let collector = if config.strict_inputs {
        FeatureCollector::strict()
    } else {
        FeatureCollector::lenient()
    };
    let loader = ArtifactLoader::new(&config.artifact_dir, config.artifact_format);
    let estimator = CostEstimator::new(EstimatorCache::new(loader))
        .with_collector(collector)
        .with_logger(StructuredLogger::new(&config.instance_name));

    if config.preload {
        let report = estimator.cache().preload(&ModelType::ALL);
        estimator.logger().log_preload(
            report.loaded.len(),
            report.missing.len(),
            report.failed.len(),
        );
    }

    estimator
        .logger()
        .log_startup(SERVICE_VERSION, &config.artifact_dir.display().to_string());

    let estimator = Arc::new(estimator);
    let app_state = Arc::new(api::AppState::new(Arc::clone(&estimator)));

    tokio::select! {
        result = api::serve(config.api_port, app_state) => {
            result?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            estimator.logger().log_shutdown("SIGINT received");
            info!("Shutting down");
        }
    }

    Ok(())
}
