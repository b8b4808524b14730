//! Feature-assembly and prediction pipeline
//!
//! One linear pass per request: model-type lookup, estimator resolution,
//! derivation, name resolution, vector assembly, prediction. Nothing is
//! retained across cycles except the estimator cache.

mod assemble;
mod derive;
mod names;
mod predict;

pub use assemble::{assemble, AssembledVector};
pub use derive::{derivations_for, derive_features, Derivation, DerivedFeatures};
pub use names::{resolve_features, resolve_name, RENAME_TABLE};
pub use predict::{manual_addition, predict_base_cost};

use crate::collector::{FeatureCollector, FormSubmission};
use crate::error::{EstimateError, Result};
use crate::estimator::EstimatorCache;
use crate::models::{FeatureMap, PredictionResult, RawInputs};
use crate::observability::{EstimatorMetrics, StructuredLogger};
use crate::registry::{self, ModelSpec};
use std::time::Instant;

/// Every required feature must be supplied before prediction
pub fn validate_required(spec: &ModelSpec, inputs: &RawInputs) -> Result<()> {
    if let Some(missing) = spec.required_numeric().find(|f| inputs.numeric(*f).is_none()) {
        return Err(EstimateError::MissingRequiredFeature(missing.name().to_string()));
    }
    if let Some(missing) = spec
        .required_flags()
        .find(|f| !inputs.flag(*f).is_specified())
    {
        return Err(EstimateError::MissingRequiredFeature(missing.name().to_string()));
    }
    Ok(())
}

/// Human-readable feature map: required base values plus derived columns
pub fn feature_map(spec: &ModelSpec, inputs: &RawInputs, derived: &DerivedFeatures) -> FeatureMap {
    let mut features = FeatureMap::new();
    for feature in spec.required_numeric() {
        features.insert(
            feature.name().to_string(),
            inputs.numeric(feature).unwrap_or(0.0),
        );
    }
    for feature in spec.required_flags() {
        features.insert(feature.name().to_string(), inputs.flag(feature).indicator());
    }
    for (name, value) in derived.iter() {
        features.insert(name.to_string(), value);
    }
    features
}

/// Composition root owning the estimator cache
pub struct CostEstimator {
    cache: EstimatorCache,
    collector: FeatureCollector,
    metrics: EstimatorMetrics,
    logger: StructuredLogger,
}

impl CostEstimator {
    pub fn new(cache: EstimatorCache) -> Self {
        Self {
            cache,
            collector: FeatureCollector::lenient(),
            metrics: EstimatorMetrics::new(),
            logger: StructuredLogger::new("cost-estimator"),
        }
    }

    pub fn with_collector(mut self, collector: FeatureCollector) -> Self {
        self.collector = collector;
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn cache(&self) -> &EstimatorCache {
        &self.cache
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    /// Estimate from typed inputs
    pub fn estimate(&self, model_type: &str, inputs: &RawInputs) -> Result<PredictionResult> {
        self.observe(model_type, || {
            let spec = registry::lookup(model_type)?;
            self.run(&spec, inputs)
        })
    }

    /// Estimate from raw form fields; the model type is validated before
    /// any field is coerced
    pub fn estimate_form(&self, model_type: &str, form: &FormSubmission) -> Result<PredictionResult> {
        self.observe(model_type, || {
            let spec = registry::lookup(model_type)?;
            let inputs = self.collector.collect(form)?;
            self.run(&spec, &inputs)
        })
    }

    fn run(&self, spec: &ModelSpec, inputs: &RawInputs) -> Result<PredictionResult> {
        validate_required(spec, inputs)?;
        let estimator = self.cache.get(spec.model_type)?;

        let derived = derive_features(spec.model_type, &inputs.numeric_values());
        let resolved = resolve_features(&feature_map(spec, inputs, &derived));
        let vector = assemble(&resolved, estimator.feature_names());

        let base_cost = predict_base_cost(estimator.as_ref(), &vector)?;
        let extra = manual_addition(spec, inputs)?;

        Ok(PredictionResult::new(
            spec.model_type.as_str(),
            base_cost,
            extra,
            vector.defaulted,
        ))
    }

    fn observe<F>(&self, model_type: &str, f: F) -> Result<PredictionResult>
    where
        F: FnOnce() -> Result<PredictionResult>,
    {
        let start = Instant::now();
        let outcome = f();
        let elapsed = start.elapsed();

        match &outcome {
            Ok(result) => {
                self.metrics.inc_estimates();
                self.metrics.observe_estimate_latency(elapsed.as_secs_f64());
                self.logger.log_estimate(result, elapsed.as_micros() as u64);
            }
            Err(e) => {
                self.metrics.inc_estimate_errors(e.kind());
                self.logger
                    .log_estimate_failure(model_type, e.kind(), &e.to_string());
            }
        }
        outcome
    }
}
