//! Observability infrastructure for the cost estimator
//!
//! Provides:
//! - Prometheus metrics (estimate latency, estimate counts, error kinds, cache activity)
//! - Structured logging with tracing

use crate::models::PredictionResult;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EstimatorMetricsInner> = OnceLock::new();

struct EstimatorMetricsInner {
    estimate_latency_seconds: Histogram,
    estimates_total: IntCounter,
    estimate_errors: IntCounterVec,
    cache_hits: IntCounter,
    cache_misses: IntCounter,
    estimators_loaded: IntGauge,
}

impl EstimatorMetricsInner {
    fn new() -> Self {
        Self {
            estimate_latency_seconds: register_histogram!(
                "cost_estimator_estimate_latency_seconds",
                "Time spent running one estimation cycle",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register estimate_latency_seconds"),

            estimates_total: register_int_counter!(
                "cost_estimator_estimates_total",
                "Total number of successful estimates"
            )
            .expect("Failed to register estimates_total"),

            estimate_errors: register_int_counter_vec!(
                "cost_estimator_estimate_errors_total",
                "Total number of failed estimates by error kind",
                &["kind"]
            )
            .expect("Failed to register estimate_errors_total"),

            cache_hits: register_int_counter!(
                "cost_estimator_cache_hits_total",
                "Estimator cache lookups served from memory"
            )
            .expect("Failed to register cache_hits_total"),

            cache_misses: register_int_counter!(
                "cost_estimator_cache_misses_total",
                "Estimator cache lookups that required an artifact load"
            )
            .expect("Failed to register cache_misses_total"),

            estimators_loaded: register_int_gauge!(
                "cost_estimator_estimators_loaded",
                "Number of estimators currently cached"
            )
            .expect("Failed to register estimators_loaded"),
        }
    }
}

/// Lightweight handle to the global metrics instance
///
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct EstimatorMetrics {
    _private: (),
}

impl Default for EstimatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimatorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EstimatorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EstimatorMetricsInner {
        GLOBAL_METRICS.get_or_init(EstimatorMetricsInner::new)
    }

    pub fn observe_estimate_latency(&self, duration_secs: f64) {
        self.inner().estimate_latency_seconds.observe(duration_secs);
    }

    pub fn inc_estimates(&self) {
        self.inner().estimates_total.inc();
    }

    pub fn inc_estimate_errors(&self, kind: &str) {
        self.inner().estimate_errors.with_label_values(&[kind]).inc();
    }

    pub fn inc_cache_hits(&self) {
        self.inner().cache_hits.inc();
    }

    pub fn inc_cache_misses(&self) {
        self.inner().cache_misses.inc();
    }

    pub fn set_estimators_loaded(&self, count: i64) {
        self.inner().estimators_loaded.set(count);
    }
}

/// Structured logger for estimator events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_estimate(&self, result: &PredictionResult, duration_us: u64) {
        info!(
            event = "estimate_completed",
            instance = %self.instance,
            model_type = %result.model_type,
            base_cost = result.base_cost,
            manual_addition = result.manual_addition,
            total_cost = result.total_cost,
            defaulted_features = result.defaulted_features.len(),
            duration_us = duration_us,
            "Generated cost estimate"
        );
    }

    pub fn log_estimate_failure(&self, model_type: &str, kind: &str, details: &str) {
        warn!(
            event = "estimate_failed",
            instance = %self.instance,
            model_type = %model_type,
            kind = %kind,
            details = %details,
            "Cost estimate failed"
        );
    }

    pub fn log_preload(&self, loaded: usize, missing: usize, failed: usize) {
        if missing + failed == 0 {
            info!(
                event = "estimators_preloaded",
                instance = %self.instance,
                loaded = loaded,
                "All estimators loaded"
            );
        } else {
            warn!(
                event = "estimators_preloaded",
                instance = %self.instance,
                loaded = loaded,
                missing = missing,
                failed = failed,
                "Some estimators are unavailable, affected model types will report errors"
            );
        }
    }

    pub fn log_startup(&self, version: &str, artifact_dir: &str) {
        info!(
            event = "service_started",
            instance = %self.instance,
            version = %version,
            artifact_dir = %artifact_dir,
            "Cost estimator started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Cost estimator shutting down"
        );
    }
}
