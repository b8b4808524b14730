//! Cost estimation library for hydraulic cylinder model types
//!
//! This crate provides the core functionality for:
//! - Model-type registry and required feature sets
//! - Feature collection, derivation, renaming and vector assembly
//! - Estimator artifact loading and process-wide caching
//! - Prediction with inverse target transform and manual extra costs
//! - Metrics and structured logging

pub mod collector;
pub mod error;
pub mod estimator;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod registry;

pub use collector::{ExtraCostField, FeatureCollector, FormSubmission};
pub use error::{EstimateError, Result};
pub use estimator::{ArtifactFormat, ArtifactLoader, Estimator, EstimatorCache, TargetTransform};
pub use models::*;
pub use observability::{EstimatorMetrics, StructuredLogger};
pub use pipeline::CostEstimator;
pub use registry::{ModelSpec, ModelSummary, ModelType};
