//! Estimator invocation and post-hoc cost adjustment

use super::AssembledVector;
use crate::error::{EstimateError, Result};
use crate::estimator::Estimator;
use crate::models::RawInputs;
use crate::registry::ModelSpec;
use tracing::debug;

/// Run the estimator on one row and map its output back to a monetary cost
pub fn predict_base_cost(estimator: &dyn Estimator, vector: &AssembledVector) -> Result<f64> {
    let width = estimator.input_width();
    if vector.len() != width {
        return Err(EstimateError::PredictionError(format!(
            "input has {} values, estimator expects {}",
            vector.len(),
            width
        )));
    }

    if let Some(pos) = vector.values.iter().position(|v| !v.is_finite()) {
        return Err(EstimateError::PredictionError(format!(
            "non-numeric value for '{}'",
            estimator.feature_names()[pos]
        )));
    }

    let raw = estimator
        .predict(&vector.values)
        .map_err(|e| EstimateError::PredictionError(format!("{:#}", e)))?;

    let cost = estimator.target_transform().inverse(raw);
    if !cost.is_finite() {
        return Err(EstimateError::PredictionError(format!(
            "estimator produced non-finite cost from output {}",
            raw
        )));
    }
    Ok(cost)
}

/// Sum of included extra costs for yes/no features the model does not use
///
/// Extra costs entered for required features are ignored; the estimator
/// already prices those.
pub fn manual_addition(spec: &ModelSpec, inputs: &RawInputs) -> Result<f64> {
    let mut total = 0.0;
    for feature in spec.optional_flags() {
        let Some(cost) = inputs.extra_cost(feature) else {
            continue;
        };
        if !cost.included {
            continue;
        }
        if !cost.amount.is_finite() {
            return Err(EstimateError::PredictionError(format!(
                "non-numeric extra cost for '{}'",
                feature
            )));
        }
        total += cost.amount;
    }

    for feature in spec.required_flags() {
        if inputs.extra_cost(feature).is_some() {
            debug!(feature = %feature, model_type = %spec.model_type, "Ignoring extra cost for required feature");
        }
    }

    Ok(total)
}
