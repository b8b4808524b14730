//! Feature collection from loosely typed form fields
//!
//! Forms deliver numbers as JSON numbers or strings and yes/no answers as
//! booleans, words or digits. This module coerces them into `RawInputs`.
//! In lenient mode an uncoercible value is logged and replaced with zero or
//! "No"; in strict mode it fails the cycle with `MalformedInput`.

use crate::error::{EstimateError, Result};
use crate::models::{FlagFeature, FlagValue, NumericFeature, RawInputs};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Raw field values keyed by display name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSubmission {
    #[serde(default)]
    pub numeric: BTreeMap<String, Value>,
    #[serde(default)]
    pub flags: BTreeMap<String, Value>,
    #[serde(default)]
    pub extra_costs: BTreeMap<String, ExtraCostField>,
}

/// Extra cost entered against an optional yes/no field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraCostField {
    pub amount: Value,
    /// Whether the optional field was enabled; a submitted amount counts by default
    #[serde(default = "default_included")]
    pub included: bool,
}

fn default_included() -> bool {
    true
}

/// Coerces form fields into typed inputs
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureCollector {
    strict: bool,
}

impl FeatureCollector {
    pub fn lenient() -> Self {
        Self { strict: false }
    }

    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn collect(&self, form: &FormSubmission) -> Result<RawInputs> {
        let mut inputs = RawInputs::new();

        let mut seen = BTreeSet::new();
        for (name, value) in &form.numeric {
            let feature = NumericFeature::from_name(name)
                .ok_or_else(|| EstimateError::malformed(name, "unknown numeric feature"))?;
            if !self.first_occurrence(&mut seen, feature, name)? {
                continue;
            }
            if let Some(v) = self.recover(name, coerce_number(value), 0.0)? {
                inputs.set_numeric(feature, v);
            }
        }

        let mut seen = BTreeSet::new();
        for (name, value) in &form.flags {
            let feature = FlagFeature::from_name(name)
                .ok_or_else(|| EstimateError::malformed(name, "unknown yes/no feature"))?;
            if !self.first_occurrence(&mut seen, feature, name)? {
                continue;
            }
            let flag = self
                .recover(name, coerce_flag(value).map(Some), FlagValue::No)?
                .unwrap_or(FlagValue::Unspecified);
            inputs.set_flag(feature, flag);
        }

        let mut seen = BTreeSet::new();
        for (name, field) in &form.extra_costs {
            let feature = FlagFeature::from_name(name)
                .ok_or_else(|| EstimateError::malformed(name, "unknown yes/no feature"))?;
            if !self.first_occurrence(&mut seen, feature, name)? {
                continue;
            }
            if let Some(amount) = self.recover(name, coerce_number(&field.amount), 0.0)? {
                inputs.set_extra_cost(feature, amount, field.included);
            }
        }

        Ok(inputs)
    }

    /// Keys that differ only in case or padding name the same feature; strict
    /// mode rejects the second one, lenient mode keeps the first
    fn first_occurrence<F: Ord>(
        &self,
        seen: &mut BTreeSet<F>,
        feature: F,
        name: &str,
    ) -> Result<bool> {
        if seen.insert(feature) {
            return Ok(true);
        }
        if self.strict {
            return Err(EstimateError::malformed(name, "feature supplied more than once"));
        }
        warn!(feature = %name, "Duplicate field ignored");
        Ok(false)
    }

    /// Apply the strict/lenient policy to one coercion outcome
    fn recover<T: Copy>(
        &self,
        name: &str,
        outcome: std::result::Result<Option<T>, String>,
        fallback: T,
    ) -> Result<Option<T>> {
        match outcome {
            Ok(v) => Ok(v),
            Err(reason) if self.strict => Err(EstimateError::malformed(name, reason)),
            Err(reason) => {
                warn!(feature = %name, reason = %reason, "Malformed input replaced with default");
                Ok(Some(fallback))
            }
        }
    }
}

/// `Ok(None)` means the field was left empty
fn coerce_number(value: &Value) -> std::result::Result<Option<f64>, String> {
    let number = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("{} is not representable", n))?,
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", s))?,
        other => return Err(format!("expected a number, got {}", other)),
    };
    if !number.is_finite() {
        return Err(format!("{} is not a finite number", number));
    }
    Ok(Some(number))
}

fn coerce_flag(value: &Value) -> std::result::Result<FlagValue, String> {
    match value {
        Value::Null => Ok(FlagValue::Unspecified),
        Value::Bool(true) => Ok(FlagValue::Yes),
        Value::Bool(false) => Ok(FlagValue::No),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 1.0 => Ok(FlagValue::Yes),
            Some(v) if v == 0.0 => Ok(FlagValue::No),
            _ => Err(format!("expected 0 or 1, got {}", n)),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(FlagValue::Unspecified),
            "yes" | "y" | "true" | "1" => Ok(FlagValue::Yes),
            "no" | "n" | "false" | "0" => Ok(FlagValue::No),
            _ => Err(format!("'{}' is not yes or no", s)),
        },
        other => Err(format!("expected yes or no, got {}", other)),
    }
}
