//! Core data models for the cost estimator

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named numeric features, as used by derivation and vector assembly
pub type FeatureMap = BTreeMap<String, f64>;

/// Numeric base features supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NumericFeature {
    Bore,
    Stroke,
    #[serde(rename = "RPC")]
    Rpc,
    Rod,
}

impl NumericFeature {
    pub const ALL: [NumericFeature; 4] = [
        NumericFeature::Bore,
        NumericFeature::Stroke,
        NumericFeature::Rpc,
        NumericFeature::Rod,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NumericFeature::Bore => "Bore",
            NumericFeature::Stroke => "Stroke",
            NumericFeature::Rpc => "RPC",
            NumericFeature::Rod => "Rod",
        }
    }

    /// Case-insensitive lookup by display name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for NumericFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Yes/no base features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FlagFeature {
    #[serde(rename = "R bearing")]
    RBearing,
    #[serde(rename = "B bearing")]
    BBearing,
    Block,
    #[serde(rename = "Val A")]
    ValA,
    #[serde(rename = "Val B")]
    ValB,
}

impl FlagFeature {
    pub const ALL: [FlagFeature; 5] = [
        FlagFeature::RBearing,
        FlagFeature::BBearing,
        FlagFeature::Block,
        FlagFeature::ValA,
        FlagFeature::ValB,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FlagFeature::RBearing => "R bearing",
            FlagFeature::BBearing => "B bearing",
            FlagFeature::Block => "Block",
            FlagFeature::ValA => "Val A",
            FlagFeature::ValB => "Val B",
        }
    }

    /// Case-insensitive lookup by display name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for FlagFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Any base feature a model type may require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseFeature {
    Numeric(NumericFeature),
    Flag(FlagFeature),
}

impl BaseFeature {
    pub fn name(self) -> &'static str {
        match self {
            BaseFeature::Numeric(f) => f.name(),
            BaseFeature::Flag(f) => f.name(),
        }
    }
}

/// Tri-state yes/no value; `Unspecified` is only acceptable for optional fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagValue {
    Yes,
    No,
    #[default]
    Unspecified,
}

impl FlagValue {
    /// Numeric encoding fed to the estimator; unspecified encodes as "No"
    pub fn indicator(self) -> f64 {
        match self {
            FlagValue::Yes => 1.0,
            FlagValue::No | FlagValue::Unspecified => 0.0,
        }
    }

    pub fn is_specified(self) -> bool {
        !matches!(self, FlagValue::Unspecified)
    }
}

/// Manually entered cost for a yes/no feature the estimator does not consider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionalCost {
    pub amount: f64,
    /// Whether the optional field was enabled by the user
    pub included: bool,
}

/// Raw per-request inputs, produced by the feature collector
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    numeric: BTreeMap<NumericFeature, f64>,
    flags: BTreeMap<FlagFeature, FlagValue>,
    extra_costs: BTreeMap<FlagFeature, OptionalCost>,
}

impl RawInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_numeric(mut self, feature: NumericFeature, value: f64) -> Self {
        self.set_numeric(feature, value);
        self
    }

    pub fn with_flag(mut self, feature: FlagFeature, value: FlagValue) -> Self {
        self.set_flag(feature, value);
        self
    }

    pub fn with_extra_cost(mut self, feature: FlagFeature, amount: f64, included: bool) -> Self {
        self.set_extra_cost(feature, amount, included);
        self
    }

    pub fn set_numeric(&mut self, feature: NumericFeature, value: f64) {
        self.numeric.insert(feature, value);
    }

    pub fn set_flag(&mut self, feature: FlagFeature, value: FlagValue) {
        self.flags.insert(feature, value);
    }

    pub fn set_extra_cost(&mut self, feature: FlagFeature, amount: f64, included: bool) {
        self.extra_costs
            .insert(feature, OptionalCost { amount, included });
    }

    pub fn numeric(&self, feature: NumericFeature) -> Option<f64> {
        self.numeric.get(&feature).copied()
    }

    pub fn flag(&self, feature: FlagFeature) -> FlagValue {
        self.flags.get(&feature).copied().unwrap_or_default()
    }

    pub fn extra_cost(&self, feature: FlagFeature) -> Option<OptionalCost> {
        self.extra_costs.get(&feature).copied()
    }

    /// Base numeric values with omitted features treated as zero
    pub fn numeric_values(&self) -> NumericValues {
        NumericValues {
            bore: self.numeric(NumericFeature::Bore).unwrap_or(0.0),
            stroke: self.numeric(NumericFeature::Stroke).unwrap_or(0.0),
            rpc: self.numeric(NumericFeature::Rpc).unwrap_or(0.0),
            rod: self.numeric(NumericFeature::Rod).unwrap_or(0.0),
        }
    }
}

/// The four base numeric inputs every derivation draws from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericValues {
    pub bore: f64,
    pub stroke: f64,
    pub rpc: f64,
    pub rod: f64,
}

impl NumericValues {
    pub fn new(bore: f64, stroke: f64, rpc: f64, rod: f64) -> Self {
        Self {
            bore,
            stroke,
            rpc,
            rod,
        }
    }

    pub fn get(&self, feature: NumericFeature) -> f64 {
        match feature {
            NumericFeature::Bore => self.bore,
            NumericFeature::Stroke => self.stroke,
            NumericFeature::Rpc => self.rpc,
            NumericFeature::Rod => self.rod,
        }
    }
}

/// Outcome of one estimation cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub model_type: String,
    /// Estimator output after the inverse target transform
    pub base_cost: f64,
    /// Sum of included extra costs for features the model does not use
    pub manual_addition: f64,
    pub total_cost: f64,
    /// Vocabulary entries that had no resolved value and were fed as zero
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted_features: Vec<String>,
    pub generated_at: i64,
}

impl PredictionResult {
    pub fn new(
        model_type: impl Into<String>,
        base_cost: f64,
        manual_addition: f64,
        defaulted_features: Vec<String>,
    ) -> Self {
        Self {
            model_type: model_type.into(),
            base_cost,
            manual_addition,
            total_cost: base_cost + manual_addition,
            defaulted_features,
            generated_at: chrono::Utc::now().timestamp(),
        }
    }
}
