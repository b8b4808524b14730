//! Static model-type registry
//!
//! Maps each equipment model type to the ordered base features its estimator
//! was fitted on. Yes/no features outside that set are optional and only
//! contribute through manually entered extra costs.

use crate::error::{EstimateError, Result};
use crate::models::{BaseFeature, FlagFeature, NumericFeature};
use crate::pipeline::derivations_for;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use BaseFeature::{Flag, Numeric};

/// Equipment model types with a fitted estimator
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelType {
    HD,
    HDE,
    HDI,
    LD,
    LDH,
    MD,
    NR,
    H,
    L,
    M,
    N,
}

impl ModelType {
    pub const ALL: [ModelType; 11] = [
        ModelType::HD,
        ModelType::HDE,
        ModelType::HDI,
        ModelType::LD,
        ModelType::LDH,
        ModelType::MD,
        ModelType::NR,
        ModelType::H,
        ModelType::L,
        ModelType::M,
        ModelType::N,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelType::HD => "HD",
            ModelType::HDE => "HDE",
            ModelType::HDI => "HDI",
            ModelType::LD => "LD",
            ModelType::LDH => "LDH",
            ModelType::MD => "MD",
            ModelType::NR => "NR",
            ModelType::H => "H",
            ModelType::L => "L",
            ModelType::M => "M",
            ModelType::N => "N",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = EstimateError;

    /// Identifiers are case-sensitive; only surrounding whitespace is ignored
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| EstimateError::UnknownModelType(s.to_string()))
    }
}

const BASE_NUMERIC: [BaseFeature; 4] = [
    Numeric(NumericFeature::Bore),
    Numeric(NumericFeature::Stroke),
    Numeric(NumericFeature::Rpc),
    Numeric(NumericFeature::Rod),
];

const FULL: &[BaseFeature] = &[
    BASE_NUMERIC[0],
    BASE_NUMERIC[1],
    BASE_NUMERIC[2],
    BASE_NUMERIC[3],
    Flag(FlagFeature::RBearing),
    Flag(FlagFeature::BBearing),
    Flag(FlagFeature::Block),
    Flag(FlagFeature::ValA),
];

const LDH_FEATURES: &[BaseFeature] = &[
    BASE_NUMERIC[0],
    BASE_NUMERIC[1],
    BASE_NUMERIC[2],
    BASE_NUMERIC[3],
    Flag(FlagFeature::Block),
    Flag(FlagFeature::ValA),
];

const NR_FEATURES: &[BaseFeature] = &[
    BASE_NUMERIC[0],
    BASE_NUMERIC[1],
    BASE_NUMERIC[2],
    BASE_NUMERIC[3],
    Flag(FlagFeature::RBearing),
];

const L_FEATURES: &[BaseFeature] = &[
    BASE_NUMERIC[0],
    BASE_NUMERIC[1],
    BASE_NUMERIC[2],
    BASE_NUMERIC[3],
    Flag(FlagFeature::Block),
];

/// Required-feature specification for one model type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub model_type: ModelType,
    required: &'static [BaseFeature],
}

impl ModelSpec {
    pub fn for_model(model_type: ModelType) -> Self {
        let required = match model_type {
            ModelType::LDH => LDH_FEATURES,
            ModelType::NR => NR_FEATURES,
            ModelType::L => L_FEATURES,
            ModelType::HD
            | ModelType::HDE
            | ModelType::HDI
            | ModelType::LD
            | ModelType::MD
            | ModelType::H
            | ModelType::M
            | ModelType::N => FULL,
        };
        Self {
            model_type,
            required,
        }
    }

    /// Ordered required base features
    pub fn required(&self) -> &'static [BaseFeature] {
        self.required
    }

    pub fn requires(&self, feature: BaseFeature) -> bool {
        self.required.contains(&feature)
    }

    pub fn required_numeric(&self) -> impl Iterator<Item = NumericFeature> + '_ {
        self.required.iter().filter_map(|f| match f {
            Numeric(n) => Some(*n),
            Flag(_) => None,
        })
    }

    pub fn required_flags(&self) -> impl Iterator<Item = FlagFeature> + '_ {
        self.required.iter().filter_map(|f| match f {
            Flag(y) => Some(*y),
            Numeric(_) => None,
        })
    }

    /// Yes/no features the estimator ignores; only their extra costs count
    pub fn optional_flags(&self) -> impl Iterator<Item = FlagFeature> + '_ {
        FlagFeature::ALL
            .into_iter()
            .filter(|f| !self.requires(Flag(*f)))
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            model_type: self.model_type.to_string(),
            required: self.required.iter().map(|f| f.name().to_string()).collect(),
            optional: self.optional_flags().map(|f| f.name().to_string()).collect(),
            derived: derivations_for(self.model_type)
                .iter()
                .map(|d| d.name())
                .collect(),
        }
    }
}

/// Serializable description of a model type's feature sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model_type: String,
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub derived: Vec<String>,
}

/// Resolve an identifier to its specification
pub fn lookup(identifier: &str) -> Result<ModelSpec> {
    identifier.parse().map(ModelSpec::for_model)
}

/// Every registered specification, in registry order
pub fn all_specs() -> impl Iterator<Item = ModelSpec> {
    ModelType::ALL.into_iter().map(ModelSpec::for_model)
}
