//! Derived interaction and polynomial features
//!
//! Each model type's estimator was fitted against a fixed set of derived
//! columns. The table below is the contract with those estimators: column
//! names and operand order must match what the estimator vocabulary expects.

use crate::models::{NumericFeature, NumericValues};
use crate::registry::ModelType;

use NumericFeature::{Bore, Rod, Rpc, Stroke};

/// A single derived column computed from base numeric values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// `A^2`
    Square(NumericFeature),
    /// `A*B`, operand order is part of the column name
    Product(NumericFeature, NumericFeature),
}

impl Derivation {
    pub fn name(&self) -> String {
        match self {
            Derivation::Square(a) => format!("{}^2", a.name()),
            Derivation::Product(a, b) => format!("{}*{}", a.name(), b.name()),
        }
    }

    pub fn evaluate(&self, base: &NumericValues) -> f64 {
        match self {
            Derivation::Square(a) => base.get(*a) * base.get(*a),
            Derivation::Product(a, b) => base.get(*a) * base.get(*b),
        }
    }
}

const HD_DERIVED: &[Derivation] = &[
    Derivation::Square(Bore),
    Derivation::Product(Bore, Rod),
    Derivation::Product(Rpc, Bore),
];

const HDI_DERIVED: &[Derivation] = &[
    Derivation::Square(Bore),
    Derivation::Product(Bore, Rod),
    Derivation::Product(Rpc, Bore),
    Derivation::Product(Bore, Stroke),
];

const LDH_DERIVED: &[Derivation] = &[
    Derivation::Product(Bore, Stroke),
    Derivation::Product(Bore, Rod),
    Derivation::Product(Rpc, Bore),
    Derivation::Product(Stroke, Rod),
];

const MD_DERIVED: &[Derivation] = &[
    Derivation::Square(Bore),
    Derivation::Product(Bore, Rpc),
    Derivation::Product(Rpc, Stroke),
    Derivation::Product(Bore, Rod),
];

const NR_DERIVED: &[Derivation] = &[
    Derivation::Square(Rpc),
    Derivation::Product(Bore, Rpc),
    Derivation::Product(Rpc, Stroke),
    Derivation::Square(Stroke),
    Derivation::Product(Rpc, Rod),
];

const H_DERIVED: &[Derivation] = &[
    Derivation::Square(Rpc),
    Derivation::Product(Bore, Rod),
    Derivation::Product(Rpc, Bore),
    Derivation::Square(Bore),
    Derivation::Product(Rpc, Rod),
];

const L_DERIVED: &[Derivation] = &[
    Derivation::Product(Bore, Rpc),
    Derivation::Product(Bore, Stroke),
    Derivation::Square(Bore),
    Derivation::Product(Stroke, Rod),
];

const M_DERIVED: &[Derivation] = &[
    Derivation::Product(Bore, Stroke),
    Derivation::Product(Bore, Rod),
    Derivation::Product(Rpc, Bore),
    Derivation::Square(Bore),
    Derivation::Product(Rpc, Rod),
];

/// Derivation table lookup
pub fn derivations_for(model_type: ModelType) -> &'static [Derivation] {
    match model_type {
        ModelType::HD | ModelType::HDE => HD_DERIVED,
        ModelType::HDI => HDI_DERIVED,
        ModelType::LDH => LDH_DERIVED,
        ModelType::MD => MD_DERIVED,
        ModelType::NR => NR_DERIVED,
        ModelType::H => H_DERIVED,
        ModelType::L => L_DERIVED,
        ModelType::M => M_DERIVED,
        ModelType::LD | ModelType::N => &[],
    }
}

/// Derived columns for one cycle, in table order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivedFeatures {
    entries: Vec<(String, f64)>,
}

impl DerivedFeatures {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compute the derived columns the given model type's estimator expects
pub fn derive_features(model_type: ModelType, base: &NumericValues) -> DerivedFeatures {
    DerivedFeatures {
        entries: derivations_for(model_type)
            .iter()
            .map(|d| (d.name(), d.evaluate(base)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NumericValues {
        NumericValues::new(10.0, 20.0, 5.0, 3.0)
    }

    #[test]
    fn test_nr_derivations() {
        let derived = derive_features(ModelType::NR, &sample());
        assert_eq!(derived.len(), 5);
        assert_eq!(derived.get("RPC^2"), Some(25.0));
        assert_eq!(derived.get("Bore*RPC"), Some(50.0));
        assert_eq!(derived.get("RPC*Stroke"), Some(100.0));
        assert_eq!(derived.get("Stroke^2"), Some(400.0));
        assert_eq!(derived.get("RPC*Rod"), Some(15.0));
    }

    #[test]
    fn test_operand_order_is_part_of_the_name() {
        let hd = derive_features(ModelType::HD, &sample());
        assert_eq!(hd.get("RPC*Bore"), Some(50.0));
        assert_eq!(hd.get("Bore*RPC"), None);

        let md = derive_features(ModelType::MD, &sample());
        assert_eq!(md.get("Bore*RPC"), Some(50.0));
        assert_eq!(md.get("RPC*Bore"), None);
    }

    #[test]
    fn test_table_column_names() {
        let names = |m| -> Vec<String> { derivations_for(m).iter().map(|d| d.name()).collect() };

        assert_eq!(names(ModelType::HDE), names(ModelType::HD));
        assert_eq!(
            names(ModelType::HDI),
            vec!["Bore^2", "Bore*Rod", "RPC*Bore", "Bore*Stroke"]
        );
        assert_eq!(
            names(ModelType::LDH),
            vec!["Bore*Stroke", "Bore*Rod", "RPC*Bore", "Stroke*Rod"]
        );
        assert_eq!(
            names(ModelType::H),
            vec!["RPC^2", "Bore*Rod", "RPC*Bore", "Bore^2", "RPC*Rod"]
        );
        assert_eq!(
            names(ModelType::L),
            vec!["Bore*RPC", "Bore*Stroke", "Bore^2", "Stroke*Rod"]
        );
        assert_eq!(
            names(ModelType::M),
            vec!["Bore*Stroke", "Bore*Rod", "RPC*Bore", "Bore^2", "RPC*Rod"]
        );
    }

    #[test]
    fn test_models_without_derivations() {
        assert!(derive_features(ModelType::LD, &sample()).is_empty());
        assert!(derive_features(ModelType::N, &sample()).is_empty());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let base = NumericValues::new(12.345, 678.9, 0.1, 3.3);
        for model_type in ModelType::ALL {
            let first = derive_features(model_type, &base);
            let second = derive_features(model_type, &base);
            for ((n1, v1), (n2, v2)) in first.iter().zip(second.iter()) {
                assert_eq!(n1, n2);
                assert_eq!(v1.to_bits(), v2.to_bits());
            }
        }
    }

    #[test]
    fn test_zero_inputs_derive_zero() {
        let zero = NumericValues::default();
        for model_type in ModelType::ALL {
            assert!(derive_features(model_type, &zero).iter().all(|(_, v)| v == 0.0));
        }
    }
}
