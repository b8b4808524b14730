//! Positional vector assembly against an estimator vocabulary

use crate::models::FeatureMap;
use tracing::debug;

/// Input row ordered exactly as the estimator vocabulary demands
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledVector {
    pub values: Vec<f64>,
    /// Vocabulary entries with no resolved value, fed to the estimator as zero
    pub defaulted: Vec<String>,
}

impl AssembledVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Order resolved features by vocabulary, defaulting absent entries to zero
///
/// Zero-filling lets an estimator fitted on a superset of columns accept a
/// sparse input, but it cannot tell "not applicable" apart from "numerically
/// zero". The defaulted names are returned so callers can surface that.
pub fn assemble(resolved: &FeatureMap, vocabulary: &[String]) -> AssembledVector {
    let mut defaulted = Vec::new();
    let values = vocabulary
        .iter()
        .map(|name| match resolved.get(name) {
            Some(value) => *value,
            None => {
                defaulted.push(name.clone());
                0.0
            }
        })
        .collect();

    if !defaulted.is_empty() {
        debug!(
            defaulted = ?defaulted,
            vocabulary_len = vocabulary.len(),
            "Vocabulary entries defaulted to zero"
        );
    }

    AssembledVector { values, defaulted }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_values_follow_vocabulary_order() {
        let mut resolved = FeatureMap::new();
        resolved.insert("Bore".into(), 10.0);
        resolved.insert("Stroke".into(), 20.0);
        resolved.insert("R bearing_Y".into(), 1.0);

        let v = assemble(&resolved, &vocab(&["R bearing_Y", "Stroke", "Bore"]));
        assert_eq!(v.values, vec![1.0, 20.0, 10.0]);
        assert!(v.defaulted.is_empty());
    }

    #[test]
    fn test_missing_entries_default_to_zero() {
        let mut resolved = FeatureMap::new();
        resolved.insert("Bore".into(), 10.0);

        let v = assemble(&resolved, &vocab(&["Bore", "Val B_Y", "Rod"]));
        assert_eq!(v.values, vec![10.0, 0.0, 0.0]);
        assert_eq!(v.defaulted, vocab(&["Val B_Y", "Rod"]));
    }

    #[test]
    fn test_extra_resolved_features_are_dropped() {
        let mut resolved = FeatureMap::new();
        resolved.insert("Bore".into(), 10.0);
        resolved.insert("Unused".into(), 99.0);

        let v = assemble(&resolved, &vocab(&["Bore"]));
        assert_eq!(v.len(), 1);
        assert_eq!(v.values, vec![10.0]);
    }

    #[test]
    fn test_empty_vocabulary() {
        let v = assemble(&FeatureMap::new(), &[]);
        assert!(v.is_empty());
    }
}
