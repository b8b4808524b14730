//! Translation from display names to the estimator's column vocabulary

use crate::models::FeatureMap;

/// One-hot encoded yes/no columns carry a `_Y` suffix in fitted estimators
pub const RENAME_TABLE: &[(&str, &str)] = &[
    ("R bearing", "R bearing_Y"),
    ("B bearing", "B bearing_Y"),
    ("Block", "Block_Y"),
    ("Val A", "Val A_Y"),
    ("Val B", "Val B_Y"),
];

/// Resolve one name; names absent from the table pass through unchanged
pub fn resolve_name(name: &str) -> &str {
    RENAME_TABLE
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .unwrap_or(name)
}

/// Resolve every key of a feature map into a new map
pub fn resolve_features(features: &FeatureMap) -> FeatureMap {
    features
        .iter()
        .map(|(name, value)| (resolve_name(name).to_string(), *value))
        .collect()
}
