//! End-to-end estimation scenarios against JSON artifacts on disk

use estimator_lib::pipeline::{
    assemble, derivations_for, derive_features, feature_map, resolve_features, resolve_name,
};
use estimator_lib::{
    ArtifactFormat, ArtifactLoader, CostEstimator, EstimateError, EstimatorCache, FlagFeature,
    FlagValue, FormSubmission, ModelSpec, ModelType, NumericFeature, NumericValues, RawInputs,
};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Vocabulary an estimator fitted for `model_type` would carry
fn vocabulary_for(model_type: ModelType) -> Vec<String> {
    let spec = ModelSpec::for_model(model_type);
    spec.required()
        .iter()
        .map(|f| resolve_name(f.name()).to_string())
        .chain(derivations_for(model_type).iter().map(|d| d.name()))
        .collect()
}

fn write_linear(
    dir: &Path,
    model_type: ModelType,
    vocabulary: &[String],
    coefficients: Vec<f64>,
    intercept: f64,
    transform: &str,
) {
    let artifact = json!({
        "feature_names": vocabulary,
        "target_transform": transform,
        "model": {"kind": "linear", "coefficients": coefficients, "intercept": intercept}
    });
    fs::write(
        dir.join(format!("{}_model.json", model_type)),
        serde_json::to_vec_pretty(&artifact).unwrap(),
    )
    .unwrap();
}

fn estimator_for(dir: &Path) -> CostEstimator {
    CostEstimator::new(EstimatorCache::new(ArtifactLoader::new(dir, ArtifactFormat::Json)))
}

fn nr_inputs() -> RawInputs {
    RawInputs::new()
        .with_numeric(NumericFeature::Bore, 10.0)
        .with_numeric(NumericFeature::Stroke, 20.0)
        .with_numeric(NumericFeature::Rpc, 5.0)
        .with_numeric(NumericFeature::Rod, 3.0)
        .with_flag(FlagFeature::RBearing, FlagValue::Yes)
}

fn full_inputs(bore: f64, stroke: f64, rpc: f64, rod: f64) -> RawInputs {
    RawInputs::new()
        .with_numeric(NumericFeature::Bore, bore)
        .with_numeric(NumericFeature::Stroke, stroke)
        .with_numeric(NumericFeature::Rpc, rpc)
        .with_numeric(NumericFeature::Rod, rod)
        .with_flag(FlagFeature::RBearing, FlagValue::No)
        .with_flag(FlagFeature::BBearing, FlagValue::Yes)
        .with_flag(FlagFeature::Block, FlagValue::No)
        .with_flag(FlagFeature::ValA, FlagValue::Yes)
}

#[test]
fn nr_derived_features_positioned_by_vocabulary() {
    let vocabulary: Vec<String> = [
        "Stroke^2",
        "Bore",
        "RPC*Rod",
        "R bearing_Y",
        "Stroke",
        "Bore*RPC",
        "RPC",
        "RPC^2",
        "Rod",
        "RPC*Stroke",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let spec = ModelSpec::for_model(ModelType::NR);
    let inputs = nr_inputs();
    let derived = derive_features(ModelType::NR, &NumericValues::new(10.0, 20.0, 5.0, 3.0));
    let vector = assemble(&resolve_features(&feature_map(&spec, &inputs, &derived)), &vocabulary);

    assert_eq!(
        vector.values,
        vec![400.0, 10.0, 15.0, 1.0, 20.0, 50.0, 5.0, 25.0, 3.0, 100.0]
    );
    assert!(vector.defaulted.is_empty());

    let dir = TempDir::new().unwrap();
    write_linear(dir.path(), ModelType::NR, &vocabulary, vec![1.0; 10], 0.0, "none");
    let result = estimator_for(dir.path())
        .estimate("NR", &inputs)
        .unwrap();

    assert_eq!(result.model_type, "NR");
    assert_eq!(result.base_cost, 629.0);
    assert_eq!(result.manual_addition, 0.0);
    assert_eq!(result.total_cost, 629.0);
}

#[test]
fn ld_adds_val_b_extra_cost() {
    let dir = TempDir::new().unwrap();
    let vocabulary = vocabulary_for(ModelType::LD);
    let width = vocabulary.len();
    write_linear(
        dir.path(),
        ModelType::LD,
        &vocabulary,
        vec![0.0; width],
        1000.0_f64.ln_1p(),
        "log1p",
    );

    let inputs = full_inputs(100.0, 200.0, 50.0, 30.0).with_extra_cost(FlagFeature::ValB, 250.0, true);
    let result = estimator_for(dir.path()).estimate("LD", &inputs).unwrap();

    assert!((result.base_cost - 1000.0).abs() < 1e-6, "base {}", result.base_cost);
    assert_eq!(result.manual_addition, 250.0);
    assert!((result.total_cost - (result.base_cost + 250.0)).abs() < 1e-9);
}

#[test]
fn disabled_extra_cost_is_not_added() {
    let dir = TempDir::new().unwrap();
    let vocabulary = vocabulary_for(ModelType::LD);
    let width = vocabulary.len();
    write_linear(dir.path(), ModelType::LD, &vocabulary, vec![0.0; width], 0.0, "none");

    let inputs = full_inputs(1.0, 1.0, 1.0, 1.0).with_extra_cost(FlagFeature::ValB, 250.0, false);
    let result = estimator_for(dir.path()).estimate("LD", &inputs).unwrap();
    assert_eq!(result.manual_addition, 0.0);
}

#[test]
fn unknown_model_type_fails_before_any_load() {
    let dir = TempDir::new().unwrap();
    let estimator = estimator_for(dir.path());

    let err = estimator.estimate("XYZ", &nr_inputs()).unwrap_err();
    assert!(matches!(err, EstimateError::UnknownModelType(ref id) if id == "XYZ"));
    assert!(estimator.cache().cached_models().is_empty());
}

#[test]
fn missing_artifact_reports_not_found_and_recovers() {
    let dir = TempDir::new().unwrap();
    let estimator = estimator_for(dir.path());

    let err = estimator.estimate("NR", &nr_inputs()).unwrap_err();
    assert!(matches!(err, EstimateError::EstimatorNotFound { model_type: ModelType::NR, .. }));
    assert!(err.is_retryable());

    let vocabulary = vocabulary_for(ModelType::NR);
    let width = vocabulary.len();
    write_linear(dir.path(), ModelType::NR, &vocabulary, vec![0.0; width], 42.0, "none");

    let result = estimator.estimate("NR", &nr_inputs()).unwrap();
    assert_eq!(result.base_cost, 42.0);
}

#[test]
fn zero_inputs_predict_without_error() {
    let dir = TempDir::new().unwrap();
    for model_type in ModelType::ALL {
        let vocabulary = vocabulary_for(model_type);
        let width = vocabulary.len();
        write_linear(dir.path(), model_type, &vocabulary, vec![3.0; width], 0.0, "log1p");
    }
    let estimator = estimator_for(dir.path());

    let mut zero = RawInputs::new();
    for feature in NumericFeature::ALL {
        zero.set_numeric(feature, 0.0);
    }
    for feature in FlagFeature::ALL {
        zero.set_flag(feature, FlagValue::No);
    }

    for model_type in ModelType::ALL {
        let result = estimator.estimate(model_type.as_str(), &zero).unwrap();
        assert_eq!(result.base_cost, 0.0, "{}", model_type);
        assert_eq!(result.total_cost, 0.0, "{}", model_type);
    }
}

#[test]
fn vector_length_matches_vocabulary_for_every_model() {
    let dir = TempDir::new().unwrap();
    for model_type in ModelType::ALL {
        // Fitted on a superset: an extra column the inputs never supply
        let mut vocabulary = vocabulary_for(model_type);
        vocabulary.push("Val B_Y".to_string());
        let width = vocabulary.len();
        write_linear(dir.path(), model_type, &vocabulary, vec![0.0; width], 1.0, "none");

        let spec = ModelSpec::for_model(model_type);
        let inputs = full_inputs(10.0, 20.0, 5.0, 3.0);
        let derived = derive_features(model_type, &inputs.numeric_values());
        let vector = assemble(&resolve_features(&feature_map(&spec, &inputs, &derived)), &vocabulary);
        assert_eq!(vector.len(), width, "{}", model_type);
    }

    let estimator = estimator_for(dir.path());
    for model_type in ModelType::ALL {
        let result = estimator
            .estimate(model_type.as_str(), &full_inputs(10.0, 20.0, 5.0, 3.0))
            .unwrap();
        assert_eq!(result.defaulted_features, vec!["Val B_Y".to_string()]);
    }
    assert_eq!(estimator.cache().cached_models().len(), ModelType::ALL.len());
}

#[test]
fn l_model_requires_only_block_flag() {
    let dir = TempDir::new().unwrap();
    let vocabulary = vocabulary_for(ModelType::L);
    write_linear(dir.path(), ModelType::L, &vocabulary, vec![1.0; vocabulary.len()], 0.0, "none");
    let estimator = estimator_for(dir.path());

    let inputs = RawInputs::new()
        .with_numeric(NumericFeature::Bore, 1.0)
        .with_numeric(NumericFeature::Stroke, 2.0)
        .with_numeric(NumericFeature::Rpc, 3.0)
        .with_numeric(NumericFeature::Rod, 4.0)
        .with_flag(FlagFeature::Block, FlagValue::Yes);
    let result = estimator.estimate("L", &inputs).unwrap();

    // Bore+Stroke+RPC+Rod + Block_Y + Bore*RPC + Bore*Stroke + Bore^2 + Stroke*Rod
    assert_eq!(result.base_cost, 10.0 + 1.0 + 3.0 + 2.0 + 1.0 + 8.0);
}

#[test]
fn missing_required_feature_is_reported() {
    let dir = TempDir::new().unwrap();
    let estimator = estimator_for(dir.path());

    let inputs = RawInputs::new().with_numeric(NumericFeature::Bore, 1.0);
    let err = estimator.estimate("HD", &inputs).unwrap_err();
    assert_eq!(err.kind(), "missing_required_feature");
}

#[test]
fn form_submission_flows_through_collector() {
    let dir = TempDir::new().unwrap();
    let vocabulary = vocabulary_for(ModelType::NR);
    write_linear(dir.path(), ModelType::NR, &vocabulary, vec![1.0; vocabulary.len()], 0.0, "none");
    let estimator = estimator_for(dir.path());

    let form: FormSubmission = serde_json::from_value(json!({
        "numeric": {"Bore": "10", "Stroke": 20, "RPC": 5, "Rod": "3"},
        "flags": {"R bearing": "yes"},
        "extra_costs": {"Val B": {"amount": "250"}, "Block": {"amount": 50, "included": false}}
    }))
    .unwrap();

    let result = estimator.estimate_form("NR", &form).unwrap();
    assert_eq!(result.base_cost, 629.0);
    assert_eq!(result.manual_addition, 250.0);
    assert_eq!(result.total_cost, 879.0);

    let err = estimator.estimate_form("XYZ", &form).unwrap_err();
    assert_eq!(err.kind(), "unknown_model_type");
}
