//! Cost estimate command

use anyhow::{Context, Result};
use clap::Args;
use estimator_lib::{
    ArtifactFormat, ArtifactLoader, CostEstimator, EstimatorCache, ExtraCostField,
    FeatureCollector, FormSubmission, NumericFeature, PredictionResult,
};
use serde_json::Value;
use std::path::PathBuf;
use tabled::Tabled;

use crate::client::{ApiClient, EstimateRequest};
use crate::output::{format_cost, format_timestamp, print_rows, print_warning, OutputFormat};

#[derive(Debug, Args)]
pub struct EstimateArgs {
    /// Model type identifier (HD, HDE, HDI, LD, LDH, MD, NR, H, L, M, N)
    #[arg(long, short)]
    pub model: String,

    /// Bore diameter
    #[arg(long)]
    pub bore: Option<f64>,

    /// Stroke length
    #[arg(long)]
    pub stroke: Option<f64>,

    /// RPC value
    #[arg(long)]
    pub rpc: Option<f64>,

    /// Rod diameter
    #[arg(long)]
    pub rod: Option<f64>,

    /// Yes/no field as NAME=VALUE, e.g. "R bearing=yes" (repeatable)
    #[arg(long = "flag", value_parser = parse_key_value)]
    pub flags: Vec<(String, String)>,

    /// Extra cost for an optional field as NAME=AMOUNT, e.g. "Val B=250" (repeatable)
    #[arg(long = "extra", value_parser = parse_key_value)]
    pub extras: Vec<(String, String)>,

    /// Estimate locally from artifacts in this directory instead of calling the API
    #[arg(long, env = "CE_ARTIFACT_DIR")]
    pub artifact_dir: Option<PathBuf>,

    /// Artifact format for local estimates
    #[arg(long, default_value_t = ArtifactFormat::Json)]
    pub artifact_format: ArtifactFormat,

    /// Reject values that cannot be coerced instead of defaulting them (local only)
    #[arg(long)]
    pub strict: bool,
}

impl EstimateArgs {
    /// Raw form fields as the service would receive them
    pub fn form(&self) -> FormSubmission {
        let mut form = FormSubmission::default();

        let numeric = [
            (NumericFeature::Bore, self.bore),
            (NumericFeature::Stroke, self.stroke),
            (NumericFeature::Rpc, self.rpc),
            (NumericFeature::Rod, self.rod),
        ];
        for (feature, value) in numeric {
            if let Some(v) = value {
                form.numeric.insert(feature.name().to_string(), Value::from(v));
            }
        }

        for (name, value) in &self.flags {
            form.flags.insert(name.clone(), Value::String(value.clone()));
        }

        for (name, amount) in &self.extras {
            form.extra_costs.insert(
                name.clone(),
                ExtraCostField {
                    amount: Value::String(amount.clone()),
                    included: true,
                },
            );
        }

        form
    }
}

/// Parse `NAME=VALUE`, trimming both sides
pub fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{}'", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Row for the estimate table
#[derive(Tabled)]
struct EstimateRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Run one estimate, locally when an artifact directory is known
pub async fn run(
    args: EstimateArgs,
    api_url: &str,
    default_artifact_dir: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let form = args.form();

    let result = match args.artifact_dir.clone().or(default_artifact_dir) {
        Some(dir) => estimate_local(&args, dir, &form)?,
        None => {
            let client = ApiClient::new(api_url)?;
            let request = EstimateRequest {
                model_type: args.model.clone(),
                form,
            };
            client.estimate(&request).await?
        }
    };

    print_result(&result, format);
    Ok(())
}

fn estimate_local(args: &EstimateArgs, dir: PathBuf, form: &FormSubmission) -> Result<PredictionResult> {
    let collector = if args.strict {
        FeatureCollector::strict()
    } else {
        FeatureCollector::lenient()
    };
    let loader = ArtifactLoader::new(&dir, args.artifact_format);
    let estimator = CostEstimator::new(EstimatorCache::new(loader)).with_collector(collector);

    estimator
        .estimate_form(&args.model, form)
        .with_context(|| format!("Estimate for model type '{}' failed", args.model))
}

fn print_result(result: &PredictionResult, format: OutputFormat) {
    if format == OutputFormat::Table && !result.defaulted_features.is_empty() {
        print_warning(&format!(
            "Estimator expected features with no value, fed as zero: {}",
            result.defaulted_features.join(", ")
        ));
    }

    let rows = [
        EstimateRow {
            field: "Model",
            value: result.model_type.clone(),
        },
        EstimateRow {
            field: "Base cost",
            value: format_cost(result.base_cost),
        },
        EstimateRow {
            field: "Manual addition",
            value: format_cost(result.manual_addition),
        },
        EstimateRow {
            field: "Total cost",
            value: format_cost(result.total_cost),
        },
        EstimateRow {
            field: "Generated",
            value: format_timestamp(result.generated_at),
        },
    ];

    print_rows(&rows, result, format);
}
