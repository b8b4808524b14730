//! Model registry listing

use anyhow::Result;
use estimator_lib::{registry, ModelSummary};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_available, join_names, print_rows, OutputFormat};

/// Row for the models table
#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Model")]
    model_type: String,
    #[tabled(rename = "Required")]
    required: String,
    #[tabled(rename = "Optional (extra cost)")]
    optional: String,
    #[tabled(rename = "Derived")]
    derived: String,
}

/// Row for the models table when served by the API
#[derive(Tabled)]
struct RemoteModelRow {
    #[tabled(inline)]
    model: ModelRow,
    #[tabled(rename = "Estimator")]
    available: String,
}

impl From<&ModelSummary> for ModelRow {
    fn from(summary: &ModelSummary) -> Self {
        Self {
            model_type: summary.model_type.clone(),
            required: join_names(&summary.required),
            optional: join_names(&summary.optional),
            derived: join_names(&summary.derived),
        }
    }
}

/// List model types from the built-in registry
pub fn list_local(format: OutputFormat) {
    let summaries: Vec<ModelSummary> = registry::all_specs().map(|spec| spec.summary()).collect();
    let rows: Vec<ModelRow> = summaries.iter().map(ModelRow::from).collect();
    print_rows(&rows, &summaries, format);
}

/// List model types with estimator availability from the service
pub async fn list_remote(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let list = client.list_models().await?;
    let rows: Vec<RemoteModelRow> = list
        .models
        .iter()
        .map(|m| RemoteModelRow {
            model: ModelRow::from(&m.summary),
            available: color_available(m.available),
        })
        .collect();
    print_rows(&rows, &list, format);
    Ok(())
}
