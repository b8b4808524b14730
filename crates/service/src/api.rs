//! HTTP API for estimates, model listing, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use estimator_lib::{
    registry, CostEstimator, EstimateError, FormSubmission, ModelSummary, ModelType,
    PredictionResult,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub estimator: Arc<CostEstimator>,
}

impl AppState {
    pub fn new(estimator: Arc<CostEstimator>) -> Self {
        Self { estimator }
    }
}

/// Body of `POST /api/v1/estimate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub model_type: String,
    #[serde(flatten)]
    pub form: FormSubmission,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(flatten)]
    pub summary: ModelSummary,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    pub models: Vec<ModelInfo>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub models_loaded: Vec<String>,
    pub models_missing: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Failures surfaced to the caller as user-visible messages
pub enum ApiError {
    Estimate(EstimateError),
    /// Request body that is not a valid estimate request
    Body(JsonRejection),
    Internal(String),
}

impl From<EstimateError> for ApiError {
    fn from(e: EstimateError) -> Self {
        ApiError::Estimate(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Estimate(e) => {
                let status = match &e {
                    EstimateError::UnknownModelType(_)
                    | EstimateError::MalformedInput { .. }
                    | EstimateError::MissingRequiredFeature(_) => StatusCode::BAD_REQUEST,
                    EstimateError::EstimatorNotFound { .. } => StatusCode::NOT_FOUND,
                    EstimateError::PredictionError(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    EstimateError::InvalidArtifact { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.kind().to_string(), e.to_string())
            }
            ApiError::Body(rejection) => (
                StatusCode::BAD_REQUEST,
                "malformed_input".to_string(),
                rejection.body_text(),
            ),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal".to_string(),
                message,
            ),
        };

        (status, Json(ErrorResponse { error: message, code })).into_response()
    }
}

/// Run one estimation cycle on the blocking pool; first loads read artifacts from disk
async fn estimate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(request) = payload?;
    let estimator = state.estimator.clone();
    let result = tokio::task::spawn_blocking(move || {
        estimator.estimate_form(&request.model_type, &request.form)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "Estimate task failed");
        ApiError::Internal("estimate task failed".to_string())
    })??;

    Ok(Json(result))
}

async fn models(State(state): State<Arc<AppState>>) -> Json<ModelList> {
    let cache = state.estimator.cache();
    let models: Vec<ModelInfo> = registry::all_specs()
        .map(|spec| ModelInfo {
            summary: spec.summary(),
            available: cache.is_available(spec.model_type),
        })
        .collect();
    let total = models.len();
    Json(ModelList { models, total })
}

/// Health check - degraded when some estimators are missing, still 200
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cache = state.estimator.cache();
    let loaded: Vec<String> = cache.cached_models().iter().map(|m| m.to_string()).collect();
    let missing: Vec<String> = ModelType::ALL
        .iter()
        .filter(|m| !cache.is_available(**m))
        .map(|m| m.to_string())
        .collect();

    let status = if missing.is_empty() { "healthy" } else { "degraded" };
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: status.to_string(),
            models_loaded: loaded,
            models_missing: missing,
        }),
    )
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return ApiError::Internal(format!("failed to encode metrics: {}", e)).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/api/v1/models", get(models))
        .route("/api/v1/estimate", post(estimate))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
