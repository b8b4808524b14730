//! API client for communicating with the cost estimator service

use anyhow::{Context, Result};
use estimator_lib::{FormSubmission, ModelSummary, PredictionResult};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the cost estimator service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    pub async fn list_models(&self) -> Result<ModelList> {
        self.get("api/v1/models").await
    }

    pub async fn estimate(&self, request: &EstimateRequest) -> Result<PredictionResult> {
        self.post("api/v1/estimate", request).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => anyhow::bail!("API error ({}): {} [{}]", status, err.error, err.code),
                Err(_) => anyhow::bail!("API error ({}): {}", status, body),
            }
        }

        response.json().await.context("Failed to parse response")
    }
}

// API request/response types

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
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_estimate_posts_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/estimate")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model_type": "NR",
                "numeric": {"Bore": 10.0}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "model_type": "NR",
                    "base_cost": 629.0,
                    "manual_addition": 250.0,
                    "total_cost": 879.0,
                    "generated_at": 1_700_000_000
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let mut form = FormSubmission::default();
        form.numeric.insert("Bore".to_string(), json!(10.0));
        let request = EstimateRequest {
            model_type: "NR".to_string(),
            form,
        };

        let result = client.estimate(&request).await.unwrap();
        mock.assert_async().await;
        assert_eq!(result.total_cost, 879.0);
        assert!(result.defaulted_features.is_empty());
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/estimate")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"unknown model type: XYZ","code":"unknown_model_type"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let request = EstimateRequest {
            model_type: "XYZ".to_string(),
            form: FormSubmission::default(),
        };

        let err = client.estimate(&request).await.unwrap_err().to_string();
        assert!(err.contains("400"));
        assert!(err.contains("unknown_model_type"));
    }

    #[tokio::test]
    async fn test_list_models() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "models": [{
                        "model_type": "LD",
                        "required": ["Bore", "Stroke"],
                        "optional": ["Val B"],
                        "derived": [],
                        "available": true
                    }],
                    "total": 1
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let list = client.list_models().await.unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.models[0].summary.model_type, "LD");
        assert!(list.models[0].available);
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
