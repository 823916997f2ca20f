//! Hosted embedding API client (OpenAI-compatible `/embeddings`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Embedder;
use crate::error::EmbeddingError;
use crate::models::{EmbeddingConfig, ModelSpec};
use crate::utils::retry::{RetryConfig, retry};

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// Embeds text by calling a hosted embeddings endpoint.
#[derive(Debug, Clone)]
pub struct RemoteApiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    spec: ModelSpec,
    retry: RetryConfig,
}

impl RemoteApiEmbedder {
    /// Build a client for `spec`. The API key must already be resolved
    /// (config file or `OPENAI_API_KEY`).
    pub fn new(
        spec: ModelSpec,
        config: &EmbeddingConfig,
        retry: RetryConfig,
    ) -> Result<Self, EmbeddingError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                EmbeddingError::Configuration(
                    "an API key is required for the remote provider (set OPENAI_API_KEY)"
                        .to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
            spec,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbedRequest {
            model: &self.spec.model,
            input: [text],
            dimensions: self.spec.send_dimensions.then_some(self.spec.dimension),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else if e.is_connect() {
                    EmbeddingError::ConnectionError(e.to_string())
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError { status, message });
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }
}

#[async_trait]
impl Embedder for RemoteApiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        tracing::debug!(model = %self.spec.model, chars = text.len(), "requesting embedding");
        retry(&self.retry, || self.request_embedding(text)).await
    }

    fn dimension(&self) -> usize {
        self.spec.dimension
    }

    fn model_name(&self) -> &str {
        &self.spec.model
    }
}
