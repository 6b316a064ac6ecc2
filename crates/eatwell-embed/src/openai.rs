//! OpenAI-compatible embeddings client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use eatwell_core::config::EmbeddingConfig;
use eatwell_core::traits::EmbeddingProvider;
use eatwell_core::{Error, Result};

pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    max_retries: usize,
    batch_size: usize,
    id: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: String,
        dimensions: Option<usize>,
        timeout: Duration,
        max_retries: usize,
        batch_size: usize,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::InvalidConfig("missing OpenAI API key".into()));
        }
        if model.trim().is_empty() {
            return Err(Error::InvalidConfig("missing OpenAI model name".into()));
        }
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| Error::InvalidConfig("invalid OpenAI API key".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build OpenAI HTTP client: {e}")))?;
        let endpoint = format!("{}/embeddings", base_url.trim_end_matches('/'));
        let id = format!("openai:{model}");
        Ok(Self { client, endpoint, model, dimensions, max_retries, batch_size: batch_size.max(1), id })
    }

    pub fn from_config(api_key: String, config: &EmbeddingConfig) -> Result<Self> {
        Self::new(
            api_key,
            &config.base_url,
            config.model.clone(),
            config.dimensions,
            Duration::from_millis(config.timeout_ms),
            config.max_retries,
            config.batch_size,
        )
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn request(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest { model: &self.model, input: inputs, dimensions: self.dimensions };
            match self.client.post(&self.endpoint).json(&request).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let mut parsed: EmbeddingResponse = resp
                            .json()
                            .await
                            .map_err(|e| unavailable(format!("failed to parse embedding response: {e}")))?;
                        parsed.data.sort_by_key(|entry| entry.index);
                        if parsed.data.len() != inputs.len() {
                            return Err(unavailable(format!(
                                "returned {} embeddings for {} inputs",
                                parsed.data.len(),
                                inputs.len()
                            )));
                        }
                        debug!(inputs = inputs.len(), "embeddings received");
                        return Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect());
                    }
                    let body = resp.text().await.unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt < self.max_retries {
                        attempt += 1;
                        warn!(%status, attempt, "embedding request failed, retrying");
                        tokio::time::sleep(retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(unavailable(format!("embeddings request failed ({status}): {body}")));
                }
                Err(err) => {
                    if is_retryable_error(&err) && attempt < self.max_retries {
                        attempt += 1;
                        warn!(error = %err, attempt, "embedding request error, retrying");
                        tokio::time::sleep(retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(unavailable(err.to_string()));
                }
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_id(&self) -> &str {
        &self.id
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text])
            .await?
            .pop()
            .ok_or_else(|| unavailable("empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let inputs: Vec<&str> = chunk.iter().map(String::as_str).collect();
            out.extend(self.request(&inputs).await?);
        }
        Ok(out)
    }
}

fn unavailable(msg: String) -> Error {
    Error::ProviderUnavailable(format!("openai: {msg}"))
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(100 * (1 << capped))
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
