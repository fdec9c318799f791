//! Embedding providers for document and query text.
//!
//! Embeddings are produced by an external embedding server speaking a
//! small JSON protocol (`POST /embed`). Two provider flavours exist and
//! are chosen by the collection's language: a general provider that
//! embeds documents and queries identically, and a BGE-style provider
//! that prepends a retrieval instruction to queries. Vectors from
//! different models are not comparable, so the choice is fixed for the
//! lifetime of a collection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;
use crate::models::{EmbeddingConfig, ModelEndpoint};

/// Instruction BGE models expect in front of retrieval queries.
pub const BGE_QUERY_INSTRUCTION: &str =
    "Represent this sentence for searching relevant passages: ";

/// Capability contract: text in, fixed-dimension vector out.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of document passages.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a search query. May differ from document embedding in
    /// prompt prefix, depending on the model.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn dimension(&self) -> u64;

    fn model_id(&self) -> &str;
}

/// Select the provider for a collection by its declared language.
pub fn provider_for_language(
    language: &str,
    config: &EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>, EmbeddingError> {
    if language.eq_ignore_ascii_case("zh") {
        Ok(Box::new(GeneralEmbedding::new(&config.zh, config)?))
    } else {
        Ok(Box::new(BgeEmbedding::new(&config.en, config)?))
    }
}

/// Request body for the `/embed` endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest {
    inputs: Vec<String>,
    model: String,
    normalize: bool,
    truncate: bool,
}

/// Response from the `/embed` endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse(Vec<Vec<f32>>);

/// Shared HTTP client for one embedding endpoint.
#[derive(Debug, Clone)]
struct EmbedHttpClient {
    client: Client,
    base_url: String,
    model: String,
    dimension: u64,
    normalize: bool,
    batch_size: usize,
}

impl EmbedHttpClient {
    fn new(endpoint: &ModelEndpoint, config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: endpoint.url.trim_end_matches('/').to_string(),
            model: endpoint.model.clone(),
            dimension: u64::from(endpoint.dimension),
            normalize: endpoint.normalize,
            batch_size: config.batch_size.max(1) as usize,
        })
    }

    /// Embed texts, batching requests to the configured batch size.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let embeddings = self.embed_single_batch(batch).await?;
            all_embeddings.extend(embeddings);
        }
        Ok(all_embeddings)
    }

    async fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/embed", self.base_url);
        let request = EmbedRequest {
            inputs: texts.to_vec(),
            model: self.model.clone(),
            normalize: self.normalize,
            truncate: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if embed_response.0.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embed_response.0.len()
            )));
        }
        for vector in &embed_response.0 {
            if vector.len() as u64 != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    got: vector.len() as u64,
                });
            }
        }

        Ok(embed_response.0)
    }
}

/// Provider that embeds documents and queries the same way. Used for
/// Chinese collections.
pub struct GeneralEmbedding {
    http: EmbedHttpClient,
}

impl GeneralEmbedding {
    pub fn new(endpoint: &ModelEndpoint, config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        Ok(Self {
            http: EmbedHttpClient::new(endpoint, config)?,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for GeneralEmbedding {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.http.embed(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let embeddings = self.http.embed(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }

    fn dimension(&self) -> u64 {
        self.http.dimension
    }

    fn model_id(&self) -> &str {
        &self.http.model
    }
}

/// BGE-style provider: documents are embedded as-is, queries carry the
/// retrieval instruction prefix. Used for English collections.
pub struct BgeEmbedding {
    http: EmbedHttpClient,
}

impl BgeEmbedding {
    pub fn new(endpoint: &ModelEndpoint, config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        Ok(Self {
            http: EmbedHttpClient::new(endpoint, config)?,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for BgeEmbedding {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.http.embed(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let prompted = format!("{}{}", BGE_QUERY_INSTRUCTION, text);
        let embeddings = self.http.embed(&[prompted]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }

    fn dimension(&self) -> u64 {
        self.http.dimension
    }

    fn model_id(&self) -> &str {
        &self.http.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_selection_by_language() {
        let config = EmbeddingConfig::default();

        let zh = provider_for_language("zh", &config).unwrap();
        assert_eq!(zh.model_id(), config.zh.model);

        let en = provider_for_language("en", &config).unwrap();
        assert_eq!(en.model_id(), config.en.model);

        // Anything that is not Chinese falls back to the BGE model.
        let de = provider_for_language("de", &config).unwrap();
        assert_eq!(de.model_id(), config.en.model);
    }

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig::default();
        let endpoint = ModelEndpoint {
            url: "http://localhost:8080/".to_string(),
            model: "m".to_string(),
            dimension: 4,
            normalize: true,
        };
        let client = EmbedHttpClient::new(&endpoint, &config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
