//! Embedding service trait and implementations.
//!
//! - `OpenAiEmbedding` calls a remote OpenAI-compatible `/embeddings` endpoint.
//!   This is the production embedding backend.
//! - `NoopEmbedding` returns zero vectors of a fixed dimension so the pipeline
//!   runs without any provider configured.
//! - `MockEmbedding` provides deterministic hash-based vectors for testing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use grextor_core::config::EmbeddingConfig;
use grextor_core::error::{GrextorError, Result};
use grextor_core::RequestContext;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Dimension used by `NoopEmbedding` when none is given (ada-002 size).
pub const DEFAULT_DIMENSIONS: usize = 1536;

/// Service for generating text embeddings.
///
/// Implementations must return vectors of the dimension the vector store was
/// configured with; this is not checked here.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(
        &self,
        ctx: &RequestContext,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// Because `EmbeddingService::embed` returns `impl Future` it is not
/// object-safe. This trait uses a boxed future instead, allowing
/// `Arc<dyn DynEmbeddingService>` to be stored in structs without generics.
pub trait DynEmbeddingService: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        ctx: &'a RequestContext,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>>> + Send + 'a>>;

    fn dimensions(&self) -> usize;
}

/// Blanket impl: any `EmbeddingService` automatically implements `DynEmbeddingService`.
impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(
        &'a self,
        ctx: &'a RequestContext,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>>> + Send + 'a>> {
        Box::pin(self.embed(ctx, text))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }
}

// ---------------------------------------------------------------------------
// OpenAiEmbedding - remote embedding API
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// OpenAI-compatible embedding client.
///
/// Sends one text per request. Newlines are replaced with spaces before
/// sending, matching the provider's recommendation for embedding inputs.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedding {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedding {
    pub fn new(config: &EmbeddingConfig, dimensions: usize) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                GrextorError::Configuration("OpenAI embedding requires an API key".to_string())
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                GrextorError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        let model = if config.model.is_empty() {
            EmbeddingConfig::default().model
        } else {
            config.model.clone()
        };

        info!(model = %model, dimensions, "Using OpenAI embedding service");

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model,
            dimensions,
        })
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>> {
        let input = text.replace('\n', " ");
        let url = format!("{}/embeddings", self.endpoint);

        debug!(len = input.len(), model = %self.model, "Requesting embedding");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: [&input],
            })
            .send()
            .await
            .map_err(|e| GrextorError::Embedding(format!("creating embeddings: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GrextorError::Embedding(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| GrextorError::Embedding(format!("decoding response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| GrextorError::Embedding("no embeddings returned".to_string()))
    }
}

impl EmbeddingService for OpenAiEmbedding {
    async fn embed(&self, ctx: &RequestContext, text: &str) -> Result<Vec<f32>> {
        ctx.run(self.request(text)).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// NoopEmbedding - zero vectors, no provider needed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NoopEmbedding {
    dimensions: usize,
}

impl NoopEmbedding {
    /// A dimension of zero falls back to [`DEFAULT_DIMENSIONS`].
    pub fn new(dimensions: usize) -> Self {
        let dimensions = if dimensions == 0 {
            DEFAULT_DIMENSIONS
        } else {
            dimensions
        };
        Self { dimensions }
    }
}

impl Default for NoopEmbedding {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl EmbeddingService for NoopEmbedding {
    async fn embed(&self, ctx: &RequestContext, _text: &str) -> Result<Vec<f32>> {
        ctx.check()?;
        Ok(vec![0.0; self.dimensions])
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// MockEmbedding - deterministic hash-based vectors for testing
// ---------------------------------------------------------------------------

/// Mock embedding service that returns deterministic unit vectors.
///
/// The output is derived from a hash of the input text, so identical inputs
/// always produce identical outputs. This allows testing search without a
/// real model.
#[derive(Debug, Clone)]
pub struct MockEmbedding {
    dimensions: usize,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self::with_dimensions(384)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    pub fn hash_to_vector(&self, text: &str) -> Vec<f32> {
        let mut result = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
            result.push(val as f32);
        }

        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }

        result
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, ctx: &RequestContext, text: &str) -> Result<Vec<f32>> {
        ctx.check()?;
        if text.is_empty() {
            return Err(GrextorError::Embedding("Cannot embed empty text".to_string()));
        }
        Ok(self.hash_to_vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
