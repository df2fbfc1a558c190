//! Vector store capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use grextor_core::error::Result;
use grextor_core::{Metadata, RequestContext};

/// A record in the vector index. One point per id; re-upserting an id
/// replaces both vector and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
}

/// A search hit. Higher scores are more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub metadata: Metadata,
}

/// Nearest-neighbour storage for embedded documents.
///
/// Implementations must be safe to share across concurrent callers.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the backing collection if it does not exist. Idempotent.
    async fn ensure_collection(&self, ctx: &RequestContext) -> Result<()>;

    /// Write points keyed by id. Batches are not atomic.
    async fn upsert(&self, ctx: &RequestContext, points: Vec<Point>) -> Result<()>;

    /// Return up to `limit` points by descending cosine similarity. Order
    /// among equal scores is unspecified.
    async fn search(
        &self,
        ctx: &RequestContext,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>>;
}
