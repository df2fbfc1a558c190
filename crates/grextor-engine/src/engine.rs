//! Document ingestion and similarity search across the vector and graph
//! stores.
//!
//! Each call runs its steps strictly in order and stops at the first
//! failure. Nothing is retried and nothing is rolled back: a graph write
//! that fails after the point was stored leaves the point in place and is
//! reported as [`EngineError::GraphWrite`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use grextor_core::{Metadata, MetadataValue, RequestContext};
use grextor_graph::{GraphStore, Node, DOCUMENT_LABEL};
use grextor_vector::{DynEmbeddingService, EmbeddingService, Point, VectorStore};

use crate::error::EngineError;

/// Metadata key holding the original document text.
pub const CONTENT_KEY: &str = "content";

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    /// Text stored under [`CONTENT_KEY`], or empty when absent or not text.
    pub content: String,
    pub metadata: Metadata,
}

/// Orchestrates the embedder and both stores. Cloning is cheap and clones
/// share the same backends.
#[derive(Clone)]
pub struct Engine {
    embedder: Arc<dyn DynEmbeddingService>,
    vectors: Arc<dyn VectorStore>,
    graph: Arc<dyn GraphStore>,
}

impl Engine {
    pub fn new(
        embedder: impl EmbeddingService + 'static,
        vectors: Arc<dyn VectorStore>,
        graph: Arc<dyn GraphStore>,
    ) -> Self {
        Self::new_dyn(Arc::new(embedder), vectors, graph)
    }

    pub fn new_dyn(
        embedder: Arc<dyn DynEmbeddingService>,
        vectors: Arc<dyn VectorStore>,
        graph: Arc<dyn GraphStore>,
    ) -> Self {
        Self {
            embedder,
            vectors,
            graph,
        }
    }

    /// Embed `content`, store it as a point and merge a `Document` node with
    /// the same properties. Returns the document id, generating a UUID when
    /// `id` is `None`.
    ///
    /// `content` is written into the metadata under [`CONTENT_KEY`],
    /// replacing any value the caller put there.
    pub async fn ingest_document(
        &self,
        ctx: &RequestContext,
        id: Option<String>,
        content: &str,
        mut metadata: Metadata,
    ) -> Result<String, EngineError> {
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        info!(id = %id, bytes = content.len(), "Ingesting document");

        let vector = self
            .embedder
            .embed_boxed(ctx, content)
            .await
            .map_err(EngineError::Embed)?;

        metadata.insert(CONTENT_KEY.to_string(), MetadataValue::from(content));

        self.vectors
            .upsert(
                ctx,
                vec![Point {
                    id: id.clone(),
                    vector,
                    metadata: metadata.clone(),
                }],
            )
            .await
            .map_err(EngineError::VectorWrite)?;
        debug!(id = %id, "Point stored");

        let node = Node {
            id: id.clone(),
            label: DOCUMENT_LABEL.to_string(),
            properties: metadata,
        };
        if let Err(source) = self.graph.add_node(ctx, node).await {
            warn!(id = %id, error = %source, "Node write failed, point stored without node");
            return Err(EngineError::GraphWrite { id, source });
        }

        info!(id = %id, "Document ingested");
        Ok(id)
    }

    /// Embed `query` and return up to `limit` nearest documents in the order
    /// the vector store ranks them.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, EngineError> {
        debug!(limit, "Searching");

        let vector = self
            .embedder
            .embed_boxed(ctx, query)
            .await
            .map_err(EngineError::QueryEmbed)?;

        let hits = self
            .vectors
            .search(ctx, &vector, limit)
            .await
            .map_err(EngineError::VectorSearch)?;

        Ok(hits
            .into_iter()
            .map(|hit| SearchResult {
                content: hit
                    .metadata
                    .get(CONTENT_KEY)
                    .and_then(MetadataValue::as_str)
                    .unwrap_or_default()
                    .to_string(),
                id: hit.id,
                score: hit.score,
                metadata: hit.metadata,
            })
            .collect())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("dimensions", &self.embedder.dimensions())
            .finish_non_exhaustive()
    }
}
