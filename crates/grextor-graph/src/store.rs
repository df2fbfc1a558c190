//! Graph store capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use grextor_core::error::Result;
use grextor_core::{Metadata, RequestContext};

/// Label given to nodes created by document ingestion.
pub const DOCUMENT_LABEL: &str = "Document";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub properties: Metadata,
}

/// A directed, typed relationship between two node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from_id: String,
    pub to_id: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub properties: Metadata,
}

/// Property graph with merge semantics.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create the node for (label, id) or overlay `properties` onto the
    /// existing one. Properties absent from the call are left untouched.
    async fn add_node(&self, ctx: &RequestContext, node: Node) -> Result<()>;

    /// Merge one relationship of `edge_type` from `from_id` to `to_id`,
    /// overlaying properties like [`GraphStore::add_node`]. Endpoints are
    /// matched by id under any label. When either endpoint is missing
    /// nothing is written and no error is returned.
    async fn add_edge(&self, ctx: &RequestContext, edge: Edge) -> Result<()>;

    /// Liveness probe.
    async fn verify_connectivity(&self, ctx: &RequestContext) -> Result<()>;
}
