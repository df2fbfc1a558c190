//! In-memory property graph with the same merge semantics as the Neo4j store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use grextor_core::error::{GrextorError, Result};
use grextor_core::{Metadata, RequestContext};

use crate::store::{Edge, GraphStore, Node};

const BACKEND: &str = "memory-graph";

type NodeKey = (String, String);
type EdgeKey = (NodeKey, String, NodeKey);

#[derive(Debug, Default)]
struct GraphState {
    /// Keyed by (label, id).
    nodes: HashMap<NodeKey, Metadata>,
    /// Keyed by (from node, type, to node). Endpoints are matched by id under
    /// every label, so one call can merge several relationships.
    edges: HashMap<EdgeKey, Metadata>,
}

/// Thread-safe via interior RwLock; clones share the same graph.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphStore {
    state: Arc<RwLock<GraphState>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, label: &str, id: &str) -> Option<Node> {
        let state = self.state.read().ok()?;
        state
            .nodes
            .get(&(label.to_string(), id.to_string()))
            .map(|properties| Node {
                id: id.to_string(),
                label: label.to_string(),
                properties: properties.clone(),
            })
    }

    /// Any relationship of `edge_type` from `from_id` to `to_id`.
    pub fn edge(&self, from_id: &str, edge_type: &str, to_id: &str) -> Option<Edge> {
        self.edges_between(from_id, edge_type, to_id).into_iter().next()
    }

    /// Every relationship of `edge_type` from `from_id` to `to_id`, one per
    /// matched pair of labelled endpoints.
    pub fn edges_between(&self, from_id: &str, edge_type: &str, to_id: &str) -> Vec<Edge> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        state
            .edges
            .iter()
            .filter(|((from, kind, to), _)| {
                from.1 == from_id && kind == edge_type && to.1 == to_id
            })
            .map(|(_, properties)| Edge {
                from_id: from_id.to_string(),
                to_id: to_id.to_string(),
                edge_type: edge_type.to_string(),
                properties: properties.clone(),
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.state.read().map(|s| s.nodes.len()).unwrap_or(0)
    }

    pub fn edge_count(&self) -> usize {
        self.state.read().map(|s| s.edges.len()).unwrap_or(0)
    }
}

fn overlay(target: &mut Metadata, properties: Metadata) {
    for (k, v) in properties {
        target.insert(k, v);
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn add_node(&self, ctx: &RequestContext, node: Node) -> Result<()> {
        ctx.check()?;
        let mut state = self
            .state
            .write()
            .map_err(|e| GrextorError::write(BACKEND, format!("Lock poisoned: {}", e)))?;

        debug!(id = %node.id, label = %node.label, "Merging node");
        let existing = state.nodes.entry((node.label, node.id)).or_default();
        overlay(existing, node.properties);
        Ok(())
    }

    async fn add_edge(&self, ctx: &RequestContext, edge: Edge) -> Result<()> {
        ctx.check()?;
        let mut state = self
            .state
            .write()
            .map_err(|e| GrextorError::write(BACKEND, format!("Lock poisoned: {}", e)))?;

        let matching = |id: &str| -> Vec<NodeKey> {
            state
                .nodes
                .keys()
                .filter(|(_, node_id)| node_id == id)
                .cloned()
                .collect()
        };
        let sources = matching(edge.from_id.as_str());
        let targets = matching(edge.to_id.as_str());
        if sources.is_empty() || targets.is_empty() {
            debug!(
                from = %edge.from_id,
                to = %edge.to_id,
                edge_type = %edge.edge_type,
                "Edge endpoint missing, nothing written"
            );
            return Ok(());
        }

        for source in &sources {
            for target in &targets {
                let existing = state
                    .edges
                    .entry((source.clone(), edge.edge_type.clone(), target.clone()))
                    .or_default();
                overlay(existing, edge.properties.clone());
            }
        }
        Ok(())
    }

    async fn verify_connectivity(&self, ctx: &RequestContext) -> Result<()> {
        ctx.check()
    }
}
