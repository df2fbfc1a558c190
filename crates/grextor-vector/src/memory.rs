//! In-memory vector store with brute-force cosine similarity search.
//!
//! Search is O(n) per query, which is fine for tests, local runs and
//! moderate datasets.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use grextor_core::error::{GrextorError, Result};
use grextor_core::{Metadata, RequestContext};

use crate::store::{Point, ScoredPoint, VectorStore};

const BACKEND: &str = "memory-vector";

#[derive(Debug, Clone)]
struct VectorEntry {
    embedding: Vec<f32>,
    metadata: Metadata,
}

/// Thread-safe via interior RwLock; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectorStore {
    entries: Arc<RwLock<HashMap<String, VectorEntry>>>,
    dimension: Option<usize>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject upserts whose vectors are not exactly `dimension` long, the way
    /// a real collection would.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            entries: Arc::default(),
            dimension: Some(dimension),
        }
    }

    /// Look up a stored point by id.
    pub fn get(&self, id: &str) -> Option<Point> {
        let entries = self.entries.read().ok()?;
        entries.get(id).map(|entry| Point {
            id: id.to_string(),
            vector: entry.embedding.clone(),
            metadata: entry.metadata.clone(),
        })
    }

    /// Remove a point. Returns Ok(()) whether or not it existed.
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| GrextorError::write(BACKEND, format!("Lock poisoned: {}", e)))?;
        entries.remove(id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self, ctx: &RequestContext) -> Result<()> {
        ctx.check()
    }

    async fn upsert(&self, ctx: &RequestContext, points: Vec<Point>) -> Result<()> {
        ctx.check()?;

        if let Some(dimension) = self.dimension {
            if let Some(bad) = points.iter().find(|p| p.vector.len() != dimension) {
                return Err(GrextorError::write(
                    BACKEND,
                    format!(
                        "point {} has dimension {}, collection expects {}",
                        bad.id,
                        bad.vector.len(),
                        dimension
                    ),
                ));
            }
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|e| GrextorError::write(BACKEND, format!("Lock poisoned: {}", e)))?;
        for point in points {
            debug!(id = %point.id, "Upserting point");
            entries.insert(
                point.id,
                VectorEntry {
                    embedding: point.vector,
                    metadata: point.metadata,
                },
            );
        }
        Ok(())
    }

    async fn search(
        &self,
        ctx: &RequestContext,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        ctx.check()?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let entries = self
            .entries
            .read()
            .map_err(|e| GrextorError::read(BACKEND, format!("Lock poisoned: {}", e)))?;

        let mut scored: Vec<(f64, &String, &VectorEntry)> = entries
            .iter()
            .map(|(id, entry)| (cosine_similarity(vector, &entry.embedding), id, entry))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(score, id, entry)| ScoredPoint {
                id: id.clone(),
                score: score as f32,
                metadata: entry.metadata.clone(),
            })
            .collect())
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grextor_core::MetadataValue;

    fn point(id: &str, vector: Vec<f32>) -> Point {
        let mut metadata = Metadata::new();
        metadata.insert("name".into(), MetadataValue::Text(id.to_string()));
        Point {
            id: id.to_string(),
            vector,
            metadata,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_search() {
        let ctx = RequestContext::background();
        let store = InMemoryVectorStore::new();
        store
            .upsert(
                &ctx,
                vec![point("a", vec![1.0; 8]), point("b", vec![1.0; 8])],
            )
            .await
            .unwrap();
        assert_eq!(store.len(), 2);

        let hits = store.search(&ctx, &[1.0; 8], 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert!((hits[1].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_search_ordering() {
        let ctx = RequestContext::background();
        let store = InMemoryVectorStore::new();
        store
            .upsert(
                &ctx,
                vec![point("far", vec![-1.0; 8]), point("close", vec![1.0; 8])],
            )
            .await
            .unwrap();

        let hits = store.search(&ctx, &[1.0; 8], 10).await.unwrap();
        assert_eq!(hits[0].id, "close");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let ctx = RequestContext::background();
        let store = InMemoryVectorStore::new();
        let points = (0..10).map(|i| point(&format!("p{}", i), vec![1.0; 4])).collect();
        store.upsert(&ctx, points).await.unwrap();

        assert_eq!(store.search(&ctx, &[1.0; 4], 3).await.unwrap().len(), 3);
        assert!(store.search(&ctx, &[1.0; 4], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_empty_store() {
        let store = InMemoryVectorStore::new();
        let hits = store
            .search(&RequestContext::background(), &[1.0; 4], 10)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_whole_point() {
        let ctx = RequestContext::background();
        let store = InMemoryVectorStore::new();

        let mut first = point("x", vec![1.0; 4]);
        first.metadata.insert("extra".into(), MetadataValue::Bool(true));
        store.upsert(&ctx, vec![first]).await.unwrap();
        store.upsert(&ctx, vec![point("x", vec![2.0; 4])]).await.unwrap();

        assert_eq!(store.len(), 1);
        let stored = store.get("x").unwrap();
        assert_eq!(stored.vector, vec![2.0; 4]);
        assert!(!stored.metadata.contains_key("extra"));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = InMemoryVectorStore::with_dimension(4);
        let result = store
            .upsert(&RequestContext::background(), vec![point("x", vec![1.0; 3])])
            .await;
        assert!(matches!(result, Err(GrextorError::StoreWrite { .. })));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_context_rejected() {
        let ctx = RequestContext::background();
        ctx.cancel();
        let store = InMemoryVectorStore::new();
        assert!(matches!(
            store.upsert(&ctx, vec![point("x", vec![1.0])]).await,
            Err(GrextorError::Cancelled)
        ));
        assert!(matches!(
            store.search(&ctx, &[1.0], 1).await,
            Err(GrextorError::Cancelled)
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(&RequestContext::background(), vec![point("x", vec![1.0])])
            .await
            .unwrap();
        store.delete("x").unwrap();
        store.delete("missing").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_cosine_similarity_cases() {
        assert!((cosine_similarity(&[1.0; 10], &[1.0; 10]) - 1.0).abs() < 1e-6);

        let mut a = vec![0.0f32; 10];
        let mut b = vec![0.0f32; 10];
        a[0] = 1.0;
        b[1] = 1.0;
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);

        assert_eq!(cosine_similarity(&[0.0; 4], &[1.0; 4]), 0.0);
        assert_eq!(cosine_similarity(&[1.0; 4], &[1.0; 5]), 0.0);
    }
}
