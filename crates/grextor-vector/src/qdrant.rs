//! Qdrant vector store over the REST API.
//!
//! Qdrant only accepts UUIDs and unsigned integers as point ids. Document ids
//! in either form are sent unchanged. Any other id is written under a UUIDv5
//! derived from it, and the original id travels in the payload under
//! [`ORIGINAL_ID_KEY`] so reads report the caller's id. Callers may not set
//! that key themselves.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use grextor_core::config::VectorConfig;
use grextor_core::error::{GrextorError, Result};
use grextor_core::RequestContext;

use crate::codec::{decode_payload, encode_payload, Payload, PayloadValue};
use crate::store::{Point, ScoredPoint, VectorStore};

const BACKEND: &str = "qdrant";

/// Payload key carrying ids that are not valid Qdrant point ids.
pub const ORIGINAL_ID_KEY: &str = "_grextor_id";

const ID_NAMESPACE: Uuid = Uuid::from_u128(0x8f3c_51d2_6a0e_4b7d_9c21_3e5f_a4b8_c6d7);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

impl PointId {
    /// Map a document id to a Qdrant point id. The flag is true when the id
    /// had to be derived and the original must be kept in the payload.
    pub fn for_document(id: &str) -> (PointId, bool) {
        if let Ok(uuid) = Uuid::parse_str(id) {
            if uuid.hyphenated().to_string() == id {
                return (PointId::Uuid(id.to_string()), false);
            }
        }
        if let Ok(n) = id.parse::<u64>() {
            if n.to_string() == id {
                return (PointId::Num(n), false);
            }
        }
        let derived = Uuid::new_v5(&ID_NAMESPACE, id.as_bytes());
        (PointId::Uuid(derived.hyphenated().to_string()), true)
    }

    fn render(&self) -> String {
        match self {
            PointId::Num(n) => n.to_string(),
            PointId::Uuid(u) => u.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Debug, Serialize)]
struct UpsertPoints {
    points: Vec<PointStruct>,
}

#[derive(Debug, Serialize)]
struct PointStruct {
    id: PointId,
    vector: Vec<f32>,
    payload: Payload,
}

#[derive(Debug, Serialize)]
struct SearchPoints<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: PointId,
    score: f32,
    #[serde(default)]
    payload: Option<Payload>,
}

/// Qdrant-backed [`VectorStore`]. The inner HTTP client pools connections
/// and is safe to share across tasks.
#[derive(Debug, Clone)]
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    dimension: usize,
    api_key: Option<String>,
}

impl QdrantStore {
    pub fn new(config: &VectorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GrextorError::unavailable(BACKEND, format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            dimension: config.dimension,
            api_key: config.api_key.clone(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, self.collection, suffix)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn collection_exists(&self) -> Result<bool> {
        let response = self
            .request(reqwest::Method::GET, self.url(""))
            .send()
            .await
            .map_err(|e| GrextorError::unavailable(BACKEND, e))?;

        match response.status() {
            s if s.is_success() => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            s => Err(GrextorError::unavailable(
                BACKEND,
                format!("collection lookup returned {}", s),
            )),
        }
    }

    async fn create_collection(&self) -> Result<()> {
        let body = CreateCollection {
            vectors: VectorParams {
                size: self.dimension,
                distance: "Cosine",
            },
        };
        let response = self
            .request(reqwest::Method::PUT, self.url(""))
            .json(&body)
            .send()
            .await
            .map_err(|e| GrextorError::unavailable(BACKEND, e))?;

        let status = response.status();
        // 409: another writer created it between our lookup and this call.
        if status.is_success() || status == reqwest::StatusCode::CONFLICT {
            info!(collection = %self.collection, dimension = self.dimension, "Collection ready");
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(GrextorError::write(
            BACKEND,
            format!("failed to create collection ({}): {}", status, text),
        ))
    }

    async fn put_points(&self, points: Vec<Point>) -> Result<()> {
        let body = UpsertPoints {
            points: points.into_iter().map(to_point_struct).collect(),
        };

        let response = self
            .request(reqwest::Method::PUT, self.url("/points?wait=true"))
            .json(&body)
            .send()
            .await
            .map_err(|e| GrextorError::write(BACKEND, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GrextorError::write(
                BACKEND,
                format!("upsert returned {}: {}", status, text),
            ));
        }
        Ok(())
    }

    async fn search_points(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        let body = SearchPoints {
            vector,
            limit,
            with_payload: true,
        };

        let response = self
            .request(reqwest::Method::POST, self.url("/points/search"))
            .json(&body)
            .send()
            .await
            .map_err(|e| GrextorError::read(BACKEND, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GrextorError::read(
                BACKEND,
                format!("search returned {}: {}", status, text),
            ));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| GrextorError::read(BACKEND, format!("decoding response: {}", e)))?;

        Ok(parsed.result.into_iter().map(from_search_hit).collect())
    }
}

fn to_point_struct(point: Point) -> PointStruct {
    let (id, derived) = PointId::for_document(&point.id);
    let mut payload = encode_payload(&point.metadata);
    if derived {
        payload.insert(ORIGINAL_ID_KEY.to_string(), PayloadValue::String(point.id));
    }
    PointStruct {
        id,
        vector: point.vector,
        payload,
    }
}

fn from_search_hit(hit: SearchHit) -> ScoredPoint {
    let mut payload = hit.payload.unwrap_or_default();
    // Only an id that maps back onto this point is the caller's id.
    let original = match payload.get(ORIGINAL_ID_KEY) {
        Some(PayloadValue::String(original)) if PointId::for_document(original).0 == hit.id => {
            Some(original.clone())
        }
        _ => None,
    };
    let id = match original {
        Some(original) => {
            payload.remove(ORIGINAL_ID_KEY);
            original
        }
        None => hit.id.render(),
    };
    ScoredPoint {
        id,
        score: hit.score,
        metadata: decode_payload(payload),
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, ctx: &RequestContext) -> Result<()> {
        ctx.run(async {
            if self.collection_exists().await? {
                debug!(collection = %self.collection, "Collection already exists");
                return Ok(());
            }
            self.create_collection().await
        })
        .await
    }

    async fn upsert(&self, ctx: &RequestContext, points: Vec<Point>) -> Result<()> {
        if points.is_empty() {
            return ctx.check();
        }
        if let Some(point) = points
            .iter()
            .find(|p| p.metadata.contains_key(ORIGINAL_ID_KEY))
        {
            return Err(GrextorError::write(
                BACKEND,
                format!(
                    "point {} uses reserved metadata key {}",
                    point.id, ORIGINAL_ID_KEY
                ),
            ));
        }
        debug!(count = points.len(), collection = %self.collection, "Upserting points");
        ctx.run(self.put_points(points)).await
    }

    async fn search(
        &self,
        ctx: &RequestContext,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        if limit == 0 {
            ctx.check()?;
            return Ok(Vec::new());
        }
        debug!(limit, collection = %self.collection, "Searching points");
        ctx.run(self.search_points(vector, limit)).await
    }
}
