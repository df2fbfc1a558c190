//! Process wiring shared by the `grextor-ingest` and `grextor-query`
//! binaries: logging setup, embedder selection and backend construction.

pub mod cli;

use std::sync::Arc;

use tracing::{info, warn};

use grextor_core::config::{EmbeddingConfig, EmbeddingProvider};
use grextor_core::error::Result;
use grextor_core::{GrextorConfig, RequestContext};
use grextor_engine::{Engine, SearchResult};
use grextor_graph::{GraphStore, Neo4jStore};
use grextor_vector::{DynEmbeddingService, NoopEmbedding, OpenAiEmbedding, QdrantStore, VectorStore};

/// Install the global tracing subscriber. `RUST_LOG` wins over
/// `default_level`.
pub fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// A request context cancelled when the process receives Ctrl-C.
pub fn ctrl_c_context() -> RequestContext {
    let ctx = RequestContext::background();
    let handle = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling request");
            handle.cancel();
        }
    });
    ctx
}

/// Construct the embedder selected by `config`, producing vectors of
/// `dimension` length.
pub fn build_embedder(
    config: &EmbeddingConfig,
    dimension: usize,
) -> Result<Arc<dyn DynEmbeddingService>> {
    match config.resolved_provider() {
        EmbeddingProvider::OpenAi => Ok(Arc::new(OpenAiEmbedding::new(config, dimension)?)),
        EmbeddingProvider::Noop | EmbeddingProvider::Auto => {
            info!(dimension, "No embedding API key, using zero vectors");
            Ok(Arc::new(NoopEmbedding::new(dimension)))
        }
    }
}

/// Live backends plus an engine wired to them.
pub struct Backends {
    pub vectors: Arc<QdrantStore>,
    pub graph: Arc<Neo4jStore>,
    pub engine: Engine,
}

pub fn build_backends(config: &GrextorConfig) -> Result<Backends> {
    let embedder = build_embedder(&config.embedding, config.vector.dimension)?;
    let vectors = Arc::new(QdrantStore::new(&config.vector)?);
    let graph = Arc::new(Neo4jStore::new(&config.graph)?);

    info!(
        qdrant = %config.vector.url,
        collection = %config.vector.collection,
        neo4j = %config.graph.uri,
        "Backends configured"
    );

    let engine = Engine::new_dyn(
        embedder,
        vectors.clone() as Arc<dyn VectorStore>,
        graph.clone() as Arc<dyn GraphStore>,
    );
    Ok(Backends {
        vectors,
        graph,
        engine,
    })
}

/// Human-readable listing of search results.
pub fn render_results(query: &str, results: &[SearchResult]) -> String {
    let mut out = format!("Found {} results for '{}':\n", results.len(), query);
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "{}. [Score: {:.4}] {}\n   Content: {}\n",
            i + 1,
            result.score,
            result.id,
            result.content
        ));
    }
    out
}
