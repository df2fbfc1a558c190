//! Grextor vector crate - embedding services, the vector store capability,
//! the Qdrant adapter and its payload codec.
//!
//! Provides an embedding service trait with OpenAI, zero-vector and mock
//! implementations, an in-memory cosine-similarity store for tests and local
//! runs, and a Qdrant REST store for production.

pub mod codec;
pub mod embedding;
pub mod memory;
pub mod qdrant;
pub mod store;

pub use embedding::{
    DynEmbeddingService, EmbeddingService, MockEmbedding, NoopEmbedding, OpenAiEmbedding,
};
pub use memory::InMemoryVectorStore;
pub use qdrant::QdrantStore;
pub use store::{Point, ScoredPoint, VectorStore};
