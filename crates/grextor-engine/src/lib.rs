//! Grextor engine - the ingest and search pipelines over an embedder, a
//! vector store and a graph store.

pub mod engine;
pub mod error;

pub use engine::{Engine, SearchResult, CONTENT_KEY};
pub use error::EngineError;
