//! Grextor graph crate - the property graph capability with an in-memory
//! implementation and a Neo4j adapter speaking the HTTP Cypher API.

pub mod memory;
pub mod neo4j;
pub mod store;

pub use memory::InMemoryGraphStore;
pub use neo4j::Neo4jStore;
pub use store::{Edge, GraphStore, Node, DOCUMENT_LABEL};
