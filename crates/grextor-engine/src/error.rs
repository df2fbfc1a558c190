//! Step-tagged pipeline errors.

use grextor_core::GrextorError;

/// Which pipeline step failed, wrapping the backend error that caused it.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to embed document: {0}")]
    Embed(#[source] GrextorError),

    #[error("failed to write point: {0}")]
    VectorWrite(#[source] GrextorError),

    /// The point for `id` was written but its graph node was not.
    #[error("failed to write node for {id} (point already stored): {source}")]
    GraphWrite {
        id: String,
        #[source]
        source: GrextorError,
    },

    #[error("failed to embed query: {0}")]
    QueryEmbed(#[source] GrextorError),

    #[error("vector search failed: {0}")]
    VectorSearch(#[source] GrextorError),
}

impl EngineError {
    pub fn inner(&self) -> &GrextorError {
        match self {
            EngineError::Embed(e)
            | EngineError::VectorWrite(e)
            | EngineError::QueryEmbed(e)
            | EngineError::VectorSearch(e) => e,
            EngineError::GraphWrite { source, .. } => source,
        }
    }

    /// True when the step was aborted by cancellation or an expired deadline
    /// rather than a backend failure.
    pub fn is_cancelled(&self) -> bool {
        self.inner().is_cancellation()
    }

    /// The id left with a point but no node, if this is a graph write failure.
    pub fn divergent_id(&self) -> Option<&str> {
        match self {
            EngineError::GraphWrite { id, .. } => Some(id),
            _ => None,
        }
    }
}

impl From<EngineError> for GrextorError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Embed(e)
            | EngineError::VectorWrite(e)
            | EngineError::QueryEmbed(e)
            | EngineError::VectorSearch(e) => e,
            EngineError::GraphWrite { source, .. } => source,
        }
    }
}
