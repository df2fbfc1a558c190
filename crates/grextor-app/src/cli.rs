//! Command-line arguments for the `grextor-ingest` and `grextor-query`
//! binaries.
//!
//! Priority resolution: CLI flags > environment variables > config file >
//! defaults. Required inputs are checked here, before any backend exists.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser};

use grextor_core::error::{GrextorError, Result};
use grextor_core::{metadata_from_json, GrextorConfig, Metadata, MetadataValue};

/// Backend connection flags shared by both binaries.
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", env = "GREXTOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Qdrant REST URL.
    #[arg(long = "qdrant-url")]
    pub qdrant_url: Option<String>,

    /// Neo4j HTTP URI.
    #[arg(long = "neo4j-uri")]
    pub neo4j_uri: Option<String>,

    #[arg(long = "neo4j-user")]
    pub neo4j_user: Option<String>,

    #[arg(long = "neo4j-pass")]
    pub neo4j_pass: Option<String>,

    /// Qdrant collection name.
    #[arg(long = "collection")]
    pub collection: Option<String>,

    /// Vector dimension of the collection and the embedder.
    #[arg(long = "dimension")]
    pub dimension: Option<usize>,
}

impl BackendArgs {
    /// Build the effective configuration.
    ///
    /// An explicit `--config` must load; the default path falls back to
    /// built-in defaults when missing.
    pub fn load_config(&self) -> Result<GrextorConfig> {
        let mut config = match &self.config {
            Some(path) => GrextorConfig::load(path)?,
            None => GrextorConfig::load_or_default(&default_config_path()),
        };
        config.apply_env();
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overlay flags that were given onto `config`.
    pub fn apply_to(&self, config: &mut GrextorConfig) {
        if let Some(url) = &self.qdrant_url {
            config.vector.url = url.clone();
        }
        if let Some(uri) = &self.neo4j_uri {
            config.graph.uri = uri.clone();
        }
        if let Some(user) = &self.neo4j_user {
            config.graph.username = user.clone();
        }
        if let Some(pass) = &self.neo4j_pass {
            config.graph.password = pass.clone();
        }
        if let Some(collection) = &self.collection {
            config.vector.collection = collection.clone();
        }
        if let Some(dimension) = self.dimension {
            config.vector.dimension = dimension;
        }
    }
}

/// Ingest one document into the vector store and the graph.
#[derive(Parser, Debug)]
#[command(name = "grextor-ingest", version, about)]
pub struct IngestArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Document text.
    #[arg(long = "content", conflicts_with = "file")]
    pub content: Option<String>,

    /// Read the document text from a file.
    #[arg(long = "file")]
    pub file: Option<PathBuf>,

    /// Document id. A UUID is generated when omitted.
    #[arg(long = "id")]
    pub id: Option<String>,

    /// Extra metadata as a JSON object.
    #[arg(long = "metadata")]
    pub metadata: Option<String>,
}

impl IngestArgs {
    /// The document text from `--content` or `--file`.
    pub fn read_content(&self) -> Result<String> {
        let content = match (&self.content, &self.file) {
            (Some(content), _) => content.clone(),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                GrextorError::Configuration(format!("cannot read {}: {}", path.display(), e))
            })?,
            (None, None) => String::new(),
        };
        if content.trim().is_empty() {
            return Err(GrextorError::Configuration(
                "no content to ingest: pass --content or --file".to_string(),
            ));
        }
        Ok(content)
    }

    /// Caller metadata with `source` and `time` filled in where the caller
    /// did not set them.
    pub fn build_metadata(&self, now: DateTime<Utc>) -> Result<Metadata> {
        let mut metadata = match &self.metadata {
            None => Metadata::new(),
            Some(raw) => match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(serde_json::Value::Object(map)) => metadata_from_json(map),
                Ok(_) => {
                    return Err(GrextorError::Configuration(
                        "--metadata must be a JSON object".to_string(),
                    ))
                }
                Err(e) => {
                    return Err(GrextorError::Configuration(format!(
                        "--metadata is not valid JSON: {}",
                        e
                    )))
                }
            },
        };
        metadata
            .entry("source".to_string())
            .or_insert_with(|| MetadataValue::from("cli"));
        metadata
            .entry("time".to_string())
            .or_insert_with(|| MetadataValue::from(now.to_rfc3339()));
        Ok(metadata)
    }
}

/// Search ingested documents by similarity.
#[derive(Parser, Debug)]
#[command(name = "grextor-query", version, about)]
pub struct QueryArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Query text.
    #[arg(short = 'q', long = "query")]
    pub query: Option<String>,

    /// Maximum number of results.
    #[arg(long = "limit", default_value_t = 5)]
    pub limit: usize,

    /// Print results as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

impl QueryArgs {
    pub fn query_text(&self) -> Result<&str> {
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => Ok(q),
            _ => Err(GrextorError::Configuration(
                "no query given: pass -q/--query".to_string(),
            )),
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".grextor").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".grextor").join("config.toml");
    }
    PathBuf::from("grextor.toml")
}
