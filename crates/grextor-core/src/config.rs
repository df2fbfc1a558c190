use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GrextorError, Result};

/// Top-level configuration for Grextor.
///
/// Loaded from a TOML file, then overlaid with environment variables and
/// finally command-line flags by the binaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrextorConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub vector: VectorConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl GrextorConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GrextorConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.embedding.api_key = Some(key);
        }
        if let Some(url) = get("QDRANT_URL") {
            self.vector.url = url;
        }
        if let Some(key) = get("QDRANT_API_KEY") {
            self.vector.api_key = Some(key);
        }
        if let Some(uri) = get("NEO4J_URI") {
            self.graph.uri = uri;
        }
        if let Some(user) = get("NEO4J_USER") {
            self.graph.username = user;
        }
        if let Some(pass) = get("NEO4J_PASSWORD") {
            self.graph.password = pass;
        }
    }

    /// Reject configurations no backend could be built from.
    pub fn validate(&self) -> Result<()> {
        if self.vector.url.trim().is_empty() {
            return Err(GrextorError::Configuration(
                "vector.url must not be empty".to_string(),
            ));
        }
        if self.vector.collection.trim().is_empty() {
            return Err(GrextorError::Configuration(
                "vector.collection must not be empty".to_string(),
            ));
        }
        if self.vector.dimension == 0 {
            return Err(GrextorError::Configuration(
                "vector.dimension must be greater than zero".to_string(),
            ));
        }
        if self.graph.uri.trim().is_empty() {
            return Err(GrextorError::Configuration(
                "graph.uri must not be empty".to_string(),
            ));
        }
        for (section, timeout) in [
            ("vector", self.vector.timeout_secs),
            ("graph", self.graph.timeout_secs),
            ("embedding", self.embedding.timeout_secs),
        ] {
            if timeout == 0 {
                return Err(GrextorError::Configuration(format!(
                    "{}.timeout_secs must be greater than zero",
                    section
                )));
            }
        }
        if self.embedding.provider == EmbeddingProvider::OpenAi
            && self.embedding.api_key.as_deref().unwrap_or("").is_empty()
        {
            return Err(GrextorError::Configuration(
                "embedding.provider = \"openai\" requires an API key".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Vector backend (Qdrant REST) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    pub url: String,
    pub collection: String,
    /// Embedding dimension the collection is created with.
    pub dimension: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            collection: "grextor_docs".to_string(),
            dimension: 1536,
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Graph backend (Neo4j HTTP) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "http://localhost:7474".to_string(),
            username: "neo4j".to_string(),
            password: "grextor123".to_string(),
            database: "neo4j".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Which embedding backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI when an API key is available, zero vectors otherwise.
    #[default]
    Auto,
    #[serde(rename = "openai")]
    OpenAi,
    Noop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Auto,
            api_key: None,
            model: "text-embedding-ada-002".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    /// Resolve `Auto` against the presence of an API key.
    pub fn resolved_provider(&self) -> EmbeddingProvider {
        match self.provider {
            EmbeddingProvider::Auto => {
                if self.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
                    EmbeddingProvider::OpenAi
                } else {
                    EmbeddingProvider::Noop
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn create_temp_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = GrextorConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.vector.url, "http://localhost:6333");
        assert_eq!(config.vector.collection, "grextor_docs");
        assert_eq!(config.vector.dimension, 1536);
        assert!(config.vector.api_key.is_none());
        assert_eq!(config.graph.uri, "http://localhost:7474");
        assert_eq!(config.graph.username, "neo4j");
        assert_eq!(config.graph.database, "neo4j");
        assert_eq!(config.embedding.provider, EmbeddingProvider::Auto);
        assert_eq!(config.embedding.model, "text-embedding-ada-002");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_partial_toml() {
        let file = create_temp_config(
            r#"
[vector]
collection = "notes"
dimension = 384

[embedding]
provider = "noop"
"#,
        );
        let config = GrextorConfig::load(file.path()).unwrap();
        assert_eq!(config.vector.collection, "notes");
        assert_eq!(config.vector.dimension, 384);
        assert_eq!(config.vector.url, "http://localhost:6333");
        assert_eq!(config.embedding.provider, EmbeddingProvider::Noop);
        assert_eq!(config.graph.password, "grextor123");
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = GrextorConfig::load(file.path());
        assert!(matches!(result, Err(GrextorError::Configuration(_))));
    }

    #[test]
    fn test_config_load_or_default_missing_file() {
        let config = GrextorConfig::load_or_default(Path::new("/nonexistent/grextor.toml"));
        assert_eq!(config.vector.collection, "grextor_docs");
    }

    #[test]
    fn test_config_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("grextor.toml");

        let mut config = GrextorConfig::default();
        config.vector.collection = "saved".to_string();
        config.embedding.provider = EmbeddingProvider::OpenAi;
        config.save(&path).unwrap();

        let reloaded = GrextorConfig::load(&path).unwrap();
        assert_eq!(reloaded.vector.collection, "saved");
        assert_eq!(reloaded.embedding.provider, EmbeddingProvider::OpenAi);
    }

    #[test]
    fn test_apply_env_from() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("QDRANT_URL", "http://qdrant:6333"),
            ("NEO4J_URI", "http://neo4j:7474"),
            ("NEO4J_PASSWORD", ""),
        ]
        .into_iter()
        .collect();

        let mut config = GrextorConfig::default();
        config.apply_env_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.embedding.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.vector.url, "http://qdrant:6333");
        assert_eq!(config.graph.uri, "http://neo4j:7474");
        // Empty values leave the default in place.
        assert_eq!(config.graph.password, "grextor123");
    }

    #[test]
    fn test_resolved_provider() {
        let mut embedding = EmbeddingConfig::default();
        assert_eq!(embedding.resolved_provider(), EmbeddingProvider::Noop);

        embedding.api_key = Some("sk-test".to_string());
        assert_eq!(embedding.resolved_provider(), EmbeddingProvider::OpenAi);

        embedding.provider = EmbeddingProvider::Noop;
        assert_eq!(embedding.resolved_provider(), EmbeddingProvider::Noop);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GrextorConfig::default();
        config.vector.dimension = 0;
        assert!(matches!(
            config.validate(),
            Err(GrextorError::Configuration(_))
        ));

        let mut config = GrextorConfig::default();
        config.vector.collection = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = GrextorConfig::default();
        config.embedding.provider = EmbeddingProvider::OpenAi;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let zeroed: [fn(&mut GrextorConfig); 3] = [
            |c| c.vector.timeout_secs = 0,
            |c| c.graph.timeout_secs = 0,
            |c| c.embedding.timeout_secs = 0,
        ];
        for (zero, section) in zeroed.iter().zip(["vector", "graph", "embedding"]) {
            let mut config = GrextorConfig::default();
            zero(&mut config);
            match config.validate() {
                Err(GrextorError::Configuration(msg)) => {
                    assert_eq!(msg, format!("{}.timeout_secs must be greater than zero", section))
                }
                other => panic!("expected Configuration error, got {:?}", other),
            }
        }
    }
}
