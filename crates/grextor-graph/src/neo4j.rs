//! Neo4j graph store over the HTTP transactional Cypher endpoint.
//!
//! Each operation is a single auto-committed statement posted to
//! `{uri}/db/{database}/tx/commit`. Labels and relationship types cannot be
//! bound as parameters, so they are spliced into the statement as quoted
//! identifiers.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use grextor_core::config::GraphConfig;
use grextor_core::error::{GrextorError, Result};
use grextor_core::{Metadata, MetadataValue, RequestContext};

use crate::store::{Edge, GraphStore, Node};

const BACKEND: &str = "neo4j";

#[derive(Debug, Serialize)]
struct TxRequest<'a> {
    statements: [Statement<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: Value,
}

#[derive(Debug, Default, Deserialize)]
struct TxResponse {
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

/// Which failure variant a statement reports on error.
#[derive(Debug, Clone, Copy)]
enum Access {
    Write,
    Probe,
}

impl Access {
    fn error(self, reason: impl ToString) -> GrextorError {
        match self {
            Access::Write => GrextorError::write(BACKEND, reason),
            Access::Probe => GrextorError::unavailable(BACKEND, reason),
        }
    }
}

/// Neo4j-backed [`GraphStore`]. The inner HTTP client pools connections and
/// is safe to share across tasks.
#[derive(Debug, Clone)]
pub struct Neo4jStore {
    client: reqwest::Client,
    commit_url: String,
    username: String,
    password: String,
}

impl Neo4jStore {
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GrextorError::unavailable(BACKEND, format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            commit_url: format!(
                "{}/db/{}/tx/commit",
                config.uri.trim_end_matches('/'),
                config.database
            ),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    async fn execute(&self, access: Access, statement: &str, parameters: Value) -> Result<()> {
        debug!(statement, "Running Cypher statement");

        let response = self
            .client
            .post(&self.commit_url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&TxRequest {
                statements: [Statement {
                    statement,
                    parameters,
                }],
            })
            .send()
            .await
            .map_err(|e| match access {
                Access::Write if e.is_connect() => GrextorError::unavailable(BACKEND, e),
                _ => access.error(e),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(GrextorError::unavailable(
                BACKEND,
                format!("authentication rejected ({})", status),
            ));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(access.error(format!("server returned {}: {}", status, text)));
        }

        let body: TxResponse = response
            .json()
            .await
            .map_err(|e| access.error(format!("decoding response: {}", e)))?;

        if let Some(err) = body.errors.first() {
            return Err(access.error(format!("{}: {}", err.code, err.message)));
        }
        Ok(())
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn add_node(&self, ctx: &RequestContext, node: Node) -> Result<()> {
        let statement = format!(
            "MERGE (n:{} {{id: $id}}) SET n += $props",
            quote_identifier(&node.label)?
        );
        let parameters = serde_json::json!({
            "id": node.id,
            "props": properties_json(&node.properties),
        });
        ctx.run(self.execute(Access::Write, &statement, parameters))
            .await
            .map_err(|e| annotate(e, "failed to add node"))
    }

    async fn add_edge(&self, ctx: &RequestContext, edge: Edge) -> Result<()> {
        let statement = format!(
            "MATCH (a {{id: $from}}) MATCH (b {{id: $to}}) MERGE (a)-[r:{}]->(b) SET r += $props",
            quote_identifier(&edge.edge_type)?
        );
        let parameters = serde_json::json!({
            "from": edge.from_id,
            "to": edge.to_id,
            "props": properties_json(&edge.properties),
        });
        ctx.run(self.execute(Access::Write, &statement, parameters))
            .await
            .map_err(|e| annotate(e, "failed to add edge"))
    }

    async fn verify_connectivity(&self, ctx: &RequestContext) -> Result<()> {
        ctx.run(self.execute(Access::Probe, "RETURN 1", Value::Object(Map::new())))
            .await
    }
}

fn annotate(err: GrextorError, what: &str) -> GrextorError {
    match err {
        GrextorError::StoreWrite { backend, reason } => GrextorError::StoreWrite {
            backend,
            reason: format!("{}: {}", what, reason),
        },
        other => other,
    }
}

/// Backtick-quote a label or relationship type for splicing into Cypher.
pub fn quote_identifier(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(GrextorError::write(
            BACKEND,
            "label or relationship type must not be empty",
        ));
    }
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// Property map as Cypher parameters. Non-finite floats have no JSON form
/// and are sent as their text rendering.
pub fn properties_json(properties: &Metadata) -> Value {
    let map: Map<String, Value> = properties
        .iter()
        .map(|(k, v)| {
            let value = match v {
                MetadataValue::Text(s) => Value::String(s.clone()),
                MetadataValue::Integer(i) => Value::from(*i),
                MetadataValue::Float(f) => serde_json::Number::from_f64(*f)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(f.to_string())),
                MetadataValue::Bool(b) => Value::Bool(*b),
            };
            (k.clone(), value)
        })
        .collect();
    Value::Object(map)
}
