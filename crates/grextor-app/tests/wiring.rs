//! The binaries' wiring driven against mocked Qdrant and Neo4j servers.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use grextor_app::build_backends;
use grextor_core::config::EmbeddingProvider;
use grextor_core::{GrextorConfig, Metadata, RequestContext};
use grextor_graph::GraphStore;
use grextor_vector::VectorStore;

fn config_for(qdrant: &MockServer, neo4j: &MockServer) -> GrextorConfig {
    let mut config = GrextorConfig::default();
    config.vector.url = qdrant.uri();
    config.vector.collection = "docs".to_string();
    config.vector.dimension = 3;
    config.graph.uri = neo4j.uri();
    config.embedding.provider = EmbeddingProvider::Noop;
    config
}

#[tokio::test]
async fn test_ingest_reaches_both_backends() {
    let qdrant = MockServer::start().await;
    let neo4j = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
        .expect(1)
        .mount(&qdrant)
        .await;
    Mock::given(method("PUT"))
        .and(path("/collections/docs/points"))
        .and(body_partial_json(json!({
            "points": [{
                "vector": [0.0, 0.0, 0.0],
                "payload": {"content": "hello world", "_grextor_id": "doc-1"}
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"operation_id": 1, "status": "completed"}
        })))
        .expect(1)
        .mount(&qdrant)
        .await;

    let ok = json!({"results": [], "errors": []});
    Mock::given(method("POST"))
        .and(path("/db/neo4j/tx/commit"))
        .and(body_partial_json(json!({"statements": [{"statement": "RETURN 1"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok.clone()))
        .expect(1)
        .mount(&neo4j)
        .await;
    Mock::given(method("POST"))
        .and(path("/db/neo4j/tx/commit"))
        .and(body_partial_json(json!({
            "statements": [{"parameters": {"id": "doc-1", "props": {"content": "hello world"}}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok))
        .expect(1)
        .mount(&neo4j)
        .await;

    let backends = build_backends(&config_for(&qdrant, &neo4j)).unwrap();
    let ctx = RequestContext::background();
    backends.vectors.ensure_collection(&ctx).await.unwrap();
    backends.graph.verify_connectivity(&ctx).await.unwrap();

    let id = backends
        .engine
        .ingest_document(&ctx, Some("doc-1".into()), "hello world", Metadata::new())
        .await
        .unwrap();
    assert_eq!(id, "doc-1");
}

#[tokio::test]
async fn test_query_projects_content() {
    let qdrant = MockServer::start().await;
    let neo4j = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/collections/docs/points/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{
                "id": "5f0c3a8e-1111-4a2b-9c3d-000000000001",
                "version": 0,
                "score": 0.9,
                "payload": {"content": "stored text", "source": "cli"}
            }],
            "status": "ok",
            "time": 0.0
        })))
        .expect(1)
        .mount(&qdrant)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&neo4j)
        .await;

    let backends = build_backends(&config_for(&qdrant, &neo4j)).unwrap();
    let results = backends
        .engine
        .search(&RequestContext::background(), "anything", 5)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "5f0c3a8e-1111-4a2b-9c3d-000000000001");
    assert_eq!(results[0].content, "stored text");
}

#[tokio::test]
async fn test_unreachable_graph_is_reported_before_ingest() {
    let qdrant = MockServer::start().await;
    let mut config = GrextorConfig::default();
    config.vector.url = qdrant.uri();
    config.graph.uri = "http://127.0.0.1:1".to_string();
    config.graph.timeout_secs = 2;
    config.embedding.provider = EmbeddingProvider::Noop;

    let backends = build_backends(&config).unwrap();
    let err = backends
        .graph
        .verify_connectivity(&RequestContext::background())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        grextor_core::GrextorError::StoreUnavailable { .. }
    ));
}
