//! E2E Scenario: Elasticsearch Backend
//!
//! Drives the service facade against a mocked cluster to check the wire
//! traffic of a provision, ingest and search cycle.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use hybrid_search::search::{SearchQuery, Source};
use hybrid_search::service::HybridSearch;
use hybrid_search::store::ElasticStore;
use hybrid_search::test_utils::{TestLogger, test_config};
use serde_json::json;

fn service(server: &MockServer) -> HybridSearch<ElasticStore> {
    let store = ElasticStore::new(&server.base_url(), Some("e2e-key".to_string()), Duration::from_secs(5))
        .expect("build client");
    let mut config = test_config();
    config.store.backend = "elastic".to_string();
    config.store.url = server.base_url();
    HybridSearch::with_store(Arc::new(store), config).expect("build service")
}

fn mapping() -> serde_json::Value {
    json!({
        "test": { "mappings": {
            "_meta": { "schema_version": 1 },
            "properties": {
                "content": { "type": "text" },
                "content_vector": { "type": "dense_vector", "dims": 3, "index": true, "similarity": "cosine" }
            }
        } }
    })
}

#[tokio::test]
async fn test_provision_creates_missing_index() {
    let logger = TestLogger::new("elastic_provision_creates_missing_index");
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/test/_mapping");
            then.status(404).json_body(json!({
                "error": { "type": "index_not_found_exception", "reason": "no such index [test]" },
                "status": 404
            }));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/test")
                .header("authorization", "ApiKey e2e-key")
                .body_includes("dense_vector");
            then.status(200).json_body(json!({ "acknowledged": true, "index": "test" }));
        })
        .await;

    let provisioned = service(&server).provision().await.unwrap();
    logger.log_actual(&provisioned);

    create.assert_async().await;
    assert_eq!(provisioned[0].action.as_str(), "created");
    logger.pass();
}

#[tokio::test]
async fn test_search_fuses_two_requests() {
    let logger = TestLogger::new("elastic_search_fuses_two_requests");
    let server = MockServer::start_async().await;
    let lexical = server
        .mock_async(|when, then| {
            when.method(POST).path("/test/_search").body_includes("\"match\"");
            then.status(200).json_body(json!({
                "hits": { "hits": [ { "_id": "A", "_score": 3.1 }, { "_id": "B", "_score": 2.0 } ] }
            }));
        })
        .await;
    let knn = server
        .mock_async(|when, then| {
            when.method(POST).path("/test/_search").body_includes("\"knn\"");
            then.status(200).json_body(json!({
                "hits": { "hits": [
                    { "_id": "X", "_score": 0.99 },
                    { "_id": "Y", "_score": 0.95 },
                    { "_id": "A", "_score": 0.90 }
                ] }
            }));
        })
        .await;

    let result = service(&server)
        .search("test", &SearchQuery::new("red apples", vec![0.1, 0.2, 0.3]), Some(3))
        .await
        .unwrap();
    logger.log_actual(&result);

    lexical.assert_async().await;
    knn.assert_async().await;
    assert!(!result.is_degraded());
    assert_eq!(result.ids().collect::<Vec<_>>(), vec!["A", "X", "B"]);
    assert!((result.hits[0].fused_score - (1.0 / 61.0 + 1.0 / 63.0)).abs() < 1e-12);
    logger.pass();
}

#[tokio::test]
async fn test_failing_knn_degrades_to_lexical() {
    let logger = TestLogger::new("elastic_failing_knn_degrades_to_lexical");
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/test/_search").body_includes("\"match\"");
            then.status(200).json_body(json!({
                "hits": { "hits": [ { "_id": "A", "_score": 3.1 } ] }
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/test/_search").body_includes("\"knn\"");
            then.status(503).json_body(json!({
                "error": { "type": "search_phase_execution_exception", "reason": "all shards failed" },
                "status": 503
            }));
        })
        .await;

    let result = service(&server)
        .search("test", &SearchQuery::new("red", vec![0.1, 0.2, 0.3]), Some(3))
        .await
        .unwrap();

    let degraded = result.degraded.as_ref().unwrap();
    assert_eq!(degraded.failed, Source::Vector);
    assert_eq!(result.ids().collect::<Vec<_>>(), vec!["A"]);
    logger.pass();
}

#[tokio::test]
async fn test_ingest_reports_item_failures() {
    let logger = TestLogger::new("elastic_ingest_reports_item_failures");
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/test/_mapping");
            then.status(200).json_body(mapping());
        })
        .await;
    let bulk = server
        .mock_async(|when, then| {
            when.method(POST).path("/_bulk");
            then.status(200).json_body(json!({
                "errors": true,
                "items": [
                    { "index": { "_id": "a", "status": 201, "result": "created" } },
                    { "index": { "_id": "b", "status": 429,
                        "error": { "type": "es_rejected_execution_exception", "reason": "queue full" } } }
                ]
            }));
        })
        .await;

    let report = service(&server)
        .ingest_values(
            "test",
            vec![
                json!({ "id": "a", "content": "one", "content_vector": [0.1, 0.2, 0.3] }),
                json!({ "id": "b", "content": "two", "content_vector": [0.3, 0.2, 0.1] }),
                json!({ "id": "c", "content": "three", "content_vector": [0.3, 0.2] }),
            ],
        )
        .await
        .unwrap();
    logger.log_actual(&report);

    bulk.assert_async().await;
    assert_eq!(report.accepted, 1);
    assert_eq!(report.errors.len(), 2);
    let b = report.errors.iter().find(|e| e.id == "b").unwrap();
    assert!(b.message.contains("es_rejected_execution_exception"));
    logger.pass();
}

#[tokio::test]
async fn test_health_reports_down_cluster() {
    let logger = TestLogger::new("elastic_health_reports_down_cluster");
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(401).json_body(json!({
                "error": { "type": "security_exception", "reason": "unable to authenticate" },
                "status": 401
            }));
        })
        .await;

    let health = service(&server).health_check().await;
    logger.log_actual(&health);

    assert!(!health.is_alive());
    assert!(health.error.unwrap().contains("Store unavailable"));
    logger.pass();
}
