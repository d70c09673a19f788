//! E2E Scenario: Bulk Ingestion Workflow
//!
//! Covers partial failure, id assignment, re-ingestion and raw JSON payloads.

use hybrid_search::HsError;
use hybrid_search::document::DocumentInput;
use hybrid_search::ingest::IngestErrorKind;
use hybrid_search::search::SearchQuery;
use hybrid_search::test_utils::{Fault, test_config};
use serde_json::json;

use super::fixture::E2EFixture;

#[tokio::test]
async fn test_bad_vector_does_not_sink_the_batch() {
    let fixture = E2EFixture::new("bad_vector_does_not_sink_the_batch").await;

    let inputs = vec![
        DocumentInput::new("red apple", vec![0.9, 0.1, 0.0]).with_id("a"),
        DocumentInput::new("broken", vec![0.1, 0.2]).with_id("b"),
        DocumentInput::new("red cherry", vec![0.1, 0.9, 0.1]).with_id("c"),
    ];
    fixture.logger.log_input("documents", &inputs);
    let report = fixture.service.ingest("test", inputs).await.unwrap();
    fixture.logger.log_actual(&report);

    assert_eq!(report.accepted, 2);
    assert_eq!(report.total(), 3);
    assert_eq!(report.rejected(IngestErrorKind::DimensionMismatch).collect::<Vec<_>>(), vec!["b"]);
    assert!(matches!(
        report.clone().into_result(),
        Err(HsError::PartialIngestion { rejected: 1, total: 3 })
    ));

    fixture.logger.step("accepted documents are searchable");
    assert_eq!(fixture.service.count("test").await.unwrap(), 2);
    assert!(fixture.service.get_document("test", "b").await.unwrap().is_none());
    let result = fixture
        .service
        .search("test", &SearchQuery::text("red"), Some(5))
        .await
        .unwrap();
    let mut ids: Vec<&str> = result.ids().collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["a", "c"]);
    fixture.logger.pass();
}

#[tokio::test]
async fn test_reingesting_same_ids_overwrites() {
    let fixture = E2EFixture::seeded("reingesting_same_ids_overwrites").await;

    let report = fixture
        .service
        .ingest(
            "test",
            vec![DocumentInput::new("green apple", vec![0.9, 0.1, 0.0]).with_id("apple")],
        )
        .await
        .unwrap();
    assert_eq!(report.accepted, 1);

    assert_eq!(fixture.service.count("test").await.unwrap(), 5);
    let apple = fixture.service.get_document("test", "apple").await.unwrap().unwrap();
    assert_eq!(apple.content, "green apple");
    fixture.logger.pass();
}

#[tokio::test]
async fn test_missing_ids_are_generated() {
    let fixture = E2EFixture::new("missing_ids_are_generated").await;

    let report = fixture
        .service
        .ingest_values(
            "test",
            vec![
                json!({ "content": "no id here", "content_vector": [0.1, 0.2, 0.3] }),
                json!({ "content": "nor here", "content_vector": [0.3, 0.2, 0.1] }),
            ],
        )
        .await
        .unwrap();

    assert_eq!(report.accepted, 2);
    assert_eq!(fixture.service.count("test").await.unwrap(), 2);
    fixture.logger.pass();
}

#[tokio::test]
async fn test_malformed_values_are_reported_per_document() {
    let fixture = E2EFixture::new("malformed_values_are_reported_per_document").await;

    let report = fixture
        .service
        .ingest_values(
            "test",
            vec![
                json!({ "id": "ok", "content": "fine", "content_vector": [0.1, 0.2, 0.3] }),
                json!({ "id": "no-vector", "content": "missing" }),
                json!({ "id": "strings", "content": "typed", "content_vector": ["a", "b", "c"] }),
                json!("not an object"),
            ],
        )
        .await
        .unwrap();
    fixture.logger.log_actual(&report);

    assert_eq!(report.accepted, 1);
    assert_eq!(report.errors.len(), 3);
    let malformed: Vec<&str> = report.rejected(IngestErrorKind::Malformed).collect();
    assert!(malformed.contains(&"no-vector"));
    assert!(malformed.contains(&"strings"));
    fixture.logger.pass();
}

#[tokio::test]
async fn test_store_outage_rejects_chunk_without_erroring() {
    let fixture = E2EFixture::new("store_outage_rejects_chunk_without_erroring").await;
    fixture.store().set_bulk(Fault::Unavailable);

    let report = fixture
        .service
        .ingest(
            "test",
            vec![
                DocumentInput::new("one", vec![0.1, 0.2, 0.3]).with_id("1"),
                DocumentInput::new("two", vec![0.3, 0.2, 0.1]).with_id("2"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(report.accepted, 0);
    assert_eq!(report.rejected(IngestErrorKind::StoreUnavailable).count(), 2);

    fixture.store().heal();
    assert_eq!(fixture.service.count("test").await.unwrap(), 0);
    fixture.logger.pass();
}

#[tokio::test]
async fn test_refused_second_chunk_still_returns_report() {
    let mut config = test_config();
    config.ingest.batch_size = 2;
    let fixture = E2EFixture::with_config("refused_second_chunk_still_returns_report", config).await;
    fixture.store().set_bulk_after(1, Fault::Refused);

    let report = fixture
        .service
        .ingest(
            "test",
            vec![
                DocumentInput::new("one", vec![0.1, 0.2, 0.3]).with_id("1"),
                DocumentInput::new("bad", vec![0.1]).with_id("bad"),
                DocumentInput::new("two", vec![0.3, 0.2, 0.1]).with_id("2"),
                DocumentInput::new("three", vec![0.2, 0.2, 0.2]).with_id("3"),
                DocumentInput::new("four", vec![0.0, 0.2, 0.4]).with_id("4"),
            ],
        )
        .await
        .unwrap();
    fixture.logger.step("ingested with second chunk refused");

    assert_eq!(report.accepted, 2);
    assert_eq!(report.rejected(IngestErrorKind::DimensionMismatch).collect::<Vec<_>>(), vec!["bad"]);
    assert_eq!(report.rejected(IngestErrorKind::Rejected).collect::<Vec<_>>(), vec!["3", "4"]);
    assert!(matches!(
        report.into_result(),
        Err(HsError::PartialIngestion { rejected: 3, total: 5 })
    ));

    fixture.store().heal();
    assert_eq!(fixture.service.count("test").await.unwrap(), 2);
    fixture.logger.pass();
}

#[tokio::test]
async fn test_unknown_index_is_refused() {
    let fixture = E2EFixture::new("unknown_index_is_refused").await;
    let before = fixture.store().total_calls();

    let err = fixture
        .service
        .ingest("elsewhere", vec![DocumentInput::new("x", vec![0.1, 0.2, 0.3])])
        .await
        .unwrap_err();

    assert!(matches!(err, HsError::IndexNotFound(name) if name == "elsewhere"));
    assert_eq!(fixture.store().total_calls(), before);
    fixture.logger.pass();
}
