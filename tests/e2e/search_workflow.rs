//! E2E Scenario: Hybrid Search Workflow
//!
//! Covers fused ranking, single-source queries, degraded fusion and total
//! outage through the service facade.

use std::time::Duration;

use hybrid_search::HsError;
use hybrid_search::search::{SearchQuery, Source};
use hybrid_search::store::IndexStore;
use hybrid_search::document::DocumentInput;
use hybrid_search::test_utils::{Fault, test_config};

use super::fixture::E2EFixture;

#[tokio::test]
async fn test_hybrid_search_fuses_both_rankings() {
    let fixture = E2EFixture::seeded("hybrid_search_fuses_both_rankings").await;

    let query = SearchQuery::new("red", vec![0.9, 0.1, 0.0]);
    fixture.logger.log_input("query", &query);
    let result = fixture.service.search("test", &query, Some(3)).await.unwrap();
    fixture.logger.log_actual(&result);

    assert!(!result.is_degraded());
    assert_eq!(result.hits.len(), 3);
    // apple: lexical 2 + vector 1; cherry: lexical 1 + vector 3
    assert_eq!(result.hits[0].document_id, "apple");
    assert_eq!(result.hits[1].document_id, "cherry");
    assert!(result.hits[0].fused_score > result.hits[1].fused_score);
    fixture.logger.pass();
}

#[tokio::test]
async fn test_default_top_n_comes_from_config() {
    let fixture = E2EFixture::seeded("default_top_n_comes_from_config").await;
    let result = fixture
        .service
        .search("test", &SearchQuery::new("fruit", vec![0.7, 0.7, 0.0]), None)
        .await
        .unwrap();
    assert_eq!(result.hits.len(), 2);
    fixture.logger.pass();
}

#[tokio::test]
async fn test_vector_only_matches_vector_order() {
    let fixture = E2EFixture::seeded("vector_only_matches_vector_order").await;
    let vector = vec![0.0, 0.1, 0.9];

    let fused = fixture
        .service
        .search("test", &SearchQuery::vector(vector.clone()), Some(5))
        .await
        .unwrap();
    let raw = fixture
        .store()
        .inner()
        .vector_search("test", "content_vector", &vector, 5, 10)
        .await
        .unwrap();
    let raw_ids: Vec<&str> = raw.iter().map(|h| h.document_id.as_str()).collect();

    assert_eq!(fused.ids().collect::<Vec<_>>(), raw_ids);
    assert!(fused.hits.iter().all(|h| h.rank_in(Source::Lexical).is_none()));
    fixture.logger.pass();
}

#[tokio::test]
async fn test_lexical_outage_still_returns_results() {
    let fixture = E2EFixture::seeded("lexical_outage_still_returns_results").await;
    fixture.store().set_lexical(Fault::Unavailable);

    let result = fixture
        .service
        .search("test", &SearchQuery::new("red", vec![0.9, 0.1, 0.0]), Some(2))
        .await
        .unwrap();
    fixture.logger.log_actual(&result);

    assert_eq!(result.degraded.as_ref().unwrap().failed, Source::Lexical);
    assert_eq!(result.hits[0].document_id, "apple");
    fixture.logger.pass();
}

#[tokio::test]
async fn test_vector_timeout_degrades() {
    let mut config = test_config();
    config.search.subquery_timeout_ms = 40;
    let fixture = E2EFixture::with_config("vector_timeout_degrades", config).await;
    fixture
        .service
        .ingest(
            "test",
            vec![DocumentInput::new("red", vec![1.0, 0.0, 0.0]).with_id("r")],
        )
        .await
        .unwrap();
    fixture.store().set_vector(Fault::Delay(Duration::from_millis(400)));

    let result = fixture
        .service
        .search("test", &SearchQuery::new("red", vec![1.0, 0.0, 0.0]), Some(2))
        .await
        .unwrap();
    let degraded = result.degraded.unwrap();
    assert_eq!(degraded.failed, Source::Vector);
    assert_eq!(result.hits[0].document_id, "r");
    fixture.logger.pass();
}

#[tokio::test]
async fn test_total_outage_leaks_no_results() {
    let fixture = E2EFixture::seeded("total_outage_leaks_no_results").await;
    fixture.store().set_lexical(Fault::Unavailable);
    fixture.store().set_vector(Fault::Unavailable);

    let err = fixture
        .service
        .search("test", &SearchQuery::new("red", vec![0.9, 0.1, 0.0]), Some(2))
        .await
        .unwrap_err();
    fixture.logger.log_actual(&err);

    match err {
        HsError::RetrievalFailure { lexical, vector } => {
            assert!(lexical.contains("lexical_search"));
            assert!(vector.contains("vector_search"));
        }
        other => panic!("expected RetrievalFailure, got {other:?}"),
    }

    fixture.store().heal();
    assert!(
        fixture
            .service
            .search("test", &SearchQuery::text("red"), Some(2))
            .await
            .is_ok()
    );
    fixture.logger.pass();
}

#[tokio::test]
async fn test_dimension_guard_makes_no_store_call() {
    let fixture = E2EFixture::seeded("dimension_guard_makes_no_store_call").await;
    let before = fixture.store().total_calls();

    let err = fixture
        .service
        .search("test", &SearchQuery::new("red", vec![0.1, 0.2, 0.3, 0.4]), Some(2))
        .await
        .unwrap_err();

    assert!(matches!(err, HsError::DimensionMismatch { expected: 3, actual: 4, .. }));
    assert_eq!(fixture.store().total_calls(), before);
    fixture.logger.pass();
}
