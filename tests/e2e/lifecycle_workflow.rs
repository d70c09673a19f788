//! E2E Scenario: Index Lifecycle Workflow
//!
//! Two service instances share one store, standing in for a process restart
//! with a changed schema.

use std::sync::Arc;

use hybrid_search::HsError;
use hybrid_search::config::Config;
use hybrid_search::document::DocumentInput;
use hybrid_search::lifecycle::LifecycleAction;
use hybrid_search::service::HybridSearch;
use hybrid_search::store::MemoryStore;
use hybrid_search::test_utils::{TestLogger, test_config};

fn restart(store: &Arc<MemoryStore>, config: Config) -> HybridSearch<MemoryStore> {
    HybridSearch::with_store(Arc::clone(store), config).unwrap()
}

async fn seed(service: &HybridSearch<MemoryStore>) {
    service.provision().await.unwrap();
    service
        .ingest(
            "test",
            vec![
                DocumentInput::new("alpha", vec![1.0, 0.0, 0.0]).with_id("a"),
                DocumentInput::new("beta", vec![0.0, 1.0, 0.0]).with_id("b"),
            ],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_restart_with_same_schema_keeps_data() {
    let logger = TestLogger::new("restart_with_same_schema_keeps_data");
    let store = Arc::new(MemoryStore::new());
    seed(&restart(&store, test_config())).await;

    logger.step("restart");
    let service = restart(&store, test_config());
    let provisioned = service.provision().await.unwrap();
    logger.log_actual(&provisioned);

    assert_eq!(provisioned[0].action, LifecycleAction::Unchanged);
    assert_eq!(service.count("test").await.unwrap(), 2);
    logger.pass();
}

#[tokio::test]
async fn test_version_bump_is_refused_without_opt_in() {
    let logger = TestLogger::new("version_bump_is_refused_without_opt_in");
    let store = Arc::new(MemoryStore::new());
    seed(&restart(&store, test_config())).await;

    let mut bumped = test_config();
    bumped.index.version += 1;
    let service = restart(&store, bumped);
    let err = service.provision().await.unwrap_err();
    logger.log_actual(&err);

    assert!(matches!(err, HsError::SchemaConflict { ref reason, .. } if reason.contains("version")));
    assert_eq!(service.count("test").await.unwrap(), 2);
    logger.pass();
}

#[tokio::test]
async fn test_version_bump_recreates_when_allowed() {
    let logger = TestLogger::new("version_bump_recreates_when_allowed");
    let store = Arc::new(MemoryStore::new());
    seed(&restart(&store, test_config())).await;

    let mut bumped = test_config();
    let old_version = bumped.index.version;
    bumped.index.version += 1;
    bumped.lifecycle.reset_on_version_change = true;
    let service = restart(&store, bumped);
    let provisioned = service.provision().await.unwrap();

    assert_eq!(
        provisioned[0].action,
        LifecycleAction::Recreated {
            previous_version: Some(old_version)
        }
    );
    assert_eq!(service.count("test").await.unwrap(), 0);

    logger.step("second provision is a no-op");
    let again = service.provision().await.unwrap();
    assert_eq!(again[0].action, LifecycleAction::Unchanged);
    logger.pass();
}

#[tokio::test]
async fn test_dims_change_conflicts_on_ensure() {
    let logger = TestLogger::new("dims_change_conflicts_on_ensure");
    let store = Arc::new(MemoryStore::new());
    seed(&restart(&store, test_config())).await;

    let mut wider = test_config();
    wider.index.dims = 4;
    let service = restart(&store, wider);
    assert!(matches!(
        service.ensure_index("test").await,
        Err(HsError::SchemaConflict { .. })
    ));
    logger.pass();
}

#[tokio::test]
async fn test_reset_requires_confirmation_then_empties_index() {
    let logger = TestLogger::new("reset_requires_confirmation_then_empties_index");
    let store = Arc::new(MemoryStore::new());
    let service = restart(&store, test_config());
    seed(&service).await;

    let blocked = service.reset_index("test", false).await.unwrap_err();
    assert!(matches!(blocked, HsError::DestructiveBlocked(_)));
    assert_eq!(service.count("test").await.unwrap(), 2);

    let action = service.reset_index("test", true).await.unwrap();
    assert!(matches!(action, LifecycleAction::Recreated { .. }));
    assert_eq!(service.count("test").await.unwrap(), 0);
    logger.pass();
}
