//! E2E fixture: a provisioned service over a fault-injecting memory store.

use std::sync::Arc;

use hybrid_search::config::Config;
use hybrid_search::document::DocumentInput;
use hybrid_search::service::HybridSearch;
use hybrid_search::store::MemoryStore;
use hybrid_search::test_utils::{FaultyStore, TestLogger, sample_documents, test_config};

pub type TestService = HybridSearch<FaultyStore<MemoryStore>>;

pub struct E2EFixture {
    pub service: TestService,
    pub logger: TestLogger,
}

impl E2EFixture {
    /// Provisioned, empty index.
    pub async fn new(scenario_name: &str) -> Self {
        Self::with_config(scenario_name, test_config()).await
    }

    pub async fn with_config(scenario_name: &str, config: Config) -> Self {
        let logger = TestLogger::new(scenario_name);
        let store = Arc::new(FaultyStore::new(MemoryStore::new()));
        let service = HybridSearch::with_store(store, config).expect("build service");
        service.provision().await.expect("provision index");
        logger.step("index provisioned");
        Self { service, logger }
    }

    /// Provisioned index holding the sample corpus.
    pub async fn seeded(scenario_name: &str) -> Self {
        let fixture = Self::new(scenario_name).await;
        let inputs = sample_documents()
            .into_iter()
            .map(|doc| DocumentInput::new(doc.content, doc.content_vector).with_id(doc.id))
            .collect();
        let report = fixture
            .service
            .ingest("test", inputs)
            .await
            .expect("seed documents");
        assert!(!report.is_partial(), "seed rejected documents: {:?}", report.errors);
        fixture.logger.step("corpus ingested");
        fixture
    }

    pub fn store(&self) -> &FaultyStore<MemoryStore> {
        self.service.store()
    }
}
