//! Service facade
//!
//! Owns the store handle and wires the lifecycle manager, the ingestion
//! pipeline and the retrieval engine to one shared catalog. The handle is
//! acquired in [`HybridSearch::connect`] and released in
//! [`HybridSearch::shutdown`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::document::{Document, DocumentInput};
use crate::error::{HsError, Result};
use crate::ingest::{IngestPipeline, IngestReport};
use crate::lifecycle::{LifecycleAction, LifecycleManager};
use crate::schema::{IndexSchema, SchemaCatalog};
use crate::search::{FusedResult, RetrievalEngine, SearchQuery};
use crate::store::{AnyStore, IndexStore, StoreInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Alive,
    Unavailable,
}

/// Result of a health probe. Probing never fails; problems are reported here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status == HealthState::Alive
    }
}

/// Provisioning outcome for one catalog index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedIndex {
    pub index: String,
    #[serde(flatten)]
    pub action: LifecycleAction,
}

pub struct HybridSearch<S = AnyStore> {
    store: Arc<S>,
    catalog: Arc<SchemaCatalog>,
    config: Config,
    lifecycle: LifecycleManager<S>,
    ingest: IngestPipeline<S>,
    engine: RetrievalEngine<S>,
}

impl HybridSearch<AnyStore> {
    /// Open the configured backend.
    pub fn connect(config: Config) -> Result<Self> {
        config.validate()?;
        let store = AnyStore::from_config(&config.store)?;
        info!(backend = store.backend(), url = %config.store.url, "store handle acquired");
        Self::with_store(Arc::new(store), config)
    }
}

impl<S: IndexStore> HybridSearch<S> {
    /// Build the facade over an existing store handle.
    pub fn with_store(store: Arc<S>, config: Config) -> Result<Self> {
        let schema = IndexSchema::from_config(&config.index)?;
        let catalog = Arc::new(SchemaCatalog::new([schema])?);

        let lifecycle = LifecycleManager::new(Arc::clone(&store));
        let ingest = IngestPipeline::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
            config.ingest.clone(),
            config.store.request_timeout(),
        );
        let engine = RetrievalEngine::new(Arc::clone(&store), Arc::clone(&catalog), config.search.clone());

        Ok(Self {
            store,
            catalog,
            config,
            lifecycle,
            ingest,
            engine,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Index used when the caller names none.
    #[must_use]
    pub fn default_index(&self) -> &str {
        &self.config.index.name
    }

    pub fn schema(&self, index: &str) -> Result<&IndexSchema> {
        self.catalog.get(index)
    }

    #[must_use]
    pub const fn lifecycle(&self) -> &LifecycleManager<S> {
        &self.lifecycle
    }

    /// Migrate every catalog index, honouring `lifecycle.reset_on_version_change`.
    pub async fn provision(&self) -> Result<Vec<ProvisionedIndex>> {
        let allow_reset = self.config.lifecycle.reset_on_version_change;
        let mut provisioned = Vec::with_capacity(self.catalog.len());
        for schema in self.catalog.iter() {
            let action = self.lifecycle.migrate(schema, allow_reset).await?;
            provisioned.push(ProvisionedIndex {
                index: schema.name.clone(),
                action,
            });
        }
        Ok(provisioned)
    }

    pub async fn ensure_index(&self, index: &str) -> Result<LifecycleAction> {
        self.lifecycle.ensure_index(self.catalog.get(index)?).await
    }

    pub async fn reset_index(&self, index: &str, confirmed: bool) -> Result<LifecycleAction> {
        self.lifecycle
            .reset_index(self.catalog.get(index)?, confirmed)
            .await
    }

    pub async fn ingest(&self, index: &str, documents: Vec<DocumentInput>) -> Result<IngestReport> {
        self.ingest.ingest(index, documents).await
    }

    pub async fn ingest_values(&self, index: &str, documents: Vec<Value>) -> Result<IngestReport> {
        self.ingest.ingest_values(index, documents).await
    }

    /// Hybrid search; `top_n` defaults to `search.default_top_n`.
    pub async fn search(&self, index: &str, query: &SearchQuery, top_n: Option<usize>) -> Result<FusedResult> {
        let top_n = top_n.unwrap_or(self.config.search.default_top_n);
        self.engine.search(index, query, top_n).await
    }

    /// Probe the store under the request deadline.
    pub async fn health_check(&self) -> HealthStatus {
        let deadline = self.config.store.request_timeout();
        let outcome = tokio::time::timeout(deadline, self.store.info())
            .await
            .unwrap_or_else(|_| {
                Err(HsError::Timeout(format!(
                    "store info exceeded {}ms",
                    deadline.as_millis()
                )))
            });

        match outcome {
            Ok(store) => HealthStatus {
                status: HealthState::Alive,
                store: Some(store),
                error: None,
            },
            Err(err) => {
                warn!(error = %err, "store unavailable");
                HealthStatus {
                    status: HealthState::Unavailable,
                    store: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    pub async fn get_document(&self, index: &str, id: &str) -> Result<Option<Document>> {
        let schema = self.catalog.get(index)?;
        self.store.get_document(&schema.name, id).await
    }

    pub async fn count(&self, index: &str) -> Result<u64> {
        let schema = self.catalog.get(index)?;
        self.store.count(&schema.name).await
    }

    /// Release the store handle.
    pub async fn shutdown(self) {
        self.store.close().await;
        info!("store handle released");
    }
}
