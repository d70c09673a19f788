//! Store selected at runtime from `store.backend`.

use super::{ElasticStore, IndexStore, MemoryStore, RankedHit, StoreInfo, WriteStatus};
use crate::config::StoreConfig;
use crate::document::Document;
use crate::error::{HsError, Result};
use crate::schema::IndexSchema;

pub enum AnyStore {
    Elastic(ElasticStore),
    Memory(MemoryStore),
}

impl AnyStore {
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        match config.backend.as_str() {
            "elastic" => Ok(Self::Elastic(ElasticStore::from_config(config)?)),
            "memory" => Ok(Self::Memory(MemoryStore::new())),
            other => Err(HsError::Config(format!(
                "unknown store backend {other} (expected elastic|memory)"
            ))),
        }
    }

    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Elastic(_) => "elastic",
            Self::Memory(_) => "memory",
        }
    }
}

impl IndexStore for AnyStore {
    async fn create_index(&self, name: &str, schema: &IndexSchema) -> Result<()> {
        match self {
            Self::Elastic(s) => s.create_index(name, schema).await,
            Self::Memory(s) => s.create_index(name, schema).await,
        }
    }

    async fn delete_index(&self, name: &str) -> Result<bool> {
        match self {
            Self::Elastic(s) => s.delete_index(name).await,
            Self::Memory(s) => s.delete_index(name).await,
        }
    }

    async fn get_schema(&self, name: &str) -> Result<Option<IndexSchema>> {
        match self {
            Self::Elastic(s) => s.get_schema(name).await,
            Self::Memory(s) => s.get_schema(name).await,
        }
    }

    async fn bulk_write(
        &self,
        name: &str,
        documents: &[Document],
        refresh: bool,
    ) -> Result<Vec<WriteStatus>> {
        match self {
            Self::Elastic(s) => s.bulk_write(name, documents, refresh).await,
            Self::Memory(s) => s.bulk_write(name, documents, refresh).await,
        }
    }

    async fn get_document(&self, name: &str, id: &str) -> Result<Option<Document>> {
        match self {
            Self::Elastic(s) => s.get_document(name, id).await,
            Self::Memory(s) => s.get_document(name, id).await,
        }
    }

    async fn count(&self, name: &str) -> Result<u64> {
        match self {
            Self::Elastic(s) => s.count(name).await,
            Self::Memory(s) => s.count(name).await,
        }
    }

    async fn lexical_search(
        &self,
        name: &str,
        field: &str,
        text: &str,
        size: usize,
    ) -> Result<Vec<RankedHit>> {
        match self {
            Self::Elastic(s) => s.lexical_search(name, field, text, size).await,
            Self::Memory(s) => s.lexical_search(name, field, text, size).await,
        }
    }

    async fn vector_search(
        &self,
        name: &str,
        field: &str,
        vector: &[f32],
        k: usize,
        num_candidates: usize,
    ) -> Result<Vec<RankedHit>> {
        match self {
            Self::Elastic(s) => s.vector_search(name, field, vector, k, num_candidates).await,
            Self::Memory(s) => s.vector_search(name, field, vector, k, num_candidates).await,
        }
    }

    async fn info(&self) -> Result<StoreInfo> {
        match self {
            Self::Elastic(s) => s.info().await,
            Self::Memory(s) => s.info().await,
        }
    }

    async fn close(&self) {
        match self {
            Self::Elastic(s) => s.close().await,
            Self::Memory(s) => s.close().await,
        }
    }
}
