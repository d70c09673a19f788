//! Index store capability interface
//!
//! The core never talks to a search engine directly. Everything it needs
//! (index provisioning, bulk writes, point lookups, lexical and k-NN
//! queries) goes through [`IndexStore`], and a handle to one implementation
//! is injected at startup.
//!
//! ```text
//!   LifecycleManager ──┐
//!   IngestPipeline ────┼──► Arc<S: IndexStore> ──► ElasticStore (REST)
//!   RetrievalEngine ───┘                      └──► MemoryStore (tantivy + exact k-NN)
//! ```

pub mod any;
mod bm25;
pub mod elastic;
pub mod memory;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Result;
use crate::schema::IndexSchema;

pub use any::AnyStore;
pub use elastic::ElasticStore;
pub use memory::MemoryStore;

/// One entry of a sub-query's ordered result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub document_id: String,
    /// 1-based position within the sub-query result
    pub rank: usize,
    pub score: f32,
}

impl RankedHit {
    /// Number an ordered `(id, score)` list from rank 1.
    pub fn from_ordered(hits: impl IntoIterator<Item = (String, f32)>) -> Vec<Self> {
        hits.into_iter()
            .enumerate()
            .map(|(i, (document_id, score))| Self {
                document_id,
                rank: i + 1,
                score,
            })
            .collect()
    }
}

/// Outcome of one item of a bulk write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteStatus {
    pub id: String,
    #[serde(flatten)]
    pub outcome: WriteOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum WriteOutcome {
    Created,
    Updated,
    Failed { reason: String },
}

impl WriteStatus {
    pub fn created(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            outcome: WriteOutcome::Created,
        }
    }

    pub fn updated(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            outcome: WriteOutcome::Updated,
        }
    }

    pub fn failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            outcome: WriteOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self.outcome, WriteOutcome::Failed { .. })
    }
}

/// Liveness and version reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    pub version: String,
}

/// Capability handle over the underlying search engine.
///
/// Methods return `Send` futures so the retrieval engine can drive the
/// lexical and vector sub-queries concurrently from any runtime thread.
/// Implementations own their deadlines for transport I/O; callers add their
/// own per-call deadline on top.
pub trait IndexStore: Send + Sync {
    /// Create an empty index with the given mapping.
    fn create_index(&self, name: &str, schema: &IndexSchema) -> impl Future<Output = Result<()>> + Send;

    /// Delete an index. Returns `false` if it did not exist.
    fn delete_index(&self, name: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Read back the mapping of an existing index.
    fn get_schema(&self, name: &str) -> impl Future<Output = Result<Option<IndexSchema>>> + Send;

    /// Write documents; each item succeeds or fails on its own.
    ///
    /// Returns one status per input document, in input order. An `Err`
    /// means the call as a whole failed and no item outcome is known.
    fn bulk_write(
        &self,
        name: &str,
        documents: &[Document],
        refresh: bool,
    ) -> impl Future<Output = Result<Vec<WriteStatus>>> + Send;

    fn get_document(&self, name: &str, id: &str) -> impl Future<Output = Result<Option<Document>>> + Send;

    fn count(&self, name: &str) -> impl Future<Output = Result<u64>> + Send;

    /// Full-text match on `field`, best first.
    fn lexical_search(
        &self,
        name: &str,
        field: &str,
        text: &str,
        size: usize,
    ) -> impl Future<Output = Result<Vec<RankedHit>>> + Send;

    /// Approximate k-NN on `field`, best first, at most `k` hits.
    fn vector_search(
        &self,
        name: &str,
        field: &str,
        vector: &[f32],
        k: usize,
        num_candidates: usize,
    ) -> impl Future<Output = Result<Vec<RankedHit>>> + Send;

    fn info(&self) -> impl Future<Output = Result<StoreInfo>> + Send;

    /// Release connections. The handle must not be used afterwards.
    fn close(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}
