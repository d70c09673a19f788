//! In-process index store
//!
//! Lexical matching is delegated to a tantivy RAM index per named index; the
//! k-NN side scores every stored vector exactly, so its result is the true
//! top-k and the candidate pool only bounds the work. Used by tests and by
//! the `memory` backend.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use super::bm25::Bm25Index;
use super::{IndexStore, RankedHit, StoreInfo, WriteStatus};
use crate::document::Document;
use crate::error::{HsError, Result};
use crate::schema::IndexSchema;

struct MemoryIndex {
    schema: IndexSchema,
    docs: RwLock<BTreeMap<String, Document>>,
    lexical: Bm25Index,
}

/// Index store living entirely in process memory.
#[derive(Default)]
pub struct MemoryStore {
    indexes: RwLock<HashMap<String, Arc<MemoryIndex>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self, name: &str) -> Result<Arc<MemoryIndex>> {
        self.indexes
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| HsError::IndexNotFound(name.to_string()))
    }

    /// Names of the indexes that currently exist.
    #[must_use]
    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl IndexStore for MemoryStore {
    async fn create_index(&self, name: &str, schema: &IndexSchema) -> Result<()> {
        let mut indexes = self.indexes.write();
        if indexes.contains_key(name) {
            return Err(HsError::SchemaConflict {
                index: name.to_string(),
                reason: "index already exists".to_string(),
            });
        }
        let mut schema = schema.clone();
        schema.name = name.to_string();
        indexes.insert(
            name.to_string(),
            Arc::new(MemoryIndex {
                schema,
                docs: RwLock::new(BTreeMap::new()),
                lexical: Bm25Index::open_in_memory()?,
            }),
        );
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<bool> {
        Ok(self.indexes.write().remove(name).is_some())
    }

    async fn get_schema(&self, name: &str) -> Result<Option<IndexSchema>> {
        Ok(self
            .indexes
            .read()
            .get(name)
            .map(|index| index.schema.clone()))
    }

    async fn bulk_write(
        &self,
        name: &str,
        documents: &[Document],
        _refresh: bool,
    ) -> Result<Vec<WriteStatus>> {
        let index = self.index(name)?;
        let mut statuses = Vec::with_capacity(documents.len());
        {
            let mut docs = index.docs.write();
            for doc in documents {
                // The store enforces its own mapping independently of callers.
                if doc.content_vector.len() != index.schema.dims {
                    statuses.push(WriteStatus::failed(
                        &doc.id,
                        format!(
                            "mapper_parsing_exception: {} has {} dims, mapping expects {}",
                            index.schema.vector_field,
                            doc.content_vector.len(),
                            index.schema.dims
                        ),
                    ));
                    continue;
                }
                if let Err(err) = index.lexical.upsert(&doc.id, &doc.content) {
                    statuses.push(WriteStatus::failed(&doc.id, err.to_string()));
                    continue;
                }
                let status = if docs.insert(doc.id.clone(), doc.clone()).is_some() {
                    WriteStatus::updated(&doc.id)
                } else {
                    WriteStatus::created(&doc.id)
                };
                statuses.push(status);
            }
        }
        // Writes are visible once committed, so refresh is implied.
        index.lexical.commit()?;
        Ok(statuses)
    }

    async fn get_document(&self, name: &str, id: &str) -> Result<Option<Document>> {
        let index = self.index(name)?;
        let doc = index.docs.read().get(id).cloned();
        Ok(doc)
    }

    async fn count(&self, name: &str) -> Result<u64> {
        let index = self.index(name)?;
        let count = index.docs.read().len() as u64;
        Ok(count)
    }

    async fn lexical_search(
        &self,
        name: &str,
        field: &str,
        text: &str,
        size: usize,
    ) -> Result<Vec<RankedHit>> {
        let index = self.index(name)?;
        // Unmapped fields match nothing.
        if field != index.schema.text_field {
            return Ok(Vec::new());
        }
        Ok(RankedHit::from_ordered(index.lexical.search(text, size)?))
    }

    async fn vector_search(
        &self,
        name: &str,
        field: &str,
        vector: &[f32],
        k: usize,
        num_candidates: usize,
    ) -> Result<Vec<RankedHit>> {
        let index = self.index(name)?;
        if field != index.schema.vector_field {
            return Err(HsError::InvalidQuery(format!(
                "field {field} is not a dense_vector field of {name}"
            )));
        }
        index.schema.check_dims(vector)?;
        if num_candidates < k {
            return Err(HsError::InvalidQuery(format!(
                "num_candidates ({num_candidates}) must be at least k ({k})"
            )));
        }

        let similarity = index.schema.similarity;
        let mut scored: Vec<(String, f32)> = index
            .docs
            .read()
            .values()
            .map(|doc| (doc.id.clone(), similarity.score(vector, &doc.content_vector)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(RankedHit::from_ordered(scored))
    }

    async fn info(&self) -> Result<StoreInfo> {
        Ok(StoreInfo {
            name: "memory".to_string(),
            cluster_name: None,
            version: crate::VERSION.to_string(),
        })
    }
}
