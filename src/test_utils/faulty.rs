//! Fault-injecting store wrapper.
//!
//! Wraps any [`IndexStore`], counts calls per operation and lets a test make
//! individual operations fail or stall.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::document::Document;
use crate::error::{HsError, Result};
use crate::schema::IndexSchema;
use crate::store::{IndexStore, RankedHit, StoreInfo, WriteStatus};

/// Behaviour injected into one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fault {
    #[default]
    None,
    /// Fail with `StoreUnavailable`.
    Unavailable,
    /// Fail with a non-transport refusal, as a store does for an overloaded
    /// queue or an oversized request.
    Refused,
    /// Sleep before delegating.
    Delay(Duration),
}

#[derive(Debug, Default)]
struct Faults {
    lexical: Fault,
    vector: Fault,
    bulk: Fault,
    /// Bulk calls that pass before `bulk` applies.
    bulk_grace: usize,
    info: Fault,
}

#[derive(Debug, Default)]
struct Calls {
    schema: AtomicUsize,
    bulk: AtomicUsize,
    lexical: AtomicUsize,
    vector: AtomicUsize,
    other: AtomicUsize,
}

pub struct FaultyStore<S> {
    inner: S,
    faults: Mutex<Faults>,
    calls: Calls,
}

impl<S: IndexStore> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Mutex::new(Faults::default()),
            calls: Calls::default(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn set_lexical(&self, fault: Fault) {
        self.faults.lock().lexical = fault;
    }

    pub fn set_vector(&self, fault: Fault) {
        self.faults.lock().vector = fault;
    }

    pub fn set_bulk(&self, fault: Fault) {
        self.set_bulk_after(0, fault);
    }

    /// Let the next `calls` bulk writes through, then apply `fault`.
    pub fn set_bulk_after(&self, calls: usize, fault: Fault) {
        let mut faults = self.faults.lock();
        faults.bulk = fault;
        faults.bulk_grace = self.calls.bulk.load(Ordering::SeqCst) + calls;
    }

    pub fn set_info(&self, fault: Fault) {
        self.faults.lock().info = fault;
    }

    /// Clear every injected fault.
    pub fn heal(&self) {
        *self.faults.lock() = Faults::default();
    }

    pub fn lexical_calls(&self) -> usize {
        self.calls.lexical.load(Ordering::SeqCst)
    }

    pub fn vector_calls(&self) -> usize {
        self.calls.vector.load(Ordering::SeqCst)
    }

    pub fn bulk_calls(&self) -> usize {
        self.calls.bulk.load(Ordering::SeqCst)
    }

    /// Calls of any operation since construction.
    pub fn total_calls(&self) -> usize {
        self.calls.schema.load(Ordering::SeqCst)
            + self.bulk_calls()
            + self.lexical_calls()
            + self.vector_calls()
            + self.calls.other.load(Ordering::SeqCst)
    }
}

async fn apply(fault: Fault, operation: &str) -> Result<()> {
    match fault {
        Fault::None => Ok(()),
        Fault::Unavailable => Err(HsError::StoreUnavailable(format!(
            "injected fault in {operation}"
        ))),
        Fault::Refused => Err(HsError::InvalidQuery(format!(
            "es_rejected_execution_exception: injected refusal in {operation}"
        ))),
        Fault::Delay(delay) => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }
}

impl<S: IndexStore> IndexStore for FaultyStore<S> {
    async fn create_index(&self, name: &str, schema: &IndexSchema) -> Result<()> {
        self.calls.schema.fetch_add(1, Ordering::SeqCst);
        self.inner.create_index(name, schema).await
    }

    async fn delete_index(&self, name: &str) -> Result<bool> {
        self.calls.schema.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_index(name).await
    }

    async fn get_schema(&self, name: &str) -> Result<Option<IndexSchema>> {
        self.calls.schema.fetch_add(1, Ordering::SeqCst);
        self.inner.get_schema(name).await
    }

    async fn bulk_write(
        &self,
        name: &str,
        documents: &[Document],
        refresh: bool,
    ) -> Result<Vec<WriteStatus>> {
        let previous = self.calls.bulk.fetch_add(1, Ordering::SeqCst);
        let fault = {
            let faults = self.faults.lock();
            if previous < faults.bulk_grace { Fault::None } else { faults.bulk }
        };
        apply(fault, "bulk_write").await?;
        self.inner.bulk_write(name, documents, refresh).await
    }

    async fn get_document(&self, name: &str, id: &str) -> Result<Option<Document>> {
        self.calls.other.fetch_add(1, Ordering::SeqCst);
        self.inner.get_document(name, id).await
    }

    async fn count(&self, name: &str) -> Result<u64> {
        self.calls.other.fetch_add(1, Ordering::SeqCst);
        self.inner.count(name).await
    }

    async fn lexical_search(
        &self,
        name: &str,
        field: &str,
        text: &str,
        size: usize,
    ) -> Result<Vec<RankedHit>> {
        self.calls.lexical.fetch_add(1, Ordering::SeqCst);
        let fault = self.faults.lock().lexical;
        apply(fault, "lexical_search").await?;
        self.inner.lexical_search(name, field, text, size).await
    }

    async fn vector_search(
        &self,
        name: &str,
        field: &str,
        vector: &[f32],
        k: usize,
        num_candidates: usize,
    ) -> Result<Vec<RankedHit>> {
        self.calls.vector.fetch_add(1, Ordering::SeqCst);
        let fault = self.faults.lock().vector;
        apply(fault, "vector_search").await?;
        self.inner
            .vector_search(name, field, vector, k, num_candidates)
            .await
    }

    async fn info(&self) -> Result<StoreInfo> {
        self.calls.other.fetch_add(1, Ordering::SeqCst);
        let fault = self.faults.lock().info;
        apply(fault, "info").await?;
        self.inner.info().await
    }
}
