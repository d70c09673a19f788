//! Bulk ingestion pipeline
//!
//! Validates caller documents against the catalog schema, assigns ids to
//! documents that have none, and writes the survivors in chunked bulk calls.
//! A bad document never aborts the batch; every rejection is reported under
//! its id.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::IngestConfig;
use crate::document::{Document, DocumentInput};
use crate::error::{ErrorCode, HsError, Result};
use crate::schema::{IndexSchema, SchemaCatalog};
use crate::store::{IndexStore, WriteOutcome};

/// Why a document was not written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestErrorKind {
    /// Vector length differs from the schema's `dims`.
    DimensionMismatch,
    /// Missing field or wrongly typed payload.
    Malformed,
    /// The store refused this item, or refused the bulk call carrying it.
    Rejected,
    /// The bulk call carrying this item could not reach the store.
    StoreUnavailable,
}

impl IngestErrorKind {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::DimensionMismatch => ErrorCode::DimensionMismatch,
            Self::Malformed | Self::Rejected => ErrorCode::MalformedDocument,
            Self::StoreUnavailable => ErrorCode::StoreUnavailable,
        }
    }

    fn from_error(err: &HsError) -> Self {
        match err {
            HsError::DimensionMismatch { .. } => Self::DimensionMismatch,
            e if e.is_transport() => Self::StoreUnavailable,
            _ => Self::Malformed,
        }
    }

    /// Kind recorded for every document of a bulk call that failed as a whole.
    fn from_bulk_error(err: &HsError) -> Self {
        if err.is_transport() {
            Self::StoreUnavailable
        } else {
            Self::Rejected
        }
    }
}

/// One rejected document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestError {
    pub id: String,
    pub kind: IngestErrorKind,
    pub message: String,
}

/// Outcome of one `ingest` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Documents the store confirmed.
    pub accepted: usize,
    pub errors: Vec<IngestError>,
}

impl IngestReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.accepted + self.errors.len()
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Ids rejected with `kind`.
    pub fn rejected(&self, kind: IngestErrorKind) -> impl Iterator<Item = &str> {
        self.errors
            .iter()
            .filter(move |e| e.kind == kind)
            .map(|e| e.id.as_str())
    }

    /// Turn a report with rejections into [`HsError::PartialIngestion`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_partial() {
            Err(HsError::PartialIngestion {
                rejected: self.errors.len(),
                total: self.total(),
            })
        } else {
            Ok(self)
        }
    }

    fn reject(&mut self, id: impl Into<String>, kind: IngestErrorKind, message: impl Into<String>) {
        let error = IngestError {
            id: id.into(),
            kind,
            message: message.into(),
        };
        warn!(id = %error.id, kind = ?error.kind, message = %error.message, "document rejected");
        self.errors.push(error);
    }
}

/// Writes documents into catalog indexes.
pub struct IngestPipeline<S> {
    store: Arc<S>,
    catalog: Arc<SchemaCatalog>,
    config: IngestConfig,
    request_timeout: Duration,
}

impl<S> Clone for IngestPipeline<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            catalog: Arc::clone(&self.catalog),
            config: self.config.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl<S: IndexStore> IngestPipeline<S> {
    pub const fn new(
        store: Arc<S>,
        catalog: Arc<SchemaCatalog>,
        config: IngestConfig,
        request_timeout: Duration,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
            request_timeout,
        }
    }

    /// Validate and write typed documents.
    pub async fn ingest(&self, index: &str, documents: Vec<DocumentInput>) -> Result<IngestReport> {
        let schema = self.catalog.get(index)?;
        let mut report = IngestReport::default();
        let mut valid = Vec::with_capacity(documents.len());

        for input in documents {
            let id = input.id.clone().unwrap_or_else(new_id);
            push_valid(&mut report, &mut valid, id, input, schema);
        }

        self.write(schema, valid, report).await
    }

    /// Validate and write untyped JSON payloads using the schema's field names.
    pub async fn ingest_values(&self, index: &str, documents: Vec<Value>) -> Result<IngestReport> {
        let schema = self.catalog.get(index)?;
        let mut report = IngestReport::default();
        let mut valid = Vec::with_capacity(documents.len());

        for value in &documents {
            let (id, parsed) = DocumentInput::from_value(value, schema);
            let id = id.unwrap_or_else(new_id);
            match parsed {
                Ok(input) => push_valid(&mut report, &mut valid, id, input, schema),
                Err(err) => report.reject(id, IngestErrorKind::from_error(&err), err.to_string()),
            }
        }

        self.write(schema, valid, report).await
    }

    async fn write(
        &self,
        schema: &IndexSchema,
        documents: Vec<Document>,
        mut report: IngestReport,
    ) -> Result<IngestReport> {
        let batch_size = self.config.batch_size.max(1);
        let mut submitted = 0usize;
        for chunk in documents.chunks(batch_size) {
            debug!(index = %schema.name, size = chunk.len(), "bulk write");
            let outcome = tokio::time::timeout(
                self.request_timeout,
                self.store.bulk_write(&schema.name, chunk, self.config.refresh),
            )
            .await
            .unwrap_or_else(|_| {
                Err(HsError::Timeout(format!(
                    "bulk write exceeded {}ms",
                    self.request_timeout.as_millis()
                )))
            });

            let first_chunk = submitted == 0;
            submitted += chunk.len();

            let statuses = match outcome {
                Ok(statuses) => statuses,
                // Nothing has been written yet.
                Err(err @ HsError::IndexNotFound(_)) if first_chunk => return Err(err),
                Err(err) => {
                    warn!(index = %schema.name, error = %err, size = chunk.len(), "bulk write failed");
                    let kind = IngestErrorKind::from_bulk_error(&err);
                    for doc in chunk {
                        report.reject(&doc.id, kind, err.to_string());
                    }
                    continue;
                }
            };

            for (i, doc) in chunk.iter().enumerate() {
                match statuses.get(i).map(|s| &s.outcome) {
                    Some(WriteOutcome::Created | WriteOutcome::Updated) => report.accepted += 1,
                    Some(WriteOutcome::Failed { reason }) => {
                        report.reject(&doc.id, IngestErrorKind::Rejected, reason.clone());
                    }
                    None => report.reject(
                        &doc.id,
                        IngestErrorKind::StoreUnavailable,
                        "store returned no status for this document",
                    ),
                }
            }
        }

        info!(
            index = %schema.name,
            accepted = report.accepted,
            rejected = report.errors.len(),
            "ingestion finished"
        );
        Ok(report)
    }
}

fn push_valid(
    report: &mut IngestReport,
    valid: &mut Vec<Document>,
    id: String,
    input: DocumentInput,
    schema: &IndexSchema,
) {
    match input.validate(id.clone(), schema) {
        Ok(doc) => valid.push(doc),
        Err(err) => report.reject(id, IngestErrorKind::from_error(&err), err.to_string()),
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
