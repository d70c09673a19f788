//! Hybrid retrieval engine
//!
//! Runs the lexical and vector sub-queries concurrently, each under its own
//! deadline, and fuses whatever comes back. Losing one sub-query degrades
//! the result; losing both fails the search.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::fusion::{FusedHit, RrfConfig, Source, fuse};
use crate::config::SearchConfig;
use crate::error::{ErrorCode, HsError, Result};
use crate::schema::{IndexSchema, SchemaCatalog};
use crate::store::{IndexStore, RankedHit};

/// Upper bound on `top_n` and on the per-source windows sent to the store.
/// Elasticsearch rejects `size`, `k` or `num_candidates` above this value.
pub const MAX_WINDOW: usize = 10_000;

/// A hybrid query. Either part may be empty, not both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query_string: String,
    #[serde(default)]
    pub query_vector: Vec<f32>,
}

impl SearchQuery {
    pub fn new(query_string: impl Into<String>, query_vector: Vec<f32>) -> Self {
        Self {
            query_string: query_string.into(),
            query_vector,
        }
    }

    /// Lexical-only query.
    pub fn text(query_string: impl Into<String>) -> Self {
        Self::new(query_string, Vec::new())
    }

    /// Vector-only query.
    #[must_use]
    pub fn vector(query_vector: Vec<f32>) -> Self {
        Self::new(String::new(), query_vector)
    }
}

/// Marks a result fused from one source because the other failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedFusion {
    pub failed: Source,
    pub reason: String,
}

impl DegradedFusion {
    /// Code reported alongside a degraded result in structured output.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::DegradedFusion
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub hits: Vec<FusedHit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<DegradedFusion>,
}

impl FusedResult {
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.hits.iter().map(|h| h.document_id.as_str())
    }
}

/// Outcome of one leg; `None` when it was not dispatched.
type Leg = Option<Result<Vec<RankedHit>>>;

/// Hybrid lexical + k-NN search over catalog indexes.
pub struct RetrievalEngine<S> {
    store: Arc<S>,
    catalog: Arc<SchemaCatalog>,
    config: SearchConfig,
}

impl<S> Clone for RetrievalEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            catalog: Arc::clone(&self.catalog),
            config: self.config.clone(),
        }
    }
}

impl<S: IndexStore> RetrievalEngine<S> {
    pub const fn new(store: Arc<S>, catalog: Arc<SchemaCatalog>, config: SearchConfig) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search `index` and return at most `top_n` fused hits, with `top_n`
    /// capped at [`MAX_WINDOW`].
    pub async fn search(&self, index: &str, query: &SearchQuery, top_n: usize) -> Result<FusedResult> {
        let top_n = top_n.min(MAX_WINDOW);
        let schema = self.catalog.get(index)?;
        let text = query.query_string.trim();
        let vector = query.query_vector.as_slice();

        if text.is_empty() && vector.is_empty() {
            return Err(HsError::InvalidQuery(
                "query needs text, a vector, or both".to_string(),
            ));
        }
        if !vector.is_empty() {
            schema.check_dims(vector)?;
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(HsError::InvalidQuery(
                    "query vector contains a non-finite value".to_string(),
                ));
            }
        }
        if top_n == 0 {
            return Ok(FusedResult::default());
        }

        let (lexical, vector) = tokio::join!(
            self.lexical_leg(schema, text, top_n),
            self.vector_leg(schema, vector, top_n),
        );

        let rrf = RrfConfig::with_rank_constant(self.config.rank_constant);
        let (lexical, vector, degraded) = match (lexical, vector) {
            (Some(Err(lexical)), Some(Err(vector))) => {
                return Err(HsError::RetrievalFailure {
                    lexical: lexical.to_string(),
                    vector: vector.to_string(),
                });
            }
            (Some(Err(lexical)), None) => {
                return Err(HsError::RetrievalFailure {
                    lexical: lexical.to_string(),
                    vector: "not requested".to_string(),
                });
            }
            (None, Some(Err(vector))) => {
                return Err(HsError::RetrievalFailure {
                    lexical: "not requested".to_string(),
                    vector: vector.to_string(),
                });
            }
            (Some(Err(err)), Some(Ok(hits))) => (Vec::new(), hits, Some(degrade(Source::Lexical, &err))),
            (Some(Ok(hits)), Some(Err(err))) => (hits, Vec::new(), Some(degrade(Source::Vector, &err))),
            (lexical, vector) => (
                lexical.and_then(Result::ok).unwrap_or_default(),
                vector.and_then(Result::ok).unwrap_or_default(),
                None,
            ),
        };

        let hits = fuse(
            &[
                (Source::Lexical, lexical.as_slice()),
                (Source::Vector, vector.as_slice()),
            ],
            &rrf,
            top_n,
        );
        debug!(index, hits = hits.len(), degraded = degraded.is_some(), "fused");
        Ok(FusedResult { hits, degraded })
    }

    async fn lexical_leg(&self, schema: &IndexSchema, text: &str, top_n: usize) -> Leg {
        if text.is_empty() {
            return None;
        }
        let size = self.lexical_size(top_n);
        Some(
            self.bounded(
                Source::Lexical,
                self.store
                    .lexical_search(&schema.name, &schema.text_field, text, size),
            )
            .await,
        )
    }

    async fn vector_leg(&self, schema: &IndexSchema, vector: &[f32], top_n: usize) -> Leg {
        if vector.is_empty() {
            return None;
        }
        let (k, num_candidates) = self.knn_sizes(top_n);
        Some(
            self.bounded(
                Source::Vector,
                self.store
                    .vector_search(&schema.name, &schema.vector_field, vector, k, num_candidates),
            )
            .await,
        )
    }

    fn lexical_size(&self, top_n: usize) -> usize {
        self.config.rank_window.max(top_n).min(MAX_WINDOW)
    }

    /// `(k, num_candidates)` for the k-NN leg; the candidate pool is always
    /// larger than `k` unless both sit at the cap.
    fn knn_sizes(&self, top_n: usize) -> (usize, usize) {
        let k = self.config.knn_k.max(top_n).min(MAX_WINDOW);
        let num_candidates = self
            .config
            .num_candidates
            .max(k.saturating_add(1))
            .min(MAX_WINDOW);
        (k, num_candidates)
    }

    /// Apply the sub-query deadline; a timeout counts as a failure.
    async fn bounded<F>(&self, source: Source, request: F) -> Result<Vec<RankedHit>>
    where
        F: Future<Output = Result<Vec<RankedHit>>>,
    {
        let deadline = self.config.subquery_timeout();
        let started = Instant::now();
        let outcome = tokio::time::timeout(deadline, request)
            .await
            .unwrap_or_else(|_| Err(timeout_error(source, deadline)));

        match &outcome {
            Ok(hits) => debug!(%source, hits = hits.len(), elapsed = ?started.elapsed(), "sub-query done"),
            Err(err) => debug!(%source, error = %err, elapsed = ?started.elapsed(), "sub-query failed"),
        }
        outcome
    }
}

fn timeout_error(source: Source, deadline: Duration) -> HsError {
    HsError::Timeout(format!(
        "{source} sub-query exceeded {}ms",
        deadline.as_millis()
    ))
}

fn degrade(failed: Source, err: &HsError) -> DegradedFusion {
    warn!(%failed, error = %err, "fusing from one source");
    DegradedFusion {
        failed,
        reason: err.to_string(),
    }
}
