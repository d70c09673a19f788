//! RRF (Reciprocal Rank Fusion)
//!
//! Merges the ranked lists of the lexical and vector sub-queries. Only ranks
//! matter; raw scores from different retrievers are not comparable and are
//! carried along for explanation only.
//!
//! ## Algorithm
//!
//! RRF score for document d:
//! ```text
//! RRF(d) = Σ 1 / (k + rank_i(d))
//! ```
//!
//! Where:
//! - k is the rank constant (default 60)
//! - rank_i(d) is the 1-indexed position of d in list i
//!
//! A list that does not contain d contributes nothing.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::RankedHit;

/// Reciprocal Rank Fusion configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RrfConfig {
    /// Smoothing constant; higher values flatten rank differences
    pub rank_constant: f64,
}

impl Default for RrfConfig {
    fn default() -> Self {
        Self {
            rank_constant: 60.0,
        }
    }
}

impl RrfConfig {
    #[must_use]
    pub const fn with_rank_constant(rank_constant: f64) -> Self {
        Self { rank_constant }
    }

    /// Contribution of one list position.
    #[must_use]
    pub fn contribution(&self, rank: usize) -> f64 {
        1.0 / (self.rank_constant + rank as f64)
    }
}

/// Sub-query that produced a ranked list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Lexical,
    Vector,
}

impl Source {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lexical => "lexical",
            Self::Vector => "vector",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a fused hit was found in one sub-query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub source: Source,
    pub rank: usize,
    /// The retriever's own score
    pub score: f32,
}

/// A single fused result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedHit {
    pub document_id: String,
    pub fused_score: f64,
    /// One entry per list the document appeared in, in list order
    pub contributions: Vec<Contribution>,
}

impl FusedHit {
    /// Rank of this document in `source`, if it appeared there.
    #[must_use]
    pub fn rank_in(&self, source: Source) -> Option<usize> {
        self.contributions
            .iter()
            .find(|c| c.source == source)
            .map(|c| c.rank)
    }
}

/// Fuse ranked lists with Reciprocal Rank Fusion.
///
/// Each list must be ordered best first; a document's rank is its 1-based
/// position. A document listed twice in one list keeps its best position.
/// The output is ordered by fused score (descending), ties broken by
/// `document_id` ascending, and holds at most `top_n` hits.
pub fn fuse(lists: &[(Source, &[RankedHit])], config: &RrfConfig, top_n: usize) -> Vec<FusedHit> {
    if top_n == 0 {
        return Vec::new();
    }

    let mut fused: HashMap<&str, FusedHit> = HashMap::new();

    for (source, hits) in lists {
        for (position, hit) in hits.iter().enumerate() {
            let rank = position + 1;
            let entry = fused
                .entry(hit.document_id.as_str())
                .or_insert_with(|| FusedHit {
                    document_id: hit.document_id.clone(),
                    fused_score: 0.0,
                    contributions: Vec::new(),
                });
            // Later duplicates in the same list sit at worse positions.
            if entry.contributions.iter().any(|c| c.source == *source) {
                continue;
            }
            entry.fused_score += config.contribution(rank);
            entry.contributions.push(Contribution {
                source: *source,
                rank,
                score: hit.score,
            });
        }
    }

    let mut results: Vec<FusedHit> = fused.into_values().collect();
    results.sort_by(|a, b| {
        b.fused_score
            .total_cmp(&a.fused_score)
            .then_with(|| a.document_id.cmp(&b.document_id))
    });
    results.truncate(top_n);
    results
}
