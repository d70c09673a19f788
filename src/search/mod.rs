//! Hybrid retrieval
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │              SearchQuery { query_string, query_vector }        │
//! └────────────────────────────────────────────────────────────────┘
//!                     │                          │
//!                     ▼                          ▼
//! ┌──────────────────────────────┐  ┌──────────────────────────────┐
//! │   lexical_search (match)     │  │   vector_search (k-NN)       │
//! │   deadline: subquery_timeout │  │   deadline: subquery_timeout │
//! └──────────────────────────────┘  └──────────────────────────────┘
//!                     │      tokio::join!        │
//!                     └──────────┬───────────────┘
//!                                ▼
//!                ┌───────────────────────────────┐
//!                │   RRF Fusion (fusion.rs)      │
//!                └───────────────────────────────┘
//!                                │
//!                                ▼
//!              FusedResult { hits, degraded }
//! ```

pub mod engine;
pub mod fusion;

pub use engine::{DegradedFusion, FusedResult, MAX_WINDOW, RetrievalEngine, SearchQuery};
pub use fusion::{Contribution, FusedHit, RrfConfig, Source, fuse};
