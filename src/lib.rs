//! Hybrid lexical + dense-vector document search.
//!
//! Documents carry text and a fixed-dimension embedding. A search runs a
//! full-text match and an approximate k-NN query against the same index
//! concurrently and merges the two rankings with Reciprocal Rank Fusion.
//!
//! - [`lifecycle`]: create, migrate and reset indexes
//! - [`ingest`]: validate and bulk-write documents
//! - [`search`]: concurrent sub-queries and RRF fusion
//! - [`store`]: the [`store::IndexStore`] capability and its adapters
//! - [`service`]: the facade wiring them to one store handle

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod ingest;
pub mod lifecycle;
pub mod schema;
pub mod search;
pub mod service;
pub mod store;
pub mod test_utils;

pub use error::{HsError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
