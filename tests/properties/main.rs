//! Property-based tests over the public API.

mod fusion_properties;
mod ingest_properties;
