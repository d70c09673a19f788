//! E2E test suite entry point.

mod elastic_workflow;
mod fixture;
mod ingest_workflow;
mod lifecycle_workflow;
mod search_workflow;
