//! Shared test utilities for hybrid-search.
//!
//! Public so the integration tests under `tests/` can reuse them.

pub mod faulty;
pub mod fixtures;
pub mod logging;

pub use faulty::{Fault, FaultyStore};
pub use fixtures::{UnitTestFixture, sample_documents, test_config, test_schema};
pub use logging::{TestLogger, init_test_tracing};
