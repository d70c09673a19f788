//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Schema and lifecycle errors
//! - 2xx: Document validation and ingestion errors
//! - 3xx: Config errors
//! - 4xx: Search errors
//! - 5xx: Index store errors
//! - 6xx: Local I/O and serialization errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for machine output.
///
/// Each variant maps to a numeric code (e.g., `SchemaConflict` -> E102).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Schema errors (1xx)
    // ========================================
    /// E101: Index is not declared in the schema catalog
    IndexNotFound,
    /// E102: Existing index mapping is incompatible with the requested schema
    SchemaConflict,
    /// E103: Destructive lifecycle operation was not confirmed
    DestructiveBlocked,

    // ========================================
    // Validation errors (2xx)
    // ========================================
    /// E201: Vector length does not match the schema's dims
    DimensionMismatch,
    /// E202: Document payload is missing fields or has the wrong shape
    MalformedDocument,
    /// E203: Some documents of a batch were rejected
    PartialIngestionFailure,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E301: Config file has invalid syntax or values
    ConfigInvalid,
    /// E302: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Search errors (4xx)
    // ========================================
    /// E401: Query is empty or otherwise unusable
    SearchQueryInvalid,
    /// E402: One sub-query failed; results come from the surviving source
    DegradedFusion,
    /// E403: Both sub-queries failed
    RetrievalFailure,

    // ========================================
    // Store errors (5xx)
    // ========================================
    /// E501: Index store is unreachable or returned a transport fault
    StoreUnavailable,
    /// E502: Index store call exceeded its deadline
    StoreTimeout,

    // ========================================
    // Local errors (6xx)
    // ========================================
    /// E601: File operation failed
    IoError,
    /// E602: Serialization/deserialization failed
    SerializationError,
    /// E603: Embedded full-text index failed
    SearchIndexError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `SchemaConflict` -> 102).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::IndexNotFound => 101,
            Self::SchemaConflict => 102,
            Self::DestructiveBlocked => 103,

            Self::DimensionMismatch => 201,
            Self::MalformedDocument => 202,
            Self::PartialIngestionFailure => 203,

            Self::ConfigInvalid => 301,
            Self::ConfigMissingRequired => 302,

            Self::SearchQueryInvalid => 401,
            Self::DegradedFusion => 402,
            Self::RetrievalFailure => 403,

            Self::StoreUnavailable => 501,
            Self::StoreTimeout => 502,

            Self::IoError => 601,
            Self::SerializationError => 602,
            Self::SearchIndexError => 603,
        }
    }

    /// Get the error code as a formatted string (e.g., "E102").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::IndexNotFound => "Declare the index in the [index] config section, then run `hsearch ensure`",
            Self::SchemaConflict => "Bump index.version and run `hsearch migrate --allow-reset`, or `hsearch reset --yes` to rebuild the index",
            Self::DestructiveBlocked => "Pass --yes to confirm that the index and all its documents should be deleted",

            Self::DimensionMismatch => "Make the vector length equal to index.dims",
            Self::MalformedDocument => "Each document needs a string `content` and a numeric array `content_vector`",
            Self::PartialIngestionFailure => "Inspect the per-document errors and re-submit the rejected documents",

            Self::ConfigInvalid => "Check TOML syntax and values in the config file and HS_* environment variables",
            Self::ConfigMissingRequired => "Set the missing value in the config file or via its HS_* environment variable",

            Self::SearchQueryInvalid => "Provide a query string, a query vector, or both",
            Self::DegradedFusion => "One retrieval source failed; check store health with `hsearch health`",
            Self::RetrievalFailure => "Both retrieval sources failed. Check store health with `hsearch health`",

            Self::StoreUnavailable => "Check store.url and credentials, and that the store is running",
            Self::StoreTimeout => "The store is slow or unreachable. Increase store.request_timeout_ms or search.subquery_timeout_ms",

            Self::IoError => "File operation failed. Check path exists and permissions are correct",
            Self::SerializationError => "The data format may be corrupted. Check input data for validity",
            Self::SearchIndexError => "The in-memory full-text index failed. Retry the operation",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::IndexNotFound
            | Self::SchemaConflict
            | Self::DestructiveBlocked
            | Self::DimensionMismatch
            | Self::MalformedDocument
            | Self::PartialIngestionFailure
            | Self::ConfigInvalid
            | Self::ConfigMissingRequired
            | Self::SearchQueryInvalid
            | Self::DegradedFusion
            | Self::RetrievalFailure
            | Self::StoreUnavailable
            | Self::StoreTimeout
            | Self::IoError => true,

            Self::SerializationError | Self::SearchIndexError => false,
        }
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "schema",
            2 => "validation",
            3 => "config",
            4 => "search",
            5 => "store",
            6 => "local",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::IndexNotFound,
            Self::SchemaConflict,
            Self::DestructiveBlocked,
            Self::DimensionMismatch,
            Self::MalformedDocument,
            Self::PartialIngestionFailure,
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::SearchQueryInvalid,
            Self::DegradedFusion,
            Self::RetrievalFailure,
            Self::StoreUnavailable,
            Self::StoreTimeout,
            Self::IoError,
            Self::SerializationError,
            Self::SearchIndexError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
