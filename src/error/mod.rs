//! Error handling for hybrid-search.
//!
//! This module provides:
//! - [`HsError`]: The main error enum for all operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type with suggestions and context

mod codes;
mod suggestions;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;
pub use suggestions::suggest_for_error;

/// Main error type for hybrid-search operations.
#[derive(Error, Debug)]
pub enum HsError {
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Schema conflict on index '{index}': {reason}")]
    SchemaConflict { index: String, reason: String },

    #[error("Destructive operation blocked: {0}")]
    DestructiveBlocked(String),

    #[error("Dimension mismatch on '{field}': expected {expected}, got {actual}")]
    DimensionMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Partial ingestion failure: {rejected} of {total} documents rejected")]
    PartialIngestion { rejected: usize, total: usize },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Retrieval failed (lexical: {lexical}; vector: {vector})")]
    RetrievalFailure { lexical: String, vector: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Search index error: {0}")]
    SearchIndex(#[from] tantivy::TantivyError),
}

impl From<reqwest::Error> for HsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::StoreUnavailable(format!("unreadable store response: {err}"))
        } else {
            Self::StoreUnavailable(err.to_string())
        }
    }
}

impl HsError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::IndexNotFound(_) => ErrorCode::IndexNotFound,
            Self::SchemaConflict { .. } => ErrorCode::SchemaConflict,
            Self::DestructiveBlocked(_) => ErrorCode::DestructiveBlocked,
            Self::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            Self::MalformedDocument(_) => ErrorCode::MalformedDocument,
            Self::PartialIngestion { .. } => ErrorCode::PartialIngestionFailure,
            Self::InvalidQuery(_) => ErrorCode::SearchQueryInvalid,
            Self::RetrievalFailure { .. } => ErrorCode::RetrievalFailure,
            Self::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            Self::Timeout(_) => ErrorCode::StoreTimeout,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::SearchIndex(_) => ErrorCode::SearchIndexError,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::IndexNotFound(index) => Some(serde_json::json!({ "index": index })),
            Self::SchemaConflict { index, reason } => {
                Some(serde_json::json!({ "index": index, "reason": reason }))
            }
            Self::DimensionMismatch {
                field,
                expected,
                actual,
            } => Some(serde_json::json!({
                "field": field,
                "expected": expected,
                "actual": actual,
            })),
            Self::PartialIngestion { rejected, total } => {
                Some(serde_json::json!({ "rejected": rejected, "total": total }))
            }
            Self::RetrievalFailure { lexical, vector } => {
                Some(serde_json::json!({ "lexical": lexical, "vector": vector }))
            }
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            _ => None,
        }
    }

    /// Whether the failure came from the store transport rather than the request.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Timeout(_))
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_hs_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
///
/// Rendered on stdout in machine mode so scripts can branch on `code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "SCHEMA_CONFLICT")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 102)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// Error category (e.g., "schema", "store")
    pub category: String,
}

impl StructuredError {
    /// Create a new structured error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    /// Create a structured error from an `HsError`.
    #[must_use]
    pub fn from_hs_error(err: &HsError) -> Self {
        let code = err.code();
        let context = err.context();
        let suggestion = suggest_for_error(code, context.as_ref());

        Self {
            code,
            numeric_code: code.numeric(),
            message: err.to_string(),
            suggestion,
            context,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
        }
    }

    /// Add context to this error.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self.suggestion = suggest_for_error(self.code, self.context.as_ref());
        self
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<HsError> for StructuredError {
    fn from(err: HsError) -> Self {
        Self::from_hs_error(&err)
    }
}

impl From<&HsError> for StructuredError {
    fn from(err: &HsError) -> Self {
        Self::from_hs_error(err)
    }
}

/// Result type alias using `HsError`.
pub type Result<T> = std::result::Result<T, HsError>;
