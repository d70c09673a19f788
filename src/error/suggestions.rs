//! Context-aware error suggestions.
//!
//! Complements the static suggestions in the `codes` module with hints that
//! mention the index, field or sizes involved.

use serde_json::Value;

use super::codes::ErrorCode;

/// Generate a context-aware suggestion for an error.
pub fn suggest_for_error(code: ErrorCode, context: Option<&Value>) -> String {
    match code {
        ErrorCode::IndexNotFound => suggest_index_not_found(context),
        ErrorCode::SchemaConflict => suggest_schema_conflict(context),
        ErrorCode::DimensionMismatch => suggest_dimension_mismatch(context),
        ErrorCode::ConfigMissingRequired => suggest_config_missing_required(context),
        _ => code.suggestion().to_string(),
    }
}

fn suggest_index_not_found(context: Option<&Value>) -> String {
    match context.and_then(|c| c.get("index")).and_then(Value::as_str) {
        Some(index) => format!(
            "Index '{index}' is not declared. Set index.name = \"{index}\" (or HS_INDEX_NAME) and run `hsearch ensure`"
        ),
        None => ErrorCode::IndexNotFound.suggestion().to_string(),
    }
}

fn suggest_schema_conflict(context: Option<&Value>) -> String {
    match context.and_then(|c| c.get("index")).and_then(Value::as_str) {
        Some(index) => format!(
            "Index '{index}' exists with a different mapping. Run `hsearch migrate --allow-reset` after bumping index.version, or `hsearch reset --yes`"
        ),
        None => ErrorCode::SchemaConflict.suggestion().to_string(),
    }
}

fn suggest_dimension_mismatch(context: Option<&Value>) -> String {
    let expected = context.and_then(|c| c.get("expected")).and_then(Value::as_u64);
    let actual = context.and_then(|c| c.get("actual")).and_then(Value::as_u64);

    match (expected, actual) {
        (Some(expected), Some(actual)) => format!(
            "The schema expects {expected}-dimensional vectors but {actual} values were given. Re-embed with a model producing {expected} dims"
        ),
        _ => ErrorCode::DimensionMismatch.suggestion().to_string(),
    }
}

fn suggest_config_missing_required(context: Option<&Value>) -> String {
    match context.and_then(|c| c.get("config_key")).and_then(Value::as_str) {
        Some(key) => format!(
            "Set `{key}` in hsearch.toml or export HS_{}",
            key.replace('.', "_").to_uppercase()
        ),
        None => ErrorCode::ConfigMissingRequired.suggestion().to_string(),
    }
}
