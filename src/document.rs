//! Documents and the ingestion-boundary record they are validated from.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HsError, Result};
use crate::schema::IndexSchema;

/// A validated document: text plus a vector whose length matches the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub content_vector: Vec<f32>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>, content_vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            content_vector,
        }
    }

    /// The body written to the store under the schema's field names.
    #[must_use]
    pub fn to_source(&self, schema: &IndexSchema) -> Value {
        let mut source = serde_json::Map::new();
        source.insert(schema.text_field.clone(), Value::String(self.content.clone()));
        source.insert(
            schema.vector_field.clone(),
            serde_json::json!(self.content_vector),
        );
        Value::Object(source)
    }

    /// Rebuild a document from a stored source body.
    pub fn from_source(id: &str, source: &Value, schema: &IndexSchema) -> Result<Self> {
        let content = source
            .get(&schema.text_field)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                HsError::MalformedDocument(format!(
                    "stored document {id} has no string field {}",
                    schema.text_field
                ))
            })?;
        let content_vector = parse_vector(source.get(&schema.vector_field), &schema.vector_field)?
            .ok_or_else(|| {
                HsError::MalformedDocument(format!(
                    "stored document {id} has no field {}",
                    schema.vector_field
                ))
            })?;
        Ok(Self::new(id, content, content_vector))
    }
}

/// A caller-supplied document before validation. Every field is optional so
/// that a malformed payload can be reported per document instead of failing
/// deserialization of the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_vector: Option<Vec<f32>>,
}

impl DocumentInput {
    pub fn new(content: impl Into<String>, content_vector: Vec<f32>) -> Self {
        Self {
            id: None,
            content: Some(content.into()),
            content_vector: Some(content_vector),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Read an untyped JSON payload using the schema's field names.
    ///
    /// Returns the id found in the payload (if any) alongside the outcome so a
    /// malformed document can still be reported under its own id.
    pub fn from_value(value: &Value, schema: &IndexSchema) -> (Option<String>, Result<Self>) {
        let Some(object) = value.as_object() else {
            return (
                None,
                Err(HsError::MalformedDocument(format!(
                    "expected a JSON object, got {}",
                    json_kind(value)
                ))),
            );
        };

        let id = match object.get("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                return (
                    None,
                    Err(HsError::MalformedDocument(format!(
                        "id must be a string, got {}",
                        json_kind(other)
                    ))),
                );
            }
        };

        let content = match object.get(&schema.text_field) {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => {
                return (
                    id,
                    Err(HsError::MalformedDocument(format!(
                        "{} must be a string, got {}",
                        schema.text_field,
                        json_kind(other)
                    ))),
                );
            }
        };

        let content_vector = match parse_vector(object.get(&schema.vector_field), &schema.vector_field) {
            Ok(vector) => vector,
            Err(err) => return (id, Err(err)),
        };

        (
            id.clone(),
            Ok(Self {
                id,
                content,
                content_vector,
            }),
        )
    }

    /// Check required fields and vector length; `id` must already be assigned.
    pub fn validate(self, id: String, schema: &IndexSchema) -> Result<Document> {
        let content = self.content.ok_or_else(|| {
            HsError::MalformedDocument(format!("missing required field {}", schema.text_field))
        })?;
        let content_vector = self.content_vector.ok_or_else(|| {
            HsError::MalformedDocument(format!("missing required field {}", schema.vector_field))
        })?;
        schema.check_dims(&content_vector)?;
        if content_vector.iter().any(|v| !v.is_finite()) {
            return Err(HsError::MalformedDocument(format!(
                "{} contains a non-finite value",
                schema.vector_field
            )));
        }
        Ok(Document::new(id, content, content_vector))
    }
}

fn parse_vector(value: Option<&Value>, field: &str) -> Result<Option<Vec<f32>>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_f64()
                    .map(|v| v as f32)
                    .ok_or_else(|| {
                        HsError::MalformedDocument(format!(
                            "{field} must contain only numbers, found {}",
                            json_kind(item)
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(other) => Err(HsError::MalformedDocument(format!(
            "{field} must be an array of numbers, got {}",
            json_kind(other)
        ))),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
