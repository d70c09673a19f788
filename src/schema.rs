//! Index schema and the startup catalog of known indexes.
//!
//! An index carries one analysed text field and one fixed-dimension dense
//! vector field. `dims` is fixed when the index is created; every write and
//! every query vector must match it exactly.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::IndexConfig;
use crate::error::{HsError, Result};

/// Default name of the analysed text field.
pub const DEFAULT_TEXT_FIELD: &str = "content";
/// Default name of the dense vector field.
pub const DEFAULT_VECTOR_FIELD: &str = "content_vector";

/// Vector similarity used by the k-NN field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    #[default]
    Cosine,
    DotProduct,
    L2Norm,
    MaxInnerProduct,
}

impl Similarity {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::DotProduct => "dot_product",
            Self::L2Norm => "l2_norm",
            Self::MaxInnerProduct => "max_inner_product",
        }
    }

    /// Score a stored vector against a query vector.
    ///
    /// Scores are mapped onto the non-negative ranges Elasticsearch reports
    /// so both store adapters order hits the same way.
    #[must_use]
    pub fn score(&self, query: &[f32], stored: &[f32]) -> f32 {
        match self {
            Self::Cosine => (1.0 + cosine(query, stored)) / 2.0,
            Self::DotProduct => (1.0 + dot(query, stored)) / 2.0,
            Self::L2Norm => {
                let dist_sq: f32 = query
                    .iter()
                    .zip(stored)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                1.0 / (1.0 + dist_sq)
            }
            Self::MaxInnerProduct => {
                let d = dot(query, stored);
                if d < 0.0 { 1.0 / (1.0 - d) } else { d + 1.0 }
            }
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Similarity {
    type Err = HsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "dot_product" | "dot-product" | "dot" => Ok(Self::DotProduct),
            "l2_norm" | "l2-norm" | "l2" => Ok(Self::L2Norm),
            "max_inner_product" | "max-inner-product" | "mip" => Ok(Self::MaxInnerProduct),
            other => Err(HsError::Config(format!(
                "unknown similarity {other} (expected cosine|dot_product|l2_norm|max_inner_product)"
            ))),
        }
    }
}

/// Mapping of one index: a text field plus a dense vector field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub name: String,
    /// Schema version persisted with the index; drives `migrate`.
    pub version: u32,
    pub text_field: String,
    pub vector_field: String,
    pub dims: usize,
    pub similarity: Similarity,
}

impl IndexSchema {
    /// Schema with the default field names.
    pub fn new(name: impl Into<String>, dims: usize, similarity: Similarity) -> Self {
        Self {
            name: name.into(),
            version: 1,
            text_field: DEFAULT_TEXT_FIELD.to_string(),
            vector_field: DEFAULT_VECTOR_FIELD.to_string(),
            dims,
            similarity,
        }
    }

    #[must_use]
    pub const fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        let schema = Self {
            name: config.name.clone(),
            version: config.version,
            text_field: config.text_field.clone(),
            vector_field: config.vector_field.clone(),
            dims: config.dims,
            similarity: config.similarity.parse()?,
        };
        schema.validate()?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HsError::Config("index name must not be empty".to_string()));
        }
        if self.dims == 0 {
            return Err(HsError::Config(format!(
                "index {} must have dims greater than 0",
                self.name
            )));
        }
        if self.text_field == self.vector_field {
            return Err(HsError::Config(format!(
                "index {}: text and vector fields must differ",
                self.name
            )));
        }
        Ok(())
    }

    /// Check a vector's length against `dims`.
    pub fn check_dims(&self, vector: &[f32]) -> Result<()> {
        if vector.len() == self.dims {
            Ok(())
        } else {
            Err(HsError::DimensionMismatch {
                field: self.vector_field.clone(),
                expected: self.dims,
                actual: vector.len(),
            })
        }
    }

    /// Describe why `existing` cannot serve writes and queries made for `self`.
    ///
    /// Versions are not compared here; see `migrate`.
    #[must_use]
    pub fn incompatibility(&self, existing: &Self) -> Option<String> {
        if existing.text_field != self.text_field {
            return Some(format!(
                "text field is {}, expected {}",
                existing.text_field, self.text_field
            ));
        }
        if existing.vector_field != self.vector_field {
            return Some(format!(
                "vector field is {}, expected {}",
                existing.vector_field, self.vector_field
            ));
        }
        if existing.dims != self.dims {
            return Some(format!("dims is {}, expected {}", existing.dims, self.dims));
        }
        if existing.similarity != self.similarity {
            return Some(format!(
                "similarity is {}, expected {}",
                existing.similarity, self.similarity
            ));
        }
        None
    }
}

/// Immutable name → schema map built once at startup.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: BTreeMap<String, IndexSchema>,
}

impl SchemaCatalog {
    pub fn new(schemas: impl IntoIterator<Item = IndexSchema>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for schema in schemas {
            schema.validate()?;
            if map.contains_key(&schema.name) {
                return Err(HsError::Config(format!(
                    "index {} declared twice",
                    schema.name
                )));
            }
            map.insert(schema.name.clone(), schema);
        }
        Ok(Self { schemas: map })
    }

    pub fn get(&self, index: &str) -> Result<&IndexSchema> {
        self.schemas
            .get(index)
            .ok_or_else(|| HsError::IndexNotFound(index.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexSchema> {
        self.schemas.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot(a, b) / (norm_a * norm_b)
    }
}
