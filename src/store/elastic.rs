//! Elasticsearch index store
//!
//! Speaks the Elasticsearch REST API (`_bulk`, `_search` with `match` and
//! `knn`, `_mapping`, `_doc`, `_count`) over a shared `reqwest` client. The
//! schema version lives in the mapping's `_meta.schema_version`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{IndexStore, RankedHit, StoreInfo, WriteStatus};
use crate::config::StoreConfig;
use crate::document::Document;
use crate::error::{HsError, Result};
use crate::schema::{IndexSchema, Similarity};

const USER_AGENT: &str = concat!("hsearch/", env!("CARGO_PKG_VERSION"));

/// Client for an Elasticsearch-compatible cluster.
#[derive(Clone)]
pub struct ElasticStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    mappings: Arc<RwLock<HashMap<String, IndexSchema>>>,
}

impl std::fmt::Debug for ElasticStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticStore")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl ElasticStore {
    pub fn new(url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(HsError::MissingConfig("store.url".to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| HsError::Config(format!("build http client: {err}")))?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            mappings: Arc::default(),
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(&config.url, config.api_key.clone(), config.request_timeout())
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("ApiKey {key}")),
            None => request,
        }
    }

    /// `{base}/{index}/{endpoint}`. The index is always percent-encoded;
    /// `endpoint` is a fixed API path such as `_search` and is sent as is.
    fn url(&self, index: Option<&str>, endpoint: &str) -> String {
        let mut url = self.base_url.clone();
        if let Some(index) = index {
            url.push('/');
            url.push_str(&urlencoding::encode(index));
        }
        if !endpoint.is_empty() {
            url.push('/');
            url.push_str(endpoint);
        }
        url
    }

    /// `{base}/{index}/_doc/{id}` with both caller values percent-encoded.
    fn document_url(&self, index: &str, id: &str) -> String {
        format!("{}/{}", self.url(Some(index), "_doc"), urlencoding::encode(id))
    }

    /// Field layout of `name`, read from `_mapping` once and then cached.
    async fn mapping(&self, name: &str) -> Result<IndexSchema> {
        let cached = self.mappings.read().get(name).cloned();
        if let Some(schema) = cached {
            return Ok(schema);
        }
        self.get_schema(name)
            .await?
            .ok_or_else(|| HsError::IndexNotFound(name.to_string()))
    }

    /// Send a request and return its status with the body parsed as JSON.
    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, Value)> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|err| {
                HsError::StoreUnavailable(format!("store returned non-JSON body ({status}): {err}"))
            })?
        };
        Ok((status, body))
    }

    async fn search(&self, name: &str, body: Value) -> Result<Vec<RankedHit>> {
        let (status, body) = self
            .send(self.client.post(self.url(Some(name), "_search")).json(&body))
            .await?;
        if !status.is_success() {
            return Err(status_error(name, status, &body));
        }
        let parsed: SearchResponse = serde_json::from_value(body)?;
        Ok(RankedHit::from_ordered(
            parsed
                .hits
                .hits
                .into_iter()
                .map(|hit| (hit.id, hit.score.unwrap_or_default())),
        ))
    }
}

impl IndexStore for ElasticStore {
    async fn create_index(&self, name: &str, schema: &IndexSchema) -> Result<()> {
        let (status, body) = self
            .send(self.client.put(self.url(Some(name), "")).json(&mapping_body(schema)))
            .await?;
        if status.is_success() {
            let mut created = schema.clone();
            created.name = name.to_string();
            self.mappings.write().insert(name.to_string(), created);
            return Ok(());
        }
        if error_type(&body) == Some("resource_already_exists_exception") {
            return Err(HsError::SchemaConflict {
                index: name.to_string(),
                reason: "index already exists".to_string(),
            });
        }
        Err(status_error(name, status, &body))
    }

    async fn delete_index(&self, name: &str) -> Result<bool> {
        let (status, body) = self.send(self.client.delete(self.url(Some(name), ""))).await?;
        self.mappings.write().remove(name);
        match status {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(status_error(name, s, &body)),
        }
    }

    async fn get_schema(&self, name: &str) -> Result<Option<IndexSchema>> {
        let (status, body) = self.send(self.client.get(self.url(Some(name), "_mapping"))).await?;
        match status {
            s if s.is_success() => {
                let schema = parse_mapping(name, &body)?;
                self.mappings.write().insert(name.to_string(), schema.clone());
                Ok(Some(schema))
            }
            StatusCode::NOT_FOUND => {
                self.mappings.write().remove(name);
                Ok(None)
            }
            s => Err(status_error(name, s, &body)),
        }
    }

    async fn bulk_write(
        &self,
        name: &str,
        documents: &[Document],
        refresh: bool,
    ) -> Result<Vec<WriteStatus>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let schema = self.mapping(name).await?;

        let mut payload = String::new();
        for doc in documents {
            let action = json!({ "index": { "_index": name, "_id": doc.id } });
            payload.push_str(&action.to_string());
            payload.push('\n');
            payload.push_str(&doc.to_source(&schema).to_string());
            payload.push('\n');
        }

        let refresh = if refresh { "wait_for" } else { "false" };
        let url = format!("{}?refresh={refresh}", self.url(None, "_bulk"));
        let (status, body) = self
            .send(
                self.client
                    .post(url)
                    .header(CONTENT_TYPE, "application/x-ndjson")
                    .body(payload),
            )
            .await?;
        if !status.is_success() {
            return Err(status_error(name, status, &body));
        }

        let parsed: BulkResponse = serde_json::from_value(body)?;
        if parsed.items.len() != documents.len() {
            return Err(HsError::StoreUnavailable(format!(
                "bulk response has {} items for {} documents",
                parsed.items.len(),
                documents.len()
            )));
        }
        debug!(index = name, items = parsed.items.len(), errors = parsed.errors, "bulk response");

        Ok(documents
            .iter()
            .zip(parsed.items)
            .map(|(doc, item)| {
                let item = item.index;
                match item.error {
                    Some(error) => WriteStatus::failed(
                        &doc.id,
                        format!("{}: {}", error.kind, error.reason.unwrap_or_default()),
                    ),
                    None if (200..300).contains(&item.status) => {
                        if item.result.as_deref() == Some("updated") {
                            WriteStatus::updated(&doc.id)
                        } else {
                            WriteStatus::created(&doc.id)
                        }
                    }
                    None => WriteStatus::failed(&doc.id, format!("status {}", item.status)),
                }
            })
            .collect())
    }

    async fn get_document(&self, name: &str, id: &str) -> Result<Option<Document>> {
        let (status, body) = self.send(self.client.get(self.document_url(name, id))).await?;
        if status == StatusCode::NOT_FOUND && body.get("found") == Some(&Value::Bool(false)) {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(name, status, &body));
        }
        let schema = self.mapping(name).await?;
        let source = body.get("_source").cloned().unwrap_or(Value::Null);
        Document::from_source(id, &source, &schema).map(Some)
    }

    async fn count(&self, name: &str) -> Result<u64> {
        let (status, body) = self.send(self.client.get(self.url(Some(name), "_count"))).await?;
        if !status.is_success() {
            return Err(status_error(name, status, &body));
        }
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| HsError::StoreUnavailable("count response has no count".to_string()))
    }

    async fn lexical_search(
        &self,
        name: &str,
        field: &str,
        text: &str,
        size: usize,
    ) -> Result<Vec<RankedHit>> {
        if size == 0 {
            return Ok(Vec::new());
        }
        self.search(
            name,
            json!({
                "size": size,
                "_source": false,
                "query": { "match": { field: { "query": text } } },
            }),
        )
        .await
    }

    async fn vector_search(
        &self,
        name: &str,
        field: &str,
        vector: &[f32],
        k: usize,
        num_candidates: usize,
    ) -> Result<Vec<RankedHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.search(
            name,
            json!({
                "size": k,
                "_source": false,
                "knn": {
                    "field": field,
                    "query_vector": vector,
                    "k": k,
                    "num_candidates": num_candidates,
                },
            }),
        )
        .await
    }

    async fn info(&self) -> Result<StoreInfo> {
        let (status, body) = self.send(self.client.get(self.url(None, ""))).await?;
        if !status.is_success() {
            return Err(status_error("", status, &body));
        }
        let parsed: InfoResponse = serde_json::from_value(body)?;
        Ok(StoreInfo {
            name: parsed.name,
            cluster_name: parsed.cluster_name,
            version: parsed.version.number,
        })
    }
}

/// Mapping body for `PUT /{index}`.
fn mapping_body(schema: &IndexSchema) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(schema.text_field.clone(), json!({ "type": "text" }));
    properties.insert(
        schema.vector_field.clone(),
        json!({
            "type": "dense_vector",
            "dims": schema.dims,
            "index": true,
            "similarity": schema.similarity.as_str(),
        }),
    );
    json!({
        "mappings": {
            "_meta": { "schema_version": schema.version },
            "properties": properties,
        }
    })
}

/// Rebuild a schema from a `GET /{index}/_mapping` response.
///
/// Indexes created outside this crate have no `_meta.schema_version`; they
/// read as version 0.
fn parse_mapping(name: &str, body: &Value) -> Result<IndexSchema> {
    let mappings = body
        .get(name)
        .or_else(|| body.as_object().and_then(|o| o.values().next()))
        .and_then(|index| index.get("mappings"))
        .ok_or_else(|| HsError::StoreUnavailable(format!("mapping response for {name} has no mappings")))?;

    let version = mappings
        .pointer("/_meta/schema_version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0);

    let mut text_field = String::new();
    let mut vector_field = String::new();
    let mut dims = 0;
    let mut similarity = Similarity::Cosine;

    if let Some(properties) = mappings.get("properties").and_then(Value::as_object) {
        let mut names: Vec<&String> = properties.keys().collect();
        names.sort();
        for field in names {
            let property = &properties[field];
            match property.get("type").and_then(Value::as_str) {
                Some("text") if text_field.is_empty() => text_field.clone_from(field),
                Some("dense_vector") if vector_field.is_empty() => {
                    vector_field.clone_from(field);
                    dims = property
                        .get("dims")
                        .and_then(Value::as_u64)
                        .and_then(|d| usize::try_from(d).ok())
                        .unwrap_or(0);
                    if let Some(sim) = property.get("similarity").and_then(Value::as_str) {
                        similarity = sim.parse()?;
                    }
                }
                _ => {}
            }
        }
    }

    Ok(IndexSchema {
        name: name.to_string(),
        version,
        text_field,
        vector_field,
        dims,
        similarity,
    })
}

fn error_type(body: &Value) -> Option<&str> {
    body.pointer("/error/type").and_then(Value::as_str)
}

fn status_error(index: &str, status: StatusCode, body: &Value) -> HsError {
    let kind = error_type(body).unwrap_or("unknown");
    let reason = body
        .pointer("/error/reason")
        .and_then(Value::as_str)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"));

    match status {
        StatusCode::NOT_FOUND if kind == "index_not_found_exception" => {
            HsError::IndexNotFound(index.to_string())
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            HsError::StoreUnavailable(format!("authentication failed ({status}): {reason}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            HsError::StoreUnavailable(format!("store is overloaded ({status}): {kind}: {reason}"))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            HsError::Timeout(format!("store timed out ({status}): {reason}"))
        }
        s if s.is_client_error() => HsError::InvalidQuery(format!("{kind}: {reason}")),
        s => HsError::StoreUnavailable(format!("{s}: {kind}: {reason}")),
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<BulkItem>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    index: BulkItemResult,
}

#[derive(Debug, Deserialize)]
struct BulkItemResult {
    #[serde(default)]
    status: u16,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<BulkItemError>,
}

#[derive(Debug, Deserialize)]
struct BulkItemError {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    name: String,
    #[serde(default)]
    cluster_name: Option<String>,
    version: InfoVersion,
}

#[derive(Debug, Deserialize)]
struct InfoVersion {
    number: String,
}
