use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HsError, Result};

/// File name looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "hsearch.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl Config {
    /// Load defaults, then the global and project files (or one explicit
    /// file), then `HS_*` environment overrides.
    pub fn load(explicit_path: Option<&Path>, project_dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("HS_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            match Self::load_patch(&path)? {
                Some(patch) => config.merge_patch(patch),
                None => {
                    return Err(HsError::Config(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&project_dir.join(PROJECT_CONFIG_FILE))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a full TOML document on top of the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| HsError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        config.validate()?;
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        match dirs::config_dir() {
            Some(dir) => Self::load_patch(&dir.join("hsearch/config.toml")),
            None => Ok(None),
        }
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| HsError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| HsError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.store {
            self.store.merge(patch);
        }
        if let Some(patch) = patch.index {
            self.index.merge(patch);
        }
        if let Some(patch) = patch.lifecycle {
            self.lifecycle.merge(patch);
        }
        if let Some(patch) = patch.search {
            self.search.merge(patch);
        }
        if let Some(patch) = patch.ingest {
            self.ingest.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source; `lookup` mirrors `std::env::var`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvSource(&lookup);

        if let Some(value) = env.string("HS_STORE_BACKEND") {
            self.store.backend = value;
        }
        // ELASTIC_HOST / ELASTIC_API_KEY are honoured for existing deployments.
        if let Some(value) = env
            .string("HS_STORE_URL")
            .or_else(|| env.string("ELASTIC_HOST"))
        {
            self.store.url = value;
        }
        if let Some(value) = env
            .string("HS_STORE_API_KEY")
            .or_else(|| env.string("ELASTIC_API_KEY"))
        {
            self.store.api_key = Some(value);
        }
        if let Some(value) = env.u64("HS_STORE_REQUEST_TIMEOUT_MS")? {
            self.store.request_timeout_ms = value;
        }

        if let Some(value) = env.string("HS_INDEX_NAME") {
            self.index.name = value;
        }
        if let Some(value) = env.u32("HS_INDEX_VERSION")? {
            self.index.version = value;
        }
        if let Some(value) = env.usize("HS_INDEX_DIMS")? {
            self.index.dims = value;
        }
        if let Some(value) = env.string("HS_INDEX_SIMILARITY") {
            self.index.similarity = value;
        }

        if let Some(value) = env.bool("HS_LIFECYCLE_RESET_ON_VERSION_CHANGE") {
            self.lifecycle.reset_on_version_change = value;
        }

        if let Some(value) = env.f64("HS_SEARCH_RANK_CONSTANT")? {
            self.search.rank_constant = value;
        }
        if let Some(value) = env.usize("HS_SEARCH_RANK_WINDOW")? {
            self.search.rank_window = value;
        }
        if let Some(value) = env.usize("HS_SEARCH_KNN_K")? {
            self.search.knn_k = value;
        }
        if let Some(value) = env.usize("HS_SEARCH_NUM_CANDIDATES")? {
            self.search.num_candidates = value;
        }
        if let Some(value) = env.u64("HS_SEARCH_SUBQUERY_TIMEOUT_MS")? {
            self.search.subquery_timeout_ms = value;
        }
        if let Some(value) = env.usize("HS_SEARCH_DEFAULT_TOP_N")? {
            self.search.default_top_n = value;
        }

        if let Some(value) = env.usize("HS_INGEST_BATCH_SIZE")? {
            self.ingest.batch_size = value;
        }
        if let Some(value) = env.bool("HS_INGEST_REFRESH") {
            self.ingest.refresh = value;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        match self.store.backend.as_str() {
            "memory" => {}
            "elastic" => {
                if self.store.url.trim().is_empty() {
                    return Err(HsError::MissingConfig("store.url".to_string()));
                }
            }
            other => {
                return Err(HsError::Config(format!(
                    "unknown store backend {other} (expected elastic|memory)"
                )));
            }
        }
        if self.store.request_timeout_ms == 0 {
            return Err(HsError::Config(
                "store.request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.index.dims == 0 {
            return Err(HsError::Config("index.dims must be greater than 0".to_string()));
        }
        if !(self.search.rank_constant.is_finite() && self.search.rank_constant > 0.0) {
            return Err(HsError::Config(
                "search.rank_constant must be a positive number".to_string(),
            ));
        }
        if self.search.knn_k == 0 {
            return Err(HsError::Config("search.knn_k must be greater than 0".to_string()));
        }
        if self.search.num_candidates <= self.search.knn_k {
            return Err(HsError::Config(format!(
                "search.num_candidates ({}) must exceed search.knn_k ({})",
                self.search.num_candidates, self.search.knn_k
            )));
        }
        if self.search.subquery_timeout_ms == 0 {
            return Err(HsError::Config(
                "search.subquery_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.ingest.batch_size == 0 {
            return Err(HsError::Config(
                "ingest.batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `elastic` or `memory`
    pub backend: String,
    pub url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "elastic".to_string(),
            url: "http://localhost:9200".to_string(),
            api_key: None,
            request_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn merge(&mut self, patch: StorePatch) {
        if let Some(value) = patch.backend {
            self.backend = value;
        }
        if let Some(value) = patch.url {
            self.url = value;
        }
        if let Some(value) = patch.api_key {
            self.api_key = Some(value);
        }
        if let Some(value) = patch.request_timeout_ms {
            self.request_timeout_ms = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub name: String,
    pub version: u32,
    pub text_field: String,
    pub vector_field: String,
    pub dims: usize,
    pub similarity: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: "test".to_string(),
            version: 1,
            text_field: crate::schema::DEFAULT_TEXT_FIELD.to_string(),
            vector_field: crate::schema::DEFAULT_VECTOR_FIELD.to_string(),
            dims: 3,
            similarity: "cosine".to_string(),
        }
    }
}

impl IndexConfig {
    fn merge(&mut self, patch: IndexPatch) {
        if let Some(value) = patch.name {
            self.name = value;
        }
        if let Some(value) = patch.version {
            self.version = value;
        }
        if let Some(value) = patch.text_field {
            self.text_field = value;
        }
        if let Some(value) = patch.vector_field {
            self.vector_field = value;
        }
        if let Some(value) = patch.dims {
            self.dims = value;
        }
        if let Some(value) = patch.similarity {
            self.similarity = value;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Allow `migrate` to drop and rebuild an index whose stored schema
    /// version differs. Off by default: restarts never delete data.
    pub reset_on_version_change: bool,
}

impl LifecycleConfig {
    fn merge(&mut self, patch: LifecyclePatch) {
        if let Some(value) = patch.reset_on_version_change {
            self.reset_on_version_change = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// RRF constant `k` in `1 / (k + rank)`
    pub rank_constant: f64,
    /// Number of lexical hits fetched for fusion
    pub rank_window: usize,
    pub knn_k: usize,
    pub num_candidates: usize,
    pub subquery_timeout_ms: u64,
    pub default_top_n: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rank_constant: 60.0,
            rank_window: 10,
            knn_k: 5,
            num_candidates: 10,
            subquery_timeout_ms: 2_000,
            default_top_n: 2,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub const fn subquery_timeout(&self) -> Duration {
        Duration::from_millis(self.subquery_timeout_ms)
    }

    fn merge(&mut self, patch: SearchPatch) {
        if let Some(value) = patch.rank_constant {
            self.rank_constant = value;
        }
        if let Some(value) = patch.rank_window {
            self.rank_window = value;
        }
        if let Some(value) = patch.knn_k {
            self.knn_k = value;
        }
        if let Some(value) = patch.num_candidates {
            self.num_candidates = value;
        }
        if let Some(value) = patch.subquery_timeout_ms {
            self.subquery_timeout_ms = value;
        }
        if let Some(value) = patch.default_top_n {
            self.default_top_n = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub batch_size: usize,
    /// Wait for written documents to become searchable before returning.
    pub refresh: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            refresh: true,
        }
    }
}

impl IngestConfig {
    fn merge(&mut self, patch: IngestPatch) {
        if let Some(value) = patch.batch_size {
            self.batch_size = value;
        }
        if let Some(value) = patch.refresh {
            self.refresh = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub store: Option<StorePatch>,
    pub index: Option<IndexPatch>,
    pub lifecycle: Option<LifecyclePatch>,
    pub search: Option<SearchPatch>,
    pub ingest: Option<IngestPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StorePatch {
    pub backend: Option<String>,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct IndexPatch {
    pub name: Option<String>,
    pub version: Option<u32>,
    pub text_field: Option<String>,
    pub vector_field: Option<String>,
    pub dims: Option<usize>,
    pub similarity: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LifecyclePatch {
    pub reset_on_version_change: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchPatch {
    pub rank_constant: Option<f64>,
    pub rank_window: Option<usize>,
    pub knn_k: Option<usize>,
    pub num_candidates: Option<usize>,
    pub subquery_timeout_ms: Option<u64>,
    pub default_top_n: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct IngestPatch {
    pub batch_size: Option<usize>,
    pub refresh: Option<bool>,
}

struct EnvSource<'a, F>(&'a F);

impl<F> EnvSource<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn bool(&self, key: &str) -> Option<bool> {
        self.string(key).map(|value| {
            matches!(
                value.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
    }

    fn parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.string(key) {
            Some(value) => value.trim().parse::<T>().map(Some).map_err(|err| {
                HsError::Config(format!("invalid {key} value {value}: {err}"))
            }),
            None => Ok(None),
        }
    }

    fn u32(&self, key: &str) -> Result<Option<u32>> {
        self.parsed(key)
    }

    fn u64(&self, key: &str) -> Result<Option<u64>> {
        self.parsed(key)
    }

    fn usize(&self, key: &str) -> Result<Option<usize>> {
        self.parsed(key)
    }

    fn f64(&self, key: &str) -> Result<Option<f64>> {
        self.parsed(key)
    }
}
