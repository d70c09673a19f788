use std::path::PathBuf;

use tempfile::TempDir;

use crate::config::Config;
use crate::document::Document;
use crate::schema::{IndexSchema, Similarity};

/// The three-dimensional cosine index used throughout the tests.
pub fn test_schema() -> IndexSchema {
    IndexSchema::new("test", 3, Similarity::Cosine)
}

/// Defaults with the in-process backend, so nothing needs a cluster.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.store.backend = "memory".to_string();
    config
}

/// A small corpus where lexical and vector rankings disagree.
pub fn sample_documents() -> Vec<Document> {
    vec![
        Document::new("apple", "red apple orchard fruit", vec![0.9, 0.1, 0.0]),
        Document::new("banana", "yellow banana fruit", vec![0.7, 0.7, 0.0]),
        Document::new("cherry", "red cherry", vec![0.1, 0.9, 0.1]),
        Document::new("engine", "diesel engine repair", vec![0.0, 0.1, 0.9]),
        Document::new("firetruck", "red fire truck with a loud engine", vec![0.1, 0.0, 1.0]),
    ]
}

/// Isolated filesystem for config and payload files.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl UnitTestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();
        Self { temp_dir, data_path }
    }

    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Write `hsearch.toml` into the fixture directory.
    pub fn write_config(&self, toml: &str) -> PathBuf {
        self.create_file(crate::config::PROJECT_CONFIG_FILE, toml)
    }

    /// Write documents as a JSON array payload.
    pub fn write_documents(&self, relative_path: &str, documents: &serde_json::Value) -> PathBuf {
        self.create_file(relative_path, &documents.to_string())
    }
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}
