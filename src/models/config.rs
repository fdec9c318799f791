use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::retrieval::OutputFormat;

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_EN_EMBEDDING_URL: &str = "http://localhost:8080";
pub const DEFAULT_ZH_EMBEDDING_URL: &str = "http://localhost:8081";
pub const DEFAULT_EN_MODEL: &str = "BAAI/bge-base-en-v1.5";
pub const DEFAULT_ZH_MODEL: &str = "moka-ai/m3e-base";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory holding one subdirectory per collection.
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Collection used when a command does not name one. Falls back to
    /// the first registry entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_collection: Option<String>,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            default_collection: None,
            embedding: EmbeddingConfig::default(),
            vector_store: VectorStoreConfig::default(),
            indexing: IndexingConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("psearch").join("config.toml"))
    }

    pub fn load() -> Result<Self, crate::error::ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            return Ok(config);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> Result<(), crate::error::ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            crate::error::ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Path of the collection registry file.
    pub fn registry_path(&self) -> PathBuf {
        self.data_root.join("collections.json")
    }

    /// Directory holding a collection's markdown corpus.
    pub fn md_path(&self, collection: &str) -> PathBuf {
        self.data_root.join(collection).join("md")
    }

    /// SQLite file backing a collection's parent store.
    pub fn docstore_path(&self, collection: &str) -> PathBuf {
        self.data_root.join(collection).join("docstore.db")
    }
}

/// One embedding server endpoint serving one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEndpoint {
    pub url: String,
    pub model: String,
    pub dimension: u32,
    #[serde(default = "default_normalize")]
    pub normalize: bool,
}

fn default_normalize() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model used for English (and other non-Chinese) collections.
    #[serde(default = "default_en_endpoint")]
    pub en: ModelEndpoint,

    /// Model used for Chinese collections.
    #[serde(default = "default_zh_endpoint")]
    pub zh: ModelEndpoint,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_en_endpoint() -> ModelEndpoint {
    ModelEndpoint {
        url: DEFAULT_EN_EMBEDDING_URL.to_string(),
        model: DEFAULT_EN_MODEL.to_string(),
        dimension: 768,
        normalize: true,
    }
}

fn default_zh_endpoint() -> ModelEndpoint {
    ModelEndpoint {
        url: DEFAULT_ZH_EMBEDDING_URL.to_string(),
        model: DEFAULT_ZH_MODEL.to_string(),
        dimension: 768,
        normalize: true,
    }
}

fn default_timeout() -> u64 {
    120
}

fn default_batch_size() -> u32 {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            en: default_en_endpoint(),
            zh: default_zh_endpoint(),
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

/// Vector store connection. A local deployment only needs `url`; a
/// managed remote endpoint adds an API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Target parent passage size in characters.
    #[serde(default = "default_parent_chunk_size")]
    pub parent_chunk_size: u32,

    /// Target child passage size in characters.
    #[serde(default = "default_child_chunk_size")]
    pub child_chunk_size: u32,

    /// Overlap between consecutive children in characters.
    #[serde(default = "default_child_chunk_overlap")]
    pub child_chunk_overlap: u32,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_parent_chunk_size() -> u32 {
    450
}

fn default_child_chunk_size() -> u32 {
    100
}

fn default_child_chunk_overlap() -> u32 {
    10
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parent_chunk_size: default_parent_chunk_size(),
            child_chunk_size: default_child_chunk_size(),
            child_chunk_overlap: default_child_chunk_overlap(),
            max_file_size: default_max_file_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// How many child hits to request from the vector index.
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_limit() -> u32 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_format: OutputFormat::Text,
        }
    }
}
