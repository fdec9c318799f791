//! Collection registry backed by a JSON file under the data root.
//!
//! Each collection is a named, independently configured partition of the
//! corpus: one language (and therefore one embedding model), one vector
//! index namespace, one parent store file. The index construction
//! parameters are passed verbatim to the vector index when a collection
//! is (re)built.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Distance metric used by a collection's vector index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricType {
    #[default]
    #[serde(rename = "L2")]
    L2,
    #[serde(rename = "IP")]
    Ip,
    #[serde(rename = "COSINE")]
    Cosine,
}

/// Vector index construction parameters, stored verbatim in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexParams {
    #[serde(default)]
    pub metric_type: MetricType,

    #[serde(default = "default_index_type")]
    pub index_type: String,

    /// Index-specific parameters (e.g. HNSW `M` / `efConstruction`).
    #[serde(default)]
    pub params: serde_json::Value,
}

fn default_index_type() -> String {
    "HNSW".to_string()
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            metric_type: MetricType::L2,
            index_type: default_index_type(),
            params: serde_json::json!({ "M": 8, "efConstruction": 64 }),
        }
    }
}

impl IndexParams {
    pub fn hnsw_m(&self) -> Option<u64> {
        self.params.get("M").and_then(serde_json::Value::as_u64)
    }

    pub fn hnsw_ef_construction(&self) -> Option<u64> {
        self.params
            .get("efConstruction")
            .and_then(serde_json::Value::as_u64)
    }
}

/// A single registered collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub collection_name: String,

    /// Document language; decides the embedding model and must not change
    /// for the lifetime of the collection.
    #[serde(default = "default_language")]
    pub language: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub index_param: IndexParams,
}

fn default_language() -> String {
    "en".to_string()
}

impl CollectionEntry {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            collection_name: name.clone(),
            language: language.into(),
            title: name.clone(),
            description: format!("This is a collection about {}", name),
            index_param: IndexParams::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    collections: Vec<CollectionEntry>,
}

/// The set of registered collections plus the current default selection.
#[derive(Debug)]
pub struct CollectionRegistry {
    path: PathBuf,
    entries: Vec<CollectionEntry>,
    default: usize,
}

impl CollectionRegistry {
    /// Load the registry from `collections.json`. A missing or malformed
    /// file is fatal.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Err(ConfigError::RegistryNotFound(path));
        }

        let content = fs::read_to_string(&path)?;
        let file: RegistryFile = serde_json::from_str(&content)?;
        if file.collections.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "registry at {} lists no collections",
                path.display()
            )));
        }

        Ok(Self {
            path,
            entries: file.collections,
            default: 0,
        })
    }

    /// Scan the data root for collection directories and write a default
    /// registry entry for each. Existing registries are kept unless
    /// `force` is set.
    pub fn auto_create(data_root: &Path, force: bool) -> Result<PathBuf, ConfigError> {
        let path = data_root.join("collections.json");
        if path.exists() && !force {
            return Ok(path);
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(data_root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let name = entry.file_name().to_string_lossy().to_string();
                entries.push(CollectionEntry::new(name, "en"));
            }
        }
        entries.sort_by(|a, b| a.collection_name.cmp(&b.collection_name));

        if entries.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "no collection directories found under {}",
                data_root.display()
            )));
        }

        let file = RegistryFile {
            collections: entries,
        };
        fs::write(&path, serde_json::to_string_pretty(&file)?)?;
        Ok(path)
    }

    fn save(&self) -> Result<(), ConfigError> {
        let file = RegistryFile {
            collections: self.entries.clone(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    pub fn entries(&self) -> &[CollectionEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Result<&CollectionEntry, ConfigError> {
        self.entries
            .iter()
            .find(|e| e.collection_name == name)
            .ok_or_else(|| ConfigError::UnknownCollection(name.to_string()))
    }

    /// The currently selected default collection.
    pub fn default_entry(&self) -> &CollectionEntry {
        &self.entries[self.default]
    }

    pub fn set_default(&mut self, name: &str) -> Result<(), ConfigError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.collection_name == name)
            .ok_or_else(|| ConfigError::UnknownCollection(name.to_string()))?;
        self.default = idx;
        Ok(())
    }

    pub fn add(&mut self, entry: CollectionEntry) -> Result<(), ConfigError> {
        if self
            .entries
            .iter()
            .any(|e| e.collection_name == entry.collection_name)
        {
            return Err(ConfigError::ValidationError(format!(
                "collection {} already registered",
                entry.collection_name
            )));
        }
        self.entries.push(entry);
        self.save()
    }

    pub fn remove(&mut self, name: &str) -> Result<(), ConfigError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.collection_name == name)
            .ok_or_else(|| ConfigError::UnknownCollection(name.to_string()))?;
        if self.entries.len() == 1 {
            return Err(ConfigError::ValidationError(
                "cannot remove the last collection".to_string(),
            ));
        }
        self.entries.remove(idx);
        if self.default >= self.entries.len() {
            self.default = 0;
        }
        self.save()
    }

    pub fn rename(&mut self, name: &str, new_title: &str) -> Result<(), ConfigError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.collection_name == name)
            .ok_or_else(|| ConfigError::UnknownCollection(name.to_string()))?;
        self.entries[idx].title = new_title.to_string();
        self.save()
    }
}
