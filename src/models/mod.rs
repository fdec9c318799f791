mod chunk;
mod collection;
mod config;
mod retrieval;

pub use chunk::{ChildChunk, Document, DocumentMeta, ParentChunk};
pub use collection::{CollectionEntry, CollectionRegistry, IndexParams, MetricType};
pub use config::{
    Config, DEFAULT_EN_MODEL, DEFAULT_QDRANT_URL, DEFAULT_ZH_MODEL, EmbeddingConfig,
    IndexingConfig, ModelEndpoint, SearchConfig, VectorStoreConfig,
};
pub use retrieval::{OutputFormat, RetrievalResults, RetrievedPassage};
