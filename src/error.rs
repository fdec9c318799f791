//! Error types for the paper search CLI.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the hierarchical chunk splitter.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("chunk size must be positive")]
    ZeroChunkSize,

    #[error("chunk overlap {overlap} must be smaller than chunk size {size}")]
    OverlapTooLarge { overlap: usize, size: usize },
}

/// Errors related to the parent document store.
#[derive(Debug, Error)]
pub enum ParentStoreError {
    #[error("failed to open parent store at {path}: {message}")]
    OpenError { path: PathBuf, message: String },

    #[error("parent store write failed: {0}")]
    WriteError(rusqlite::Error),

    #[error("parent store read failed: {0}")]
    ReadError(rusqlite::Error),

    #[error("parent store delete failed: {0}")]
    DeleteError(rusqlite::Error),
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: u64, got: u64 },

    #[error("embedding timeout")]
    Timeout,
}

/// Errors related to vector index operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector store: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),

    #[error("recreate error: {0}")]
    RecreateError(String),
}

/// Errors related to configuration and the collection registry.
///
/// These are fatal at startup: indexing and retrieval refuse to run
/// against a missing or malformed registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("registry parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("no collection registry found at {0}")]
    RegistryNotFound(PathBuf),

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors raised while indexing a single document.
///
/// The indexing pipeline catches these per document, logs them with the
/// document's source id, and moves on to the next document.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("split error: {0}")]
    Split(#[from] SplitError),

    #[error("parent store error: {0}")]
    ParentStore(#[from] ParentStoreError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

/// Errors related to retrieval.
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("parent store error: {0}")]
    ParentStore(#[from] ParentStoreError),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("retrieve error: {0}")]
    Retrieve(#[from] RetrieveError),

    #[error("{0}")]
    Other(String),
}
