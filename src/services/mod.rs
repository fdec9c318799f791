mod embedding;
mod indexer;
mod parent_store;
mod retriever;
mod splitter;
mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use embedding::{
    BGE_QUERY_INSTRUCTION, BgeEmbedding, EmbeddingProvider, GeneralEmbedding,
    provider_for_language,
};
pub use indexer::{IndexStats, IndexingPipeline};
pub use parent_store::{ParentStore, SqliteParentStore};
pub use retriever::Retriever;
pub use splitter::{CHILD_SEPARATORS, HierarchicalSplitter, PARENT_SEPARATORS};
pub use vector_store::{ChildHit, ChildPoint, QdrantIndex, ScoreOrder, VectorIndex};
