//! Vector index abstraction layer.
//!
//! The similarity search itself is an opaque external capability: this
//! module only defines the narrow contract the indexing pipeline and the
//! retriever need — upsert child vectors, search, and a destructive
//! recreate used when a collection is rebuilt from scratch.

mod qdrant;

pub use qdrant::QdrantIndex;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{ChildChunk, IndexParams, MetricType};

/// A child chunk paired with its embedding, ready for the index.
#[derive(Debug, Clone)]
pub struct ChildPoint {
    pub child: ChildChunk,
    pub vector: Vec<f32>,
}

/// One ranked hit from a similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildHit {
    pub child_id: String,
    pub parent_id: String,
    pub score: f32,
}

/// Whether a smaller or a larger score is the better match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOrder {
    /// L2 distance: lower is better.
    Ascending,
    /// Inner product / cosine similarity: higher is better.
    Descending,
}

impl From<MetricType> for ScoreOrder {
    fn from(metric: MetricType) -> Self {
        match metric {
            MetricType::L2 => ScoreOrder::Ascending,
            MetricType::Ip | MetricType::Cosine => ScoreOrder::Descending,
        }
    }
}

/// Contract every vector index backend implements. One instance is bound
/// to one collection.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Drop the collection (if it exists) and create it afresh from the
    /// registry's index parameters. The only supported way to remove
    /// vectors.
    async fn recreate(&self, params: &IndexParams) -> Result<(), VectorStoreError>;

    /// Insert or update child points.
    async fn upsert(&self, points: Vec<ChildPoint>) -> Result<(), VectorStoreError>;

    /// Return the `top_k` best matches for a query vector, pre-ranked
    /// best first.
    async fn search(&self, vector: Vec<f32>, top_k: u64)
    -> Result<Vec<ChildHit>, VectorStoreError>;

    /// Number of stored points, or `None` if the collection does not
    /// exist yet.
    async fn points_count(&self) -> Result<Option<u64>, VectorStoreError>;

    fn collection(&self) -> &str;

    fn score_order(&self) -> ScoreOrder;
}
