//! Parent-context retrieval from child-level vector search.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::RetrieveError;
use crate::models::RetrievedPassage;
use crate::services::embedding::EmbeddingProvider;
use crate::services::parent_store::ParentStore;
use crate::services::vector_store::{ScoreOrder, VectorIndex};

/// Maps ranked child hits back to deduplicated parent passages.
pub struct Retriever {
    parents: Arc<dyn ParentStore>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    pub fn new(
        parents: Arc<dyn ParentStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            parents,
            index,
            embedder,
        }
    }

    /// Retrieve up to `top_k` child hits and return their parents,
    /// deduplicated and ordered best score first.
    ///
    /// A parent id that no longer resolves (e.g. removed by a concurrent
    /// re-index) is dropped with a warning, never an error; retrieval
    /// simply returns fewer passages.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: u64,
    ) -> Result<Vec<RetrievedPassage>, RetrieveError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RetrieveError::InvalidQuery(
                "query cannot be empty".to_string(),
            ));
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_query(query).await?;
        let hits = self.index.search(query_vector, top_k).await?;

        // Hits arrive pre-ranked, so the first hit per parent carries
        // that parent's best score.
        let mut seen: HashSet<String> = HashSet::new();
        let mut ranked: Vec<(String, f32)> = Vec::new();
        for hit in hits {
            if seen.insert(hit.parent_id.clone()) {
                ranked.push((hit.parent_id, hit.score));
            }
        }

        let ids: Vec<String> = ranked.iter().map(|(id, _)| id.clone()).collect();
        let fetched = self.parents.get(&ids)?;

        let mut passages = Vec::with_capacity(ranked.len());
        for ((parent_id, score), parent) in ranked.into_iter().zip(fetched) {
            match parent {
                Some(parent) => passages.push(RetrievedPassage {
                    parent_id,
                    text: parent.text,
                    source_id: parent.source_id,
                    year: parent.year,
                    score,
                }),
                None => {
                    tracing::warn!(%parent_id, "dropping hit: parent not found in store");
                }
            }
        }

        match self.index.score_order() {
            ScoreOrder::Ascending => {
                passages.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));
            }
            ScoreOrder::Descending => {
                passages.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
            }
        }

        Ok(passages)
    }
}
