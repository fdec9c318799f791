//! Indexing pipeline: documents in, parents and child vectors out.
//!
//! The parent store and the vector index are not transactionally
//! joined. The pipeline maintains referential integrity by write order
//! alone: a document's parents are persisted before any of its children
//! are embedded or indexed, so a child hit can always be traced back to
//! a parent that was durable at the time the child was written. A
//! failure between the two writes leaves orphaned parents behind, which
//! readers tolerate.

use std::sync::Arc;

use crate::error::IndexError;
use crate::models::{ChildChunk, Document, IndexParams, ParentChunk};
use crate::services::embedding::EmbeddingProvider;
use crate::services::parent_store::ParentStore;
use crate::services::splitter::HierarchicalSplitter;
use crate::services::vector_store::{ChildPoint, VectorIndex};

/// Outcome of an indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub documents_indexed: u64,
    pub documents_failed: u64,
    pub parents_written: u64,
    pub children_indexed: u64,
}

impl IndexStats {
    pub fn merge(&mut self, other: &IndexStats) {
        self.documents_indexed += other.documents_indexed;
        self.documents_failed += other.documents_failed;
        self.parents_written += other.parents_written;
        self.children_indexed += other.children_indexed;
    }
}

/// Orchestrates splitting, parent persistence, embedding, and child
/// indexing for one collection.
pub struct IndexingPipeline {
    splitter: HierarchicalSplitter,
    parents: Arc<dyn ParentStore>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl IndexingPipeline {
    pub fn new(
        splitter: HierarchicalSplitter,
        parents: Arc<dyn ParentStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            splitter,
            parents,
            index,
            embedder,
        }
    }

    /// Rebuild the collection from scratch: drop and recreate the vector
    /// index with the registry's parameters, and clear the parent rows
    /// so a rebuilt collection can never serve passages from a previous
    /// corpus generation.
    pub async fn rebuild(&self, params: &IndexParams) -> Result<(), IndexError> {
        self.index.recreate(params).await?;
        self.parents.clear()?;
        Ok(())
    }

    /// Index a batch of documents. Failures are contained per document:
    /// a bad document is logged and skipped, the rest of the batch is
    /// processed normally.
    pub async fn add_documents(&self, documents: Vec<Document>) -> IndexStats {
        let mut stats = IndexStats::default();
        for document in documents {
            match self.index_document(&document).await {
                Ok((parents, children)) => {
                    stats.documents_indexed += 1;
                    stats.parents_written += parents as u64;
                    stats.children_indexed += children as u64;
                }
                Err(error) => {
                    tracing::error!(
                        source_id = %document.meta.source_id,
                        year = document.meta.year,
                        %error,
                        "failed to index document"
                    );
                    stats.documents_failed += 1;
                }
            }
        }
        stats
    }

    /// Index a single document, returning (parents, children) written.
    ///
    /// An empty document is a no-op, not an error.
    pub async fn index_document(&self, document: &Document) -> Result<(usize, usize), IndexError> {
        let split = self.splitter.split(&document.text);
        if split.is_empty() {
            return Ok((0, 0));
        }

        // Delete-before-insert keeps re-runs idempotent even when the
        // document shrank since the last indexing pass.
        self.parents.delete_by_source(&document.meta.source_id)?;

        let mut parents: Vec<ParentChunk> = Vec::with_capacity(split.len());
        let mut children: Vec<ChildChunk> = Vec::new();
        for (index, (parent_text, child_texts)) in split.into_iter().enumerate() {
            let parent = ParentChunk::new(document, index, parent_text);
            for (position, child_text) in child_texts.into_iter().enumerate() {
                children.push(ChildChunk::from_parent(&parent, position as u32, child_text));
            }
            parents.push(parent);
        }

        // Parents first. Children only become searchable afterwards.
        self.parents.put(&parents)?;

        let texts: Vec<String> = children.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_documents(&texts).await?;

        let points: Vec<ChildPoint> = children
            .into_iter()
            .zip(vectors)
            .map(|(child, vector)| ChildPoint { child, vector })
            .collect();
        let children_written = points.len();
        self.index.upsert(points).await?;

        Ok((parents.len(), children_written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentMeta;
    use crate::services::testing::{
        EventLog, MemoryParentStore, MemoryVectorIndex, StubEmbedding,
    };

    fn document(source_id: &str, text: &str) -> Document {
        Document::new(
            text.to_string(),
            DocumentMeta {
                source_id: source_id.to_string(),
                year: 2022,
                language: "en".to_string(),
                collection: "demo".to_string(),
            },
        )
    }

    fn pipeline(
        parents: Arc<MemoryParentStore>,
        index: Arc<MemoryVectorIndex>,
        embedder: Arc<StubEmbedding>,
    ) -> IndexingPipeline {
        IndexingPipeline::new(
            HierarchicalSplitter::with_defaults(),
            parents,
            index,
            embedder,
        )
    }

    #[tokio::test]
    async fn test_single_document_scenario() {
        let parents = Arc::new(MemoryParentStore::new());
        let index = Arc::new(MemoryVectorIndex::new());
        let pipeline = pipeline(parents.clone(), index.clone(), Arc::new(StubEmbedding::new()));

        let doc = document("10.1000/demo", "Paper about X. Paper about Y.");
        let stats = pipeline.add_documents(vec![doc.clone()]).await;

        assert_eq!(stats.documents_indexed, 1);
        assert_eq!(stats.documents_failed, 0);
        assert_eq!(stats.parents_written, 1);
        assert!(stats.children_indexed >= 1);

        // Every indexed child must reference the one generated parent.
        let parent_id = ParentChunk::generate_id(&doc.id(), 0);
        assert!(parents.contains(&parent_id));
        let hits = index.search(vec![0.0; 4], 10).await.unwrap();
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.parent_id == parent_id));
    }

    #[tokio::test]
    async fn test_parent_written_before_children() {
        let log = Arc::new(EventLog::default());
        let parents = Arc::new(MemoryParentStore::with_log(log.clone()));
        let index = Arc::new(MemoryVectorIndex::with_log(log.clone()));
        let pipeline = pipeline(parents, index, Arc::new(StubEmbedding::new()));

        let text = format!(
            "{}\n\n{}",
            "First paragraph about xylem transport in vascular plants. ".repeat(6),
            "Second paragraph about phloem loading and sugar movement. ".repeat(6)
        );
        let stats = pipeline.add_documents(vec![document("10.1/a", &text)]).await;
        assert!(stats.parents_written >= 2);

        let events = log.events();
        for (i, event) in events.iter().enumerate() {
            if let Some(parent_id) = event.strip_prefix("upsert ") {
                let put = format!("put {}", parent_id);
                assert!(
                    events[..i].iter().any(|e| e == &put),
                    "child of {} indexed before its parent was persisted",
                    parent_id
                );
            }
        }
    }

    #[tokio::test]
    async fn test_empty_document_is_a_noop() {
        let parents = Arc::new(MemoryParentStore::new());
        let index = Arc::new(MemoryVectorIndex::new());
        let pipeline = pipeline(parents.clone(), index.clone(), Arc::new(StubEmbedding::new()));

        let stats = pipeline.add_documents(vec![document("10.1/empty", "  \n\n ")]).await;
        assert_eq!(stats.documents_indexed, 1);
        assert_eq!(stats.documents_failed, 0);
        assert_eq!(stats.parents_written, 0);
        assert_eq!(parents.count().unwrap(), 0);
        assert_eq!(index.len(), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_skips_only_that_document() {
        let parents = Arc::new(MemoryParentStore::new());
        let index = Arc::new(MemoryVectorIndex::new());
        let embedder = Arc::new(StubEmbedding::failing_on("POISON"));
        let pipeline = pipeline(parents.clone(), index.clone(), embedder);

        let stats = pipeline
            .add_documents(vec![
                document("10.1/good-1", "A study of xenon isotopes."),
                document("10.1/bad", "POISON text that cannot be embedded."),
                document("10.1/good-2", "Yttrium compounds in catalysis."),
            ])
            .await;

        assert_eq!(stats.documents_indexed, 2);
        assert_eq!(stats.documents_failed, 1);
        assert_eq!(index.len(), 2);
        // The failed document's parent remains as an orphan; readers
        // tolerate it and the batch still completed.
        assert_eq!(parents.count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reindexing_is_idempotent() {
        let parents = Arc::new(MemoryParentStore::new());
        let index = Arc::new(MemoryVectorIndex::new());
        let pipeline = pipeline(parents.clone(), index.clone(), Arc::new(StubEmbedding::new()));

        let doc = document("10.1/a", "Paper about X. Paper about Y.");
        pipeline.add_documents(vec![doc.clone()]).await;
        let count_first = parents.count().unwrap();
        let points_first = index.len();

        pipeline.add_documents(vec![doc]).await;
        assert_eq!(parents.count().unwrap(), count_first);
        assert_eq!(index.len(), points_first);
    }

    #[tokio::test]
    async fn test_rebuild_clears_both_stores() {
        let parents = Arc::new(MemoryParentStore::new());
        let index = Arc::new(MemoryVectorIndex::new());
        let pipeline = pipeline(parents.clone(), index.clone(), Arc::new(StubEmbedding::new()));

        pipeline
            .add_documents(vec![document("10.1/a", "Paper about X.")])
            .await;
        assert!(parents.count().unwrap() > 0);

        pipeline.rebuild(&IndexParams::default()).await.unwrap();
        assert_eq!(parents.count().unwrap(), 0);
        assert_eq!(index.len(), 0);
    }
}
