//! In-memory test doubles for the store, index, and embedding contracts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{EmbeddingError, ParentStoreError, VectorStoreError};
use crate::models::{IndexParams, ParentChunk};
use crate::services::embedding::EmbeddingProvider;
use crate::services::parent_store::ParentStore;
use crate::services::vector_store::{ChildHit, ChildPoint, ScoreOrder, VectorIndex};

/// Shared, ordered record of store/index writes, used to assert the
/// parent-before-child write order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

/// HashMap-backed [`ParentStore`].
#[derive(Default)]
pub struct MemoryParentStore {
    rows: Mutex<HashMap<String, ParentChunk>>,
    log: Option<Arc<EventLog>>,
}

impl MemoryParentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: Arc<EventLog>) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            log: Some(log),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.lock().unwrap().contains_key(id)
    }
}

impl ParentStore for MemoryParentStore {
    fn put(&self, parents: &[ParentChunk]) -> Result<(), ParentStoreError> {
        let mut rows = self.rows.lock().unwrap();
        for parent in parents {
            if let Some(log) = &self.log {
                log.record(format!("put {}", parent.id));
            }
            rows.insert(parent.id.clone(), parent.clone());
        }
        Ok(())
    }

    fn get(&self, ids: &[String]) -> Result<Vec<Option<ParentChunk>>, ParentStoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(ids.iter().map(|id| rows.get(id).cloned()).collect())
    }

    fn delete(&self, ids: &[String]) -> Result<(), ParentStoreError> {
        let mut rows = self.rows.lock().unwrap();
        for id in ids {
            rows.remove(id);
        }
        Ok(())
    }

    fn delete_by_source(&self, source_id: &str) -> Result<(), ParentStoreError> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|_, parent| parent.source_id != source_id);
        Ok(())
    }

    fn clear(&self) -> Result<(), ParentStoreError> {
        self.rows.lock().unwrap().clear();
        Ok(())
    }

    fn count(&self) -> Result<u64, ParentStoreError> {
        Ok(self.rows.lock().unwrap().len() as u64)
    }
}

/// Exact nearest-neighbor [`VectorIndex`] over a Vec, L2 by default.
#[derive(Default)]
pub struct MemoryVectorIndex {
    points: Mutex<Vec<ChildPoint>>,
    log: Option<Arc<EventLog>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: Arc<EventLog>) -> Self {
        Self {
            points: Mutex::new(Vec::new()),
            log: Some(log),
        }
    }

    pub fn len(&self) -> usize {
        self.points.lock().unwrap().len()
    }
}

fn l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn recreate(&self, _params: &IndexParams) -> Result<(), VectorStoreError> {
        self.points.lock().unwrap().clear();
        Ok(())
    }

    async fn upsert(&self, new_points: Vec<ChildPoint>) -> Result<(), VectorStoreError> {
        let mut points = self.points.lock().unwrap();
        for point in new_points {
            if let Some(log) = &self.log {
                log.record(format!("upsert {}", point.child.parent_id));
            }
            points.retain(|p| p.child.id != point.child.id);
            points.push(point);
        }
        Ok(())
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<ChildHit>, VectorStoreError> {
        let points = self.points.lock().unwrap();
        let mut hits: Vec<ChildHit> = points
            .iter()
            .map(|p| ChildHit {
                child_id: p.child.id.clone(),
                parent_id: p.child.parent_id.clone(),
                score: l2(&vector, &p.vector),
            })
            .collect();
        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits.truncate(top_k as usize);
        Ok(hits)
    }

    async fn points_count(&self) -> Result<Option<u64>, VectorStoreError> {
        Ok(Some(self.len() as u64))
    }

    fn collection(&self) -> &str {
        "memory"
    }

    fn score_order(&self) -> ScoreOrder {
        ScoreOrder::Ascending
    }
}

/// Deterministic embedding over letter frequencies, good enough for the
/// L2 ranking assertions in pipeline and retriever tests.
#[derive(Default)]
pub struct StubEmbedding {
    /// Any text containing this marker makes the embed call fail.
    pub fail_marker: Option<String>,
}

impl StubEmbedding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(marker: impl Into<String>) -> Self {
        Self {
            fail_marker: Some(marker.into()),
        }
    }

    fn embed_one(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let count = |c: char| lower.matches(c).count() as f32;
        let total = lower.chars().count().max(1) as f32;
        vec![
            count('x') / total,
            count('y') / total,
            count('z') / total,
            count('q') / total,
        ]
    }

    fn check(&self, text: &str) -> Result<(), EmbeddingError> {
        if let Some(marker) = &self.fail_marker
            && text.contains(marker.as_str())
        {
            return Err(EmbeddingError::ServerError("stub failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedding {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts
            .iter()
            .map(|t| {
                self.check(t)?;
                Ok(Self::embed_one(t))
            })
            .collect()
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.check(text)?;
        Ok(Self::embed_one(text))
    }

    fn dimension(&self) -> u64 {
        4
    }

    fn model_id(&self) -> &str {
        "stub"
    }
}
