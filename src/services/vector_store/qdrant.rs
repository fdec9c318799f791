//! Qdrant vector index backend.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, HnswConfigDiffBuilder, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};

use super::{ChildHit, ChildPoint, ScoreOrder, VectorIndex};
use crate::error::VectorStoreError;
use crate::models::{IndexParams, MetricType, VectorStoreConfig};

/// Qdrant-backed [`VectorIndex`], bound to one collection.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    dimension: u64,
    score_order: ScoreOrder,
}

impl QdrantIndex {
    pub fn new(
        config: &VectorStoreConfig,
        collection: &str,
        dimension: u64,
        metric: MetricType,
    ) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
            dimension,
            score_order: metric.into(),
        })
    }

    pub async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    fn distance(params: &IndexParams) -> Distance {
        match params.metric_type {
            MetricType::L2 => Distance::Euclid,
            MetricType::Ip => Distance::Dot,
            MetricType::Cosine => Distance::Cosine,
        }
    }
}

fn payload_str(
    payload: &HashMap<String, qdrant_client::qdrant::Value>,
    key: &str,
) -> Option<String> {
    payload.get(key).and_then(|v| match &v.kind {
        Some(qdrant_client::qdrant::value::Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    })
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn recreate(&self, params: &IndexParams) -> Result<(), VectorStoreError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| VectorStoreError::RecreateError(e.to_string()))?;
        if exists {
            self.client
                .delete_collection(&self.collection)
                .await
                .map_err(|e| VectorStoreError::RecreateError(e.to_string()))?;
        }

        let mut create = CreateCollectionBuilder::new(&self.collection).vectors_config(
            VectorParamsBuilder::new(self.dimension, Self::distance(params)),
        );

        if params.index_type.eq_ignore_ascii_case("hnsw") {
            let mut hnsw = HnswConfigDiffBuilder::default();
            if let Some(m) = params.hnsw_m() {
                hnsw = hnsw.m(m);
            }
            if let Some(ef) = params.hnsw_ef_construction() {
                hnsw = hnsw.ef_construct(ef);
            }
            create = create.hnsw_config(hnsw);
        }

        self.client
            .create_collection(create)
            .await
            .map_err(|e| VectorStoreError::RecreateError(e.to_string()))?;

        Ok(())
    }

    async fn upsert(&self, points: Vec<ChildPoint>) -> Result<(), VectorStoreError> {
        if points.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|point| {
                let child = point.child;
                let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
                payload.insert("parent_id".to_string(), child.parent_id.into());
                payload.insert("text".to_string(), child.text.into());
                payload.insert("source_id".to_string(), child.source_id.into());
                payload.insert("year".to_string(), i64::from(child.year).into());
                payload.insert("position".to_string(), i64::from(child.position).into());

                PointStruct::new(child.id, point.vector, payload)
            })
            .collect();

        let upsert = UpsertPointsBuilder::new(&self.collection, points);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<ChildHit>, VectorStoreError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let search =
            SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true);

        let results = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorStoreError::SearchError(e.to_string()))?;

        let hits = results
            .result
            .into_iter()
            .filter_map(|point| {
                // A point without a parent link is unusable for context
                // reconstruction; skip it rather than fail the search.
                let parent_id = payload_str(&point.payload, "parent_id")?;

                let child_id = match &point.id {
                    Some(id) => match &id.point_id_options {
                        Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid)) => {
                            uuid.clone()
                        }
                        Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(num)) => {
                            num.to_string()
                        }
                        None => String::new(),
                    },
                    None => String::new(),
                };

                Some(ChildHit {
                    child_id,
                    parent_id,
                    score: point.score,
                })
            })
            .collect();

        Ok(hits)
    }

    async fn points_count(&self) -> Result<Option<u64>, VectorStoreError> {
        match self.client.collection_info(&self.collection).await {
            Ok(info) => Ok(Some(
                info.result.map_or(0, |r| r.points_count.unwrap_or(0)),
            )),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("not found") || msg.contains("doesn't exist") {
                    Ok(None)
                } else {
                    Err(VectorStoreError::CollectionError(msg))
                }
            }
        }
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn score_order(&self) -> ScoreOrder {
        self.score_order
    }
}
