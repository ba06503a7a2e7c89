//! Vector storage backed by Qdrant

use async_trait::async_trait;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};

use crate::config::QdrantConfig;
use crate::error::Result;

/// Payload key holding the chunk text.
pub const TEXT_FIELD: &str = "text";

/// One chunk ready for upsert.
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    pub id: u64,
    pub text: String,
    pub vector: Vec<f32>,
}

/// A ranked search match.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub text: String,
    pub score: f32,
}

/// The single named collection holding chunk embeddings.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Drop the collection if present and create it empty with cosine distance.
    async fn recreate_collection(&self, vector_size: u64) -> Result<()>;

    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<()>;

    /// Nearest neighbours, best first.
    async fn search(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<SearchHit>>;

    /// Round-trip to the backend to confirm it is reachable.
    async fn health_check(&self) -> Result<()>;

    fn collection_name(&self) -> &str;
}

pub struct QdrantStore {
    client: Qdrant,
    collection: String,
}

impl QdrantStore {
    pub fn new(config: &QdrantConfig) -> Result<Self> {
        let client = Qdrant::from_url(&config.url)
            .api_key(config.api_key.clone())
            .build()?;
        Ok(Self {
            client,
            collection: config.collection.clone(),
        })
    }

    async fn collection_exists(&self) -> Result<bool> {
        Ok(self.client.collection_exists(&self.collection).await?)
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn recreate_collection(&self, vector_size: u64) -> Result<()> {
        if self.collection_exists().await? {
            self.client.delete_collection(&self.collection).await?;
            tracing::warn!(
                "deleted collection '{}'; previously indexed content is gone",
                self.collection
            );
        }
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
            )
            .await?;
        tracing::info!("created collection '{}' in Qdrant", self.collection);
        Ok(())
    }

    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<()> {
        let mut structs = Vec::with_capacity(points.len());
        for point in points {
            let payload: Payload = serde_json::json!({ "text": point.text }).try_into()?;
            structs.push(PointStruct::new(point.id, point.vector, payload));
        }
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, structs).wait(true))
            .await?;
        Ok(())
    }

    async fn search(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector, limit).with_payload(true),
            )
            .await?;

        let hits = response
            .result
            .into_iter()
            .filter_map(|scored_point| {
                let text = scored_point.payload.get(TEXT_FIELD)?.as_str()?.to_string();
                Some(SearchHit {
                    text,
                    score: scored_point.score,
                })
            })
            .collect();
        Ok(hits)
    }

    async fn health_check(&self) -> Result<()> {
        self.client.list_collections().await?;
        Ok(())
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }
}
