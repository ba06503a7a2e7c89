//! Embedding providers

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

/// Cohere accepts at most this many texts per embed request.
const COHERE_MAX_BATCH: usize = 96;

/// Turns text into fixed-length vectors.
///
/// Implementations:
/// - `CohereEmbedder`: Cohere embed API (embed-english-v3.0)
/// - `FastEmbedder`: local ONNX model via fastembed
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed chunks for indexing, one vector per text, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    fn dimensions(&self) -> usize;

    /// Provider name for logging
    fn name(&self) -> &str;
}

pub(crate) fn check_dimensions(vectors: &[Vec<f32>], expected: usize) -> Result<()> {
    match vectors.iter().find(|v| v.len() != expected) {
        Some(v) => Err(Error::embedding(format!(
            "dimension mismatch: expected {expected}, got {}",
            v.len()
        ))),
        None => Ok(()),
    }
}

pub struct CohereEmbedder {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
    model: &'a str,
    input_type: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl CohereEmbedder {
    pub fn new(config: &EmbeddingConfig, dimensions: usize, timeout_secs: u64) -> Result<Self> {
        let api_key = config
            .cohere_api_key
            .clone()
            .ok_or_else(|| Error::Config("COHERE_API_KEY must be set".to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.cohere_base_url.trim_end_matches('/').to_string(),
            model: config.cohere_model.clone(),
            dimensions,
        })
    }

    async fn embed(&self, texts: &[String], input_type: &str) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embed", self.base_url);
        let embeddings = embed_in_batches(texts, COHERE_MAX_BATCH, |batch| {
            self.request_batch(&url, batch, input_type)
        })
        .await?;
        check_dimensions(&embeddings, self.dimensions)?;
        Ok(embeddings)
    }

    async fn request_batch(
        &self,
        url: &str,
        batch: &[String],
        input_type: &str,
    ) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&EmbedRequest {
                texts: batch,
                model: &self.model,
                input_type,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!("HTTP {status} - {body}")));
        }

        let parsed: EmbedResponse = response.json().await?;
        Ok(parsed.embeddings)
    }
}

/// Embed `texts` in slices of at most `max_batch`, concatenating results in
/// input order. Each batch must return exactly one vector per text.
pub(crate) async fn embed_in_batches<'a, F, Fut>(
    texts: &'a [String],
    max_batch: usize,
    mut embed_batch: F,
) -> Result<Vec<Vec<f32>>>
where
    F: FnMut(&'a [String]) -> Fut,
    Fut: Future<Output = Result<Vec<Vec<f32>>>>,
{
    let mut embeddings = Vec::with_capacity(texts.len());
    for batch in texts.chunks(max_batch) {
        let vectors = embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            return Err(Error::embedding(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                vectors.len()
            )));
        }
        embeddings.extend(vectors);
    }
    Ok(embeddings)
}

#[async_trait]
impl Embedder for CohereEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed(texts, "search_document").await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()], "search_query")
            .await?
            .pop()
            .ok_or_else(|| Error::embedding("empty embedding response"))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "cohere"
    }
}

#[cfg(feature = "local-embeddings")]
pub use local::FastEmbedder;

#[cfg(feature = "local-embeddings")]
mod local {
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;
    use fastembed::TextEmbedding;

    use super::{check_dimensions, Embedder};
    use crate::embedding_model_factory;
    use crate::error::{Error, Result};

    /// Embeds on the blocking thread pool with a locally loaded ONNX model.
    pub struct FastEmbedder {
        model: Arc<TextEmbedding>,
        dimensions: usize,
    }

    impl FastEmbedder {
        pub fn new(model_dir: Option<&Path>, dimensions: usize) -> Result<Self> {
            let model = embedding_model_factory::get_model(model_dir)
                .map_err(|e| Error::embedding(format!("failed to load local model: {e}")))?;
            Ok(Self {
                model: Arc::new(model),
                dimensions,
            })
        }

        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            let model = Arc::clone(&self.model);
            let embeddings = tokio::task::spawn_blocking(move || model.embed(texts, None))
                .await
                .map_err(|e| Error::Internal(format!("embedding task failed: {e}")))?
                .map_err(|e| Error::embedding(e.to_string()))?;
            check_dimensions(&embeddings, self.dimensions)?;
            Ok(embeddings)
        }
    }

    #[async_trait]
    impl Embedder for FastEmbedder {
        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            self.embed(texts.to_vec()).await
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
            self.embed(vec![text.to_string()])
                .await?
                .pop()
                .ok_or_else(|| Error::embedding("empty embedding response"))
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn name(&self) -> &str {
            "fastembed"
        }
    }
}
