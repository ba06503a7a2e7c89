use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mini_rag_service::config::{Config, EmbeddingBackend, VECTOR_SIZE};
use mini_rag_service::embedding::{CohereEmbedder, Embedder};
use mini_rag_service::llm::{Generator, GroqClient};
use mini_rag_service::qdrant_store::{QdrantStore, VectorStore};
use mini_rag_service::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_rag_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!("Configuration loaded");
    tracing::info!("  - Qdrant: {} (collection '{}')", config.qdrant.url, config.qdrant.collection);
    let embedder = build_embedder(&config)?;
    tracing::info!(
        "  - Embeddings: {} ({} dimensions)",
        embedder.name(),
        embedder.dimensions()
    );

    let store = Arc::new(QdrantStore::new(&config.qdrant)?);
    match store.health_check().await {
        Ok(()) => tracing::info!("Connected to Qdrant at {}", config.qdrant.url),
        Err(e) => tracing::warn!("Qdrant not reachable at {}: {}", config.qdrant.url, e),
    }

    let llm = Arc::new(GroqClient::new(&config.llm, config.request_timeout_secs)?);
    tracing::info!("  - LLM model: {}", llm.model());

    let state = AppState::new(embedder, store, llm);
    let app = server::build_router(state, &config.server)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!("Server running on http://{}", config.server.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let dimensions = VECTOR_SIZE as usize;
    match config.embedding.backend {
        EmbeddingBackend::Cohere => Ok(Arc::new(CohereEmbedder::new(
            &config.embedding,
            dimensions,
            config.request_timeout_secs,
        )?)),
        EmbeddingBackend::FastEmbed => build_local_embedder(
            config.embedding.fastembed_model_dir.as_deref().map(Path::new),
            dimensions,
        ),
    }
}

#[cfg(feature = "local-embeddings")]
fn build_local_embedder(
    model_dir: Option<&Path>,
    dimensions: usize,
) -> Result<Arc<dyn Embedder>> {
    use mini_rag_service::embedding::FastEmbedder;
    Ok(Arc::new(FastEmbedder::new(model_dir, dimensions)?))
}

#[cfg(not(feature = "local-embeddings"))]
fn build_local_embedder(
    _model_dir: Option<&Path>,
    _dimensions: usize,
) -> Result<Arc<dyn Embedder>> {
    anyhow::bail!("EMBEDDING_BACKEND=fastembed requires the `local-embeddings` feature")
}
