use crate::config::{CHUNK_OVERLAP, CHUNK_SIZE};
use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::qdrant_store::{ChunkPoint, VectorStore};
use crate::splitter;

/// Replace the collection contents with the chunks of `text`.
///
/// The collection is dropped and recreated on every call, so only the most
/// recently ingested document is searchable afterwards. Returns the number of
/// chunks stored.
pub async fn create_and_store_embeddings(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    text: &str,
) -> Result<usize> {
    store.recreate_collection(embedder.dimensions() as u64).await?;

    let chunks = splitter::split(text, CHUNK_SIZE, CHUNK_OVERLAP)?;
    if chunks.is_empty() {
        tracing::warn!("no chunks produced; collection left empty");
        return Ok(0);
    }

    let embeddings = embedder.embed_documents(&chunks).await?;
    if embeddings.len() != chunks.len() {
        return Err(Error::embedding(format!(
            "expected {} embeddings, got {}",
            chunks.len(),
            embeddings.len()
        )));
    }

    let count = chunks.len();
    let points = chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(id, (text, vector))| ChunkPoint {
            id: id as u64,
            text,
            vector,
        })
        .collect();
    store.upsert(points).await?;

    tracing::info!(
        "stored {} chunks embedded with {} in '{}'",
        count,
        embedder.name(),
        store.collection_name()
    );
    Ok(count)
}
