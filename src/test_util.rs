//! In-memory stand-ins for the external services.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::VECTOR_SIZE;
use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::llm::Generator;
use crate::qdrant_store::{ChunkPoint, SearchHit, VectorStore};
use crate::server::AppState;

/// Bag-of-words hashing embedder: texts sharing words land close together.
#[derive(Default)]
pub struct HashingEmbedder {
    pub calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; VECTOR_SIZE as usize];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % VECTOR_SIZE) as usize] += 1.0;
        }
        vector
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vectorize(text))
    }

    fn dimensions(&self) -> usize {
        VECTOR_SIZE as usize
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// Cosine-similarity store; `None` means the collection does not exist.
#[derive(Default)]
pub struct MemoryStore {
    pub points: Mutex<Option<Vec<ChunkPoint>>>,
    pub created_with: Mutex<Option<u64>>,
    pub searches: AtomicUsize,
}

impl MemoryStore {
    pub fn texts(&self) -> Vec<String> {
        self.points
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|p| p.text.clone())
            .collect()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.points.lock().unwrap().iter().flatten().map(|p| p.id).collect()
    }

    /// Vector size the collection was last created with.
    pub fn vector_size(&self) -> Option<u64> {
        *self.created_with.lock().unwrap()
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn recreate_collection(&self, vector_size: u64) -> Result<()> {
        *self.created_with.lock().unwrap() = Some(vector_size);
        *self.points.lock().unwrap() = Some(Vec::new());
        Ok(())
    }

    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<()> {
        let mut guard = self.points.lock().unwrap();
        let stored = guard
            .as_mut()
            .ok_or_else(|| Error::Internal("collection not found".into()))?;
        for point in points {
            stored.retain(|p| p.id != point.id);
            stored.push(point);
        }
        Ok(())
    }

    async fn search(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<SearchHit>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let guard = self.points.lock().unwrap();
        let stored = guard
            .as_ref()
            .ok_or_else(|| Error::Internal("collection not found".into()))?;
        let mut hits: Vec<SearchHit> = stored
            .iter()
            .map(|p| SearchHit {
                text: p.text.clone(),
                score: cosine(&vector, &p.vector),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn collection_name(&self) -> &str {
        "memory"
    }
}

/// Answers expansion prompts and answer prompts with canned text.
pub struct ScriptedGenerator {
    /// `None` makes expansion requests fail.
    pub expansion: Option<String>,
    pub answer: String,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(expansion: Option<&str>, answer: &str) -> Self {
        Self {
            expansion: expansion.map(str::to_string),
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn answer_prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.ends_with("ANSWER:"))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.ends_with("ANSWER:") {
            return Ok(self.answer.clone());
        }
        self.expansion
            .clone()
            .ok_or_else(|| Error::llm("rate limit exceeded"))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

pub struct Fixture {
    pub embedder: Arc<HashingEmbedder>,
    pub store: Arc<MemoryStore>,
    pub llm: Arc<ScriptedGenerator>,
}

impl Fixture {
    pub fn new(expansion: Option<&str>, answer: &str) -> Self {
        Self {
            embedder: Arc::new(HashingEmbedder::default()),
            store: Arc::new(MemoryStore::default()),
            llm: Arc::new(ScriptedGenerator::new(expansion, answer)),
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.embedder.clone(), self.store.clone(), self.llm.clone())
    }
}
