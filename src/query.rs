//! Query expansion, multi-query retrieval and answer synthesis

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::{MAX_CONTEXT_DOCS, SEARCH_LIMIT};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::llm::Generator;
use crate::qdrant_store::VectorStore;

/// Paraphrases requested from the model per question.
const MAX_PARAPHRASES: usize = 3;

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.\s+(.*)$").unwrap());

pub const NO_ANSWER: &str =
    "I cannot find a sufficiently relevant answer in the provided document.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub sources: Vec<String>,
}

impl QueryAnswer {
    pub fn not_found() -> Self {
        Self {
            answer: NO_ANSWER.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Search queries derived from one user question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubQueries {
    /// Model paraphrases plus the original, deduplicated.
    Expanded(Vec<String>),
    /// Expansion failed; search with the original question only.
    Degraded(String),
}

impl SubQueries {
    pub fn as_slice(&self) -> &[String] {
        match self {
            SubQueries::Expanded(queries) => queries,
            SubQueries::Degraded(query) => std::slice::from_ref(query),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SubQueries::Degraded(_))
    }
}

fn expansion_prompt(query: &str) -> String {
    format!(
        "You are a helpful AI assistant. Your task is to generate 3 different search queries \
         based on a single user question. Provide ONLY a numbered list of the queries. \
         Original Question: \"{query}\""
    )
}

/// Keep the item text of lines that start with a list number (`1. ...`).
pub fn parse_numbered_list(response: &str) -> Vec<String> {
    response
        .trim()
        .lines()
        .filter_map(|line| NUMBERED_LINE.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Remove repeated entries, keeping the first occurrence of each.
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Ask the model for paraphrases of `query`.
///
/// Never fails: any model error degrades to searching with `query` alone.
pub async fn generate_sub_queries(llm: &dyn Generator, query: &str) -> SubQueries {
    match llm.complete(&expansion_prompt(query)).await {
        Ok(response) => {
            let mut queries = parse_numbered_list(&response);
            queries.truncate(MAX_PARAPHRASES);
            queries.push(query.to_string());
            SubQueries::Expanded(dedup_preserving_order(queries))
        }
        Err(e) => {
            tracing::warn!("query expansion failed, using original query only: {}", e);
            SubQueries::Degraded(query.to_string())
        }
    }
}

/// Search once per sub-query and merge the payload texts.
///
/// Results keep sub-query order, then ranking order within each search; the
/// merged list is deduplicated by exact text and capped at
/// [`MAX_CONTEXT_DOCS`].
pub async fn retrieve(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    sub_queries: &[String],
) -> Result<Vec<String>> {
    let mut all_docs = Vec::new();
    for sub_query in sub_queries {
        let vector = embedder.embed_query(sub_query).await?;
        let hits = store.search(vector, SEARCH_LIMIT).await?;
        tracing::debug!("sub-query {:?} matched {} chunks", sub_query, hits.len());
        all_docs.extend(hits.into_iter().map(|hit| hit.text));
    }

    let mut docs = dedup_preserving_order(all_docs);
    docs.truncate(MAX_CONTEXT_DOCS);
    Ok(docs)
}

pub fn build_answer_prompt(query: &str, context_docs: &[String]) -> String {
    let context = context_docs
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("Source [{}]:\n{}", i + 1, doc))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("CONTEXT:\n{context}\n\nQUESTION:\n{query}\n\nANSWER:")
}

pub async fn synthesize_answer(
    llm: &dyn Generator,
    query: &str,
    context_docs: Vec<String>,
) -> Result<QueryAnswer> {
    tracing::debug!(
        "generating answer from {} sources with {}",
        context_docs.len(),
        llm.model()
    );
    let answer = llm.complete(&build_answer_prompt(query, &context_docs)).await?;
    Ok(QueryAnswer {
        answer,
        sources: context_docs,
    })
}

/// Expand, retrieve and answer a user question.
pub async fn query_and_generate_answer(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    llm: &dyn Generator,
    query: &str,
) -> Result<QueryAnswer> {
    let sub_queries = generate_sub_queries(llm, query).await;
    tracing::info!(
        "searching with {} sub-queries{}",
        sub_queries.as_slice().len(),
        if sub_queries.is_degraded() { " (degraded)" } else { "" }
    );

    let context_docs = retrieve(embedder, store, sub_queries.as_slice()).await?;
    if context_docs.is_empty() {
        tracing::info!("no relevant chunks found for query");
        return Ok(QueryAnswer::not_found());
    }

    synthesize_answer(llm, query, context_docs).await
}
