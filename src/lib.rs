//! Retrieval-augmented question answering over a single ingested document.
//!
//! Documents are cleaned, split into overlapping windows, embedded and stored
//! in a Qdrant collection. Questions are expanded into paraphrases, each
//! paraphrase retrieves nearby chunks, and a language model answers from the
//! merged context.

pub mod config;
pub mod document;
pub mod embedding;
#[cfg(feature = "local-embeddings")]
mod embedding_model_factory;
pub mod error;
pub mod indexer;
pub mod llm;
pub mod qdrant_store;
pub mod query;
pub mod server;
pub mod splitter;

#[cfg(test)]
mod test_util;

pub use config::Config;
pub use error::{Error, Result};
pub use query::QueryAnswer;
