//! Service configuration, read from the environment (and `.env` when present)

use std::str::FromStr;

use crate::error::{Error, Result};

pub const DEFAULT_COLLECTION_NAME: &str = "my_mini_rag_collection";
pub const VECTOR_SIZE: u64 = 1024; // embed-english-v3.0 / bge-large-en-v1.5 dimensions
pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 150;
/// Nearest neighbours fetched per sub-query.
pub const SEARCH_LIMIT: u64 = 3;
/// Context documents handed to the answer synthesizer.
pub const MAX_CONTEXT_DOCS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Cohere,
    FastEmbed,
}

impl FromStr for EmbeddingBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cohere" => Ok(Self::Cohere),
            "fastembed" => Ok(Self::FastEmbed),
            other => Err(Error::Config(format!("unknown EMBEDDING_BACKEND '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub cohere_api_key: Option<String>,
    pub cohere_base_url: String,
    pub cohere_model: String,
    pub fastembed_model_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub qdrant: QdrantConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| Error::Config(format!("{key} must be set")))
        };
        let or_default =
            |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let backend = match get("EMBEDDING_BACKEND") {
            Some(v) => v.parse()?,
            None => EmbeddingBackend::Cohere,
        };
        let cohere_api_key = get("COHERE_API_KEY");
        if backend == EmbeddingBackend::Cohere && cohere_api_key.is_none() {
            return Err(Error::Config(
                "COHERE_API_KEY must be set when EMBEDDING_BACKEND=cohere".to_string(),
            ));
        }

        let cors_origins = parse_origins(&or_default("CORS_ORIGINS", "http://localhost:3000"));

        Ok(Self {
            qdrant: QdrantConfig {
                url: required("QDRANT_URL")?,
                api_key: get("QDRANT_API_KEY"),
                collection: or_default("QDRANT_COLLECTION", DEFAULT_COLLECTION_NAME),
            },
            embedding: EmbeddingConfig {
                backend,
                cohere_api_key,
                cohere_base_url: or_default("COHERE_BASE_URL", "https://api.cohere.com"),
                cohere_model: or_default("COHERE_MODEL", "embed-english-v3.0"),
                fastembed_model_dir: get("FASTEMBED_MODEL_DIR"),
            },
            llm: LlmConfig {
                api_key: required("GROQ_API_KEY")?,
                base_url: or_default("GROQ_BASE_URL", "https://api.groq.com/openai/v1"),
                model: or_default("GROQ_MODEL", "llama-3.1-8b-instant"),
            },
            server: ServerConfig {
                bind_addr: or_default("BIND_ADDR", "0.0.0.0:8000"),
                cors_origins,
                max_upload_bytes: parse_number(
                    get("MAX_UPLOAD_BYTES"),
                    "MAX_UPLOAD_BYTES",
                    25 * 1024 * 1024,
                )?,
            },
            request_timeout_secs: parse_number(
                get("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                120,
            )?,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_number<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key} is not a valid number: '{v}'"))),
        None => Ok(default),
    }
}
