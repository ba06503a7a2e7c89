//! HTTP surface of the RAG service

use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::document;
use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::indexer;
use crate::llm::Generator;
use crate::qdrant_store::VectorStore;
use crate::query::{self, QueryAnswer};

/// Process-wide service handles, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn Generator>,
}

impl AppState {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn Generator>,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
        }
    }

    pub async fn ingest(&self, text: &str) -> Result<usize> {
        indexer::create_and_store_embeddings(self.embedder.as_ref(), self.store.as_ref(), text)
            .await
    }

    pub async fn answer(&self, question: &str) -> Result<QueryAnswer> {
        query::query_and_generate_answer(
            self.embedder.as_ref(),
            self.store.as_ref(),
            self.llm.as_ref(),
            question,
        )
        .await
    }
}

#[derive(Deserialize)]
struct TextInput {
    text: String,
}

#[derive(Deserialize)]
struct QueryInput {
    query: String,
}

pub fn build_router(state: AppState, config: &ServerConfig) -> Result<Router> {
    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| Error::Config(format!("invalid CORS origin '{origin}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    // Credentials forbid wildcards, so methods and headers mirror the request.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    let router = Router::new()
        .route("/", get(read_root))
        .route("/process-text-input", post(process_text_input))
        .route(
            "/process-text",
            post(process_text_file).layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .route("/query", post(query_endpoint))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(router)
}

async fn read_root() -> Json<Value> {
    Json(json!({ "status": "API is online!" }))
}

async fn process_text_input(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TextInput>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(payload) = payload?;
    if payload.text.trim().is_empty() {
        return Err(Error::EmptyInput("Text field cannot be empty."));
    }
    state.ingest(&payload.text).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Text processed successfully."
    })))
}

async fn process_text_file(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let mut multipart = multipart?;
    let (filename, contents) = read_upload(&mut multipart).await?;
    tracing::info!("Processing file: {} ({} bytes)", filename, contents.len());

    let text = document::parse_document(&filename, contents).await?;
    state.ingest(&text).await?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("File '{filename}' processed successfully.")
    })))
}

/// Read the `file` field, rejecting unsupported names before the body is read.
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidUpload(format!("Failed to read upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !(filename.ends_with(".txt") || filename.ends_with(".pdf")) {
            return Err(Error::UnsupportedFileType(filename));
        }

        let contents = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidUpload(format!("Failed to read file: {e}")))?;
        return Ok((filename, contents.to_vec()));
    }
    Err(Error::InvalidUpload("No file uploaded.".to_string()))
}

async fn query_endpoint(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryInput>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(payload) = payload?;
    if payload.query.trim().is_empty() {
        return Err(Error::EmptyInput("Query field cannot be empty."));
    }
    tracing::info!("Query: \"{}\"", payload.query);
    let result = state.answer(&payload.query).await?;
    Ok(Json(json!({ "status": "success", "result": result })))
}
