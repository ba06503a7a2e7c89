//! Error types for the RAG service

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required request field was empty or whitespace
    #[error("{0}")]
    EmptyInput(&'static str),

    #[error("Only .txt and .pdf files are supported.")]
    UnsupportedFileType(String),

    #[error("Could not extract text from '{0}'.")]
    NoExtractableText(String),

    /// Malformed multipart upload
    #[error("{0}")]
    InvalidUpload(String),

    /// Request body the extractors could not accept; keeps their status.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector database error: {0}")]
    VectorDb(#[from] qdrant_client::QdrantError),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Whether the error was caused by the caller's input rather than a provider.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyInput(_)
                | Error::UnsupportedFileType(_)
                | Error::NoExtractableText(_)
                | Error::InvalidUpload(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Rejected { status, .. } => *status,
            e if e.is_validation() => StatusCode::BAD_REQUEST,
            e => {
                tracing::error!("request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let resp = Error::EmptyInput("Query field cannot be empty.").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = Error::UnsupportedFileType("notes.docx".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn provider_errors_map_to_internal_error() {
        let resp = Error::llm("rate limited").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = Error::embedding("dimension mismatch").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unreadable_files_are_server_errors() {
        let err = Error::file_parse("notes.txt", "invalid utf-8");
        assert!(!err.is_validation());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn rejections_keep_their_status() {
        let resp = Error::Rejected {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "missing field `query`".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            Error::NoExtractableText("scan.pdf".into()).to_string(),
            "Could not extract text from 'scan.pdf'."
        );
        assert_eq!(
            Error::UnsupportedFileType("a.docx".into()).to_string(),
            "Only .txt and .pdf files are supported."
        );
    }
}
