//! Text extraction and cleanup for uploaded documents

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static HORIZONTAL_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Lines at or below this many characters are treated as noise.
const MIN_LINE_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Text,
    Pdf,
}

impl FileType {
    /// Detect the file type from the extension after the last `.`, ignoring case.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Extract and clean the text of an uploaded file.
///
/// Fails with [`Error::NoExtractableText`] when nothing survives cleaning, so
/// callers never index an empty document.
pub async fn parse_document(filename: &str, contents: Vec<u8>) -> Result<String> {
    let file_type = FileType::from_filename(filename)
        .ok_or_else(|| Error::UnsupportedFileType(filename.to_string()))?;

    let raw = match file_type {
        FileType::Text => String::from_utf8(contents)
            .map_err(|e| Error::file_parse(filename, format!("invalid UTF-8: {e}")))?,
        FileType::Pdf => extract_pdf_text(filename, contents).await?,
    };

    let cleaned = clean_text(&raw);
    if cleaned.is_empty() {
        return Err(Error::NoExtractableText(filename.to_string()));
    }

    tracing::info!(
        "Extracted {} characters from '{}' ({} before cleaning)",
        cleaned.chars().count(),
        filename,
        raw.chars().count()
    );
    Ok(cleaned)
}

async fn extract_pdf_text(filename: &str, contents: Vec<u8>) -> Result<String> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&contents))
        .await
        .map_err(|e| Error::Internal(format!("PDF extraction task failed: {e}")))?;
    text.map_err(|e| Error::file_parse(filename, e.to_string()))
}

/// Strip noise from extracted text.
///
/// Drops lines that are too short or contain no letters, collapses runs of
/// spaces and tabs, collapses blank-line runs and trims the result.
pub fn clean_text(text: &str) -> String {
    let kept: Vec<&str> = text.split('\n').filter(|line| is_content_line(line)).collect();

    let joined = kept.join("\n");
    let collapsed = HORIZONTAL_WS.replace_all(&joined, " ");
    let collapsed = BLANK_LINES.replace_all(&collapsed, "\n");
    collapsed.trim().to_string()
}

// Length is measured after whitespace collapsing so a second pass keeps the same lines.
fn is_content_line(line: &str) -> bool {
    let collapsed = HORIZONTAL_WS.replace_all(line, " ");
    let trimmed = collapsed.trim();
    trimmed.chars().count() > MIN_LINE_CHARS && trimmed.chars().any(char::is_alphabetic)
}
