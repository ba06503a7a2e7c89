use text_splitter::{ChunkConfig, TextSplitter};

use crate::error::{Error, Result};

/// Split text into windows of at most `max_chars` characters, with up to
/// `overlap` characters shared between neighbouring chunks. The shared span
/// is trimmed to a sentence or word boundary, so it is usually a little
/// shorter than `overlap`.
///
/// The splitter descends through paragraph, sentence and word boundaries and
/// only cuts inside a word when nothing coarser fits.
pub fn split(text: &str, max_chars: usize, overlap: usize) -> Result<Vec<String>> {
    let config = ChunkConfig::new(max_chars)
        .with_overlap(overlap)
        .map_err(|e| Error::Internal(format!("invalid chunk config: {e}")))?;
    let splitter = TextSplitter::new(config);
    Ok(splitter.chunks(text).map(|s| s.to_string()).collect())
}
