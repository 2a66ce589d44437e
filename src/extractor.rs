//! PDF text extraction
//!
//! Pulls plain text out of uploaded documents and bounds it for the speech API

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to read PDF: {0}")]
    Pdf(String),
    #[error("PDF parser aborted: {0}")]
    Aborted(String),
}

/// Extract the text of every page, in page order
///
/// Parsing is CPU-bound, so it runs on the blocking pool. A panic inside the
/// parser surfaces as [`ExtractionError::Aborted`].
pub async fn extract_text(pdf: Vec<u8>) -> Result<String, ExtractionError> {
    let size = pdf.len();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf))
        .await
        .map_err(|e| ExtractionError::Aborted(e.to_string()))?
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    debug!(bytes = size, chars = text.chars().count(), "Extracted PDF text");
    Ok(text)
}

/// Whether the text carries anything worth reading aloud
pub fn has_content(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Borrow at most `max_chars` characters from the start of `text`
///
/// Counts Unicode scalar values, so multi-byte characters are never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
