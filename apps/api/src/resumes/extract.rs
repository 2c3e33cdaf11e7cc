//! Text Extractor: PDF bytes to plain text plus page count.
//!
//! Parsing is CPU-bound and runs on the blocking pool under a wall-clock
//! bound. A blocking task cannot be cancelled: on timeout its eventual result
//! is dropped and the caller's buffers are released.

use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not read PDF: {0}")]
    Unreadable(String),

    #[error("extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct ExtractedPdf {
    pub text: String,
    pub num_pages: usize,
}

pub async fn extract_pdf(data: Bytes, limit: Duration) -> Result<ExtractedPdf, ExtractError> {
    let extracted = run_bounded(limit, move || extract_pdf_sync(&data)).await?;
    debug!(
        "Extracted {} chars from {} page(s)",
        extracted.text.len(),
        extracted.num_pages
    );
    Ok(extracted)
}

async fn run_bounded<T, F>(limit: Duration, f: F) -> Result<T, ExtractError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ExtractError> + Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(f)).await {
        Ok(joined) => joined?,
        Err(_) => Err(ExtractError::Timeout(limit)),
    }
}

fn extract_pdf_sync(data: &[u8]) -> Result<ExtractedPdf, ExtractError> {
    let document =
        lopdf::Document::load_mem(data).map_err(|e| ExtractError::Unreadable(e.to_string()))?;
    let num_pages = document.get_pages().len();

    let text = pdf_extract::extract_text_from_mem(data)
        .map_err(|e| ExtractError::Unreadable(e.to_string()))?;

    Ok(ExtractedPdf {
        text: text.trim().to_string(),
        num_pages,
    })
}

/// True when the buffer starts with the PDF header.
pub fn looks_like_pdf(data: &[u8]) -> bool {
    data.starts_with(b"%PDF-")
}
