//! Text extraction from uploaded documents.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::{debug, warn};

use docqa_core::{Error, Result};

/// Upload formats recognised by the ingest pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Unsupported,
}

impl FileType {
    /// Detect file type from extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            _ => Self::Unsupported,
        }
    }

    pub fn from_filename(name: &str) -> Self {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unsupported)
    }
}

/// Extract the full text of a PDF, pages concatenated in document order.
///
/// Fails when the bytes are not a readable PDF or the document has no text
/// layer (e.g. scanned images only).
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    // The parser can panic on malformed input; report that as a bad document.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    let text = match outcome {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return Err(Error::Extraction(format!("unreadable PDF: {}", e))),
        Err(_) => {
            warn!("PDF parser panicked on a {} byte upload", bytes.len());
            return Err(Error::Extraction("malformed PDF".into()));
        }
    };

    if text.trim().is_empty() {
        return Err(Error::Extraction("PDF has no extractable text layer".into()));
    }
    debug!("Extracted {} characters from PDF", text.chars().count());
    Ok(text)
}

/// Read a PDF from disk and extract its text.
pub fn extract_pdf_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::Extraction(format!("cannot read {}: {}", path.display(), e)))?;
    extract_pdf_text(&bytes)
}
