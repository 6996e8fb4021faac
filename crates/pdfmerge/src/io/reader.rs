//! Parsing uploaded byte streams into PDF documents.

use lopdf::Document;
use std::time::{Duration, Instant};

use crate::error::ValidationError;

/// A parsed PDF document with load metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Time taken to parse the document.
    pub load_time: Duration,

    /// Size of the source buffer in bytes.
    pub byte_len: usize,
}

/// PDF reader over in-memory buffers.
#[derive(Debug, Clone, Default)]
pub struct PdfReader;

impl PdfReader {
    /// Create a new PDF reader.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PDF document from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Encrypted`] when the parser gives up because
    /// of encryption, and [`ValidationError::Malformed`] for any other parse
    /// failure.
    pub fn load(&self, bytes: &[u8]) -> Result<LoadedPdf, ValidationError> {
        let start = Instant::now();

        let document = Document::load_mem(bytes).map_err(|e| {
            let err_msg = e.to_string();
            if mentions_encryption(&err_msg) {
                ValidationError::Encrypted
            } else {
                ValidationError::malformed(err_msg)
            }
        })?;

        let page_count = document.get_pages().len();

        Ok(LoadedPdf {
            document,
            page_count,
            load_time: start.elapsed(),
            byte_len: bytes.len(),
        })
    }
}

/// Whether a parser error message points at encryption.
pub(crate) fn mentions_encryption(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("encrypt") || message.contains("decrypt") || message.contains("password")
}
