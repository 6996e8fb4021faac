//! Upload validation for pdfmerge.
//!
//! Every uploaded byte stream passes through [`Validator::validate`] before it
//! is allowed near the merger. The checks run in a fixed order and stop at
//! the first failure:
//!
//! 1. The stream is non-empty
//! 2. It starts with the `%PDF-` signature
//! 3. It parses as a PDF document
//! 4. It is not encrypted
//! 5. It has at least one page
//! 6. It does not exceed the page ceiling
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::validation::{Upload, Validator};
//!
//! # fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let validator = Validator::new();
//! let parsed = validator.validate(&bytes)?;
//! println!("PDF has {} pages", parsed.page_count);
//!
//! let uploads = vec![Upload::new(Some("a.pdf".into()), bytes)];
//! let summary = validator.validate_all(&uploads)?;
//! println!("{} pages total", summary.total_pages);
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use memchr::memmem;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_MAX_PAGES;
use crate::error::{PdfMergeError, Result, ValidationError};
use crate::io::PdfReader;
use crate::utils::{format_file_size, parse_pdf_version};

/// Byte signature every PDF starts with.
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

const TRAILER_KEYWORD: &[u8] = b"trailer";
const ENCRYPT_KEY: &[u8] = b"/Encrypt";

/// One uploaded file: the client-supplied name and the raw bytes.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied filename. Informational only.
    pub name: Option<String>,

    /// Raw uploaded bytes.
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Create an upload.
    pub fn new(name: Option<String>, bytes: Vec<u8>) -> Self {
        Self { name, bytes }
    }
}

/// A document that passed validation.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// The parsed document.
    pub document: Document,

    /// Number of pages.
    pub page_count: usize,

    /// PDF header version, e.g. "1.7".
    pub version: String,

    /// Size of the upload in bytes.
    pub byte_len: usize,
}

/// Per-upload details in a [`ValidationSummary`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Client-supplied filename.
    pub name: Option<String>,

    /// Number of pages.
    pub page_count: usize,

    /// PDF version (major, minor).
    pub version: Option<(u8, u8)>,

    /// Size of the upload in bytes.
    pub byte_len: u64,
}

/// Every parsed document of a request plus aggregate numbers.
#[derive(Debug, Clone)]
pub struct ValidationSummary {
    /// Parsed documents, in upload order.
    pub documents: Vec<ParsedDocument>,

    /// Per-upload details, in upload order.
    pub results: Vec<ValidationResult>,

    /// Total number of pages across all uploads.
    pub total_pages: usize,

    /// Total upload size in bytes.
    pub total_size: u64,
}

impl ValidationSummary {
    /// Format the total upload size as a human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Validator for uploaded PDF streams.
#[derive(Debug, Clone)]
pub struct Validator {
    max_pages: usize,
    reader: PdfReader,
}

impl Validator {
    /// Create a validator with the default page ceiling.
    pub fn new() -> Self {
        Self::with_max_pages(DEFAULT_MAX_PAGES)
    }

    /// Create a validator with a custom page ceiling.
    pub fn with_max_pages(max_pages: usize) -> Self {
        Self {
            max_pages,
            reader: PdfReader::new(),
        }
    }

    /// The page ceiling applied to each document.
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Validate a single uploaded byte stream.
    ///
    /// # Errors
    ///
    /// Returns the first failing check as a [`ValidationError`]:
    /// - `Empty` for a zero-length stream
    /// - `BadSignature` when the stream doesn't start with `%PDF-`
    /// - `Malformed` when parsing fails or the document has no pages
    /// - `Encrypted` when the document declares encryption
    /// - `TooManyPages` when the page count exceeds the ceiling
    pub fn validate(&self, bytes: &[u8]) -> std::result::Result<ParsedDocument, ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::Empty);
        }

        if !bytes.starts_with(PDF_SIGNATURE) {
            return Err(ValidationError::BadSignature);
        }

        let loaded = self.reader.load(bytes).map_err(|e| match e {
            ValidationError::Malformed { .. } if trailer_declares_encryption(bytes) => {
                ValidationError::Encrypted
            }
            other => other,
        })?;

        if loaded.document.is_encrypted() || loaded.document.trailer.has(b"Encrypt") {
            return Err(ValidationError::Encrypted);
        }

        if loaded.page_count == 0 {
            return Err(ValidationError::malformed("PDF has no pages"));
        }

        if loaded.page_count > self.max_pages {
            return Err(ValidationError::TooManyPages {
                pages: loaded.page_count,
                max: self.max_pages,
            });
        }

        debug!(
            pages = loaded.page_count,
            bytes = loaded.byte_len,
            version = %loaded.document.version,
            "Validated PDF"
        );

        Ok(ParsedDocument {
            version: loaded.document.version.clone(),
            page_count: loaded.page_count,
            byte_len: loaded.byte_len,
            document: loaded.document,
        })
    }

    /// Validate every upload of a request, in order.
    ///
    /// The first invalid upload rejects the whole request.
    ///
    /// # Errors
    ///
    /// Returns [`PdfMergeError::Validation`] naming the offending upload's
    /// position and filename.
    pub fn validate_all(&self, uploads: &[Upload]) -> Result<ValidationSummary> {
        let mut documents = Vec::with_capacity(uploads.len());
        let mut results = Vec::with_capacity(uploads.len());

        for (index, upload) in uploads.iter().enumerate() {
            let parsed = self
                .validate(&upload.bytes)
                .map_err(|source| PdfMergeError::validation(index, upload.name.clone(), source))?;

            results.push(ValidationResult {
                name: upload.name.clone(),
                page_count: parsed.page_count,
                version: parse_pdf_version(&parsed.version),
                byte_len: parsed.byte_len as u64,
            });
            documents.push(parsed);
        }

        let total_pages = results.iter().map(|r| r.page_count).sum();
        let total_size = results.iter().map(|r| r.byte_len).sum();

        Ok(ValidationSummary {
            documents,
            results,
            total_pages,
            total_size,
        })
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the last `trailer` dictionary of an unparseable file names an
/// `/Encrypt` entry. Stream content earlier in the file is never inspected.
fn trailer_declares_encryption(bytes: &[u8]) -> bool {
    memmem::rfind(bytes, TRAILER_KEYWORD)
        .is_some_and(|pos| memmem::find(&bytes[pos..], ENCRYPT_KEY).is_some())
}
