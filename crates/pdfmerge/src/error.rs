//! Error types for pdfmerge.
//!
//! Every rejected request produces a typed error value carrying a stable
//! machine-readable code (see [`PdfMergeError::code`]) and a message that
//! tells the user what to do about it.
//!
//! # Error Categories
//!
//! - **Validation Errors**: an uploaded stream is empty, not a PDF, corrupted,
//!   encrypted, or too large
//! - **Merge Errors**: not enough inputs, or the output could not be produced
//! - **Store Errors**: an artifact is unknown or has expired
//! - **Persist Errors**: a store snapshot could not be read or written

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for pdfmerge operations.
pub type Result<T> = std::result::Result<T, PdfMergeError>;

/// Reasons an uploaded stream is rejected before merging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The stream contained no bytes.
    #[error("File is empty")]
    Empty,

    /// The stream does not start with the `%PDF-` signature.
    #[error("File is not a PDF document (missing %PDF- header)")]
    BadSignature,

    /// The stream has a PDF header but its structure could not be read.
    #[error("PDF is corrupted or unreadable: {details}")]
    Malformed {
        /// What the parser tripped over.
        details: String,
    },

    /// The document is encrypted or password protected.
    #[error(
        "PDF is encrypted or password protected\n  \
         Hint: Remove the password (e.g. 'qpdf --decrypt') and upload it again"
    )]
    Encrypted,

    /// The document exceeds the configured page ceiling.
    #[error("PDF has {pages} pages, which exceeds the limit of {max}")]
    TooManyPages {
        /// Pages in the rejected document.
        pages: usize,
        /// Configured ceiling.
        max: usize,
    },
}

impl ValidationError {
    /// Create a Malformed error.
    pub fn malformed(details: impl Into<String>) -> Self {
        Self::Malformed {
            details: details.into(),
        }
    }

    /// Stable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::BadSignature => "BAD_SIGNATURE",
            Self::Malformed { .. } => "MALFORMED",
            Self::Encrypted => "ENCRYPTED",
            Self::TooManyPages { .. } => "TOO_MANY_PAGES",
        }
    }
}

/// Failures while combining validated documents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// Fewer than two documents were supplied.
    #[error("Need at least 2 PDF files to merge, got {provided}")]
    InsufficientInputs {
        /// Number of documents actually supplied.
        provided: usize,
    },

    /// The merged document could not be assembled or serialized.
    #[error("Failed to write merged PDF: {reason}")]
    WriteFailed {
        /// Description of what went wrong.
        reason: String,
    },
}

impl MergeError {
    /// Create a WriteFailed error.
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            reason: reason.into(),
        }
    }

    /// Stable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientInputs { .. } => "INSUFFICIENT_INPUTS",
            Self::WriteFailed { .. } => "WRITE_FAILED",
        }
    }
}

/// Failures of artifact store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No artifact exists under this id.
    #[error("File not found or has expired: {id}")]
    NotFound {
        /// Requested id.
        id: String,
    },

    /// The artifact exists but its expiration time has passed.
    #[error("File has expired: {id}")]
    Expired {
        /// Requested id.
        id: String,
    },

    /// The requested time-to-live is zero or out of range.
    #[error("Artifact time-to-live must be positive and representable")]
    InvalidTtl,
}

impl StoreError {
    /// Create a NotFound error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Stable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Expired { .. } => "EXPIRED",
            Self::InvalidTtl => "INVALID_TTL",
        }
    }
}

/// Failures reading or writing a store snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The snapshot file could not be read or written.
    #[error("Snapshot I/O failed for {}: {source}", path.display())]
    Io {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The snapshot file is not valid JSON of the expected shape.
    #[error("Snapshot {} is not valid: {source}", path.display())]
    Json {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// Main error type for pdfmerge operations.
#[derive(Debug)]
pub enum PdfMergeError {
    /// One of the uploads failed validation; the whole request is rejected.
    Validation {
        /// Zero-based position of the upload in the request.
        index: usize,
        /// Client-supplied filename, if any.
        name: Option<String>,
        /// Why it was rejected.
        source: ValidationError,
    },

    /// Merging failed.
    Merge(MergeError),

    /// A store operation failed.
    Store(StoreError),

    /// Snapshot persistence failed.
    Persist(PersistError),

    /// Invalid configuration.
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },
}

impl fmt::Display for PdfMergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation {
                index,
                name: Some(name),
                source,
            } => {
                write!(f, "Invalid PDF file {name} (#{}): {source}", index + 1)
            }
            Self::Validation {
                index,
                name: None,
                source,
            } => {
                write!(f, "Invalid PDF file #{}: {source}", index + 1)
            }
            Self::Merge(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "{err}"),
            Self::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {message}")
            }
        }
    }
}

impl std::error::Error for PdfMergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation { source, .. } => Some(source),
            Self::Merge(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::InvalidConfig { .. } => None,
        }
    }
}

impl From<MergeError> for PdfMergeError {
    fn from(err: MergeError) -> Self {
        Self::Merge(err)
    }
}

impl From<StoreError> for PdfMergeError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<PersistError> for PdfMergeError {
    fn from(err: PersistError) -> Self {
        Self::Persist(err)
    }
}

impl PdfMergeError {
    /// Create a Validation error for the upload at `index`.
    pub fn validation(index: usize, name: Option<String>, source: ValidationError) -> Self {
        Self::Validation {
            index,
            name,
            source,
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Stable machine-readable code, e.g. `BAD_SIGNATURE` or `NOT_FOUND`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { source, .. } => source.code(),
            Self::Merge(err) => err.code(),
            Self::Store(err) => err.code(),
            Self::Persist(_) => "PERSIST_FAILED",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
        }
    }

    /// Check if the error was caused by the request rather than the server.
    ///
    /// Client errors should be fixed by resubmitting different input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Merge(MergeError::InsufficientInputs { .. })
                | Self::Store(StoreError::NotFound { .. } | StoreError::Expired { .. })
        )
    }
}
