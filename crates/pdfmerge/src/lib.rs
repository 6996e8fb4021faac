//! pdfmerge - Merge uploaded PDF files into a temporarily downloadable document.
//!
//! This library implements the upload, merge, store and retrieve workflow
//! behind the `pdfmerge-server` binary. It provides:
//!
//! - Validation of uploaded byte streams (signature, structure, encryption,
//!   page ceiling)
//! - Page concatenation in input order with inherited attributes flattened
//! - A time-limited artifact store with unguessable identifiers
//! - Opportunistic and periodic sweeping of expired artifacts
//! - Snapshots that carry pending downloads across restarts
//!
//! # Examples
//!
//! ## Upload and Download
//!
//! ```no_run
//! use pdfmerge::{MergeService, ServiceConfig};
//! use pdfmerge::clock::SystemClock;
//! use pdfmerge::validation::Upload;
//! use std::sync::Arc;
//!
//! # fn example(a: Vec<u8>, b: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let service = MergeService::in_memory(ServiceConfig::default(), Arc::new(SystemClock))?;
//!
//! let uploads = vec![Upload::new(None, a), Upload::new(None, b)];
//! let receipt = service.process(&uploads, Some("combined"))?;
//! println!("Download at /download/{}", receipt.id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Individual Components
//!
//! ```no_run
//! use pdfmerge::merge::Merger;
//! use pdfmerge::validation::Validator;
//!
//! # fn example(a: Vec<u8>, b: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let validator = Validator::with_max_pages(500);
//! let docs = vec![validator.validate(&a)?, validator.validate(&b)?];
//!
//! let merged = Merger::new().merge(&docs)?;
//! std::fs::write("merged.pdf", &merged.bytes)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod persist;
pub mod service;
pub mod store;
pub mod sweeper;
pub mod utils;
pub mod validation;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used types
pub use config::{ExpiryPolicy, ServiceConfig};
pub use error::{MergeError, PdfMergeError, PersistError, Result, StoreError, ValidationError};
pub use service::{Download, MergeReceipt, MergeService};
pub use store::{Artifact, ArtifactId, ArtifactStore, InMemoryStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
