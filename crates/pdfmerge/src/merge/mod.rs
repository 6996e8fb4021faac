//! PDF merging operations.
//!
//! This module provides the core PDF merging functionality with:
//! - Page concatenation in input order
//! - Flattening of inherited page attributes
//! - A fresh catalog and page tree for the output
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::merge::Merger;
//! use pdfmerge::validation::Validator;
//!
//! # fn example(a: Vec<u8>, b: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let validator = Validator::new();
//! let docs = vec![validator.validate(&a)?, validator.validate(&b)?];
//!
//! let merged = Merger::new().merge(&docs)?;
//! println!("Merged {} pages", merged.statistics.total_pages);
//! # Ok(())
//! # }
//! ```

pub mod merger;
pub mod pages;

pub use merger::{MIN_INPUTS, MergeStatistics, MergedPdf, Merger};
pub use pages::PageCollector;
