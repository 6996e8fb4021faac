//! PDF loading and serialization.
//!
//! Everything here works on in-memory byte buffers. Uploaded streams are
//! parsed by [`PdfReader`]; merged documents are serialized by [`PdfWriter`].
//! [`write_atomic`] is the one place that touches the filesystem, used when
//! persisting store snapshots.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::io::{PdfReader, PdfWriter};
//!
//! # fn example(bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let loaded = reader.load(bytes)?;
//!
//! let writer = PdfWriter::new();
//! let written = writer.write(loaded.document)?;
//! println!("{} bytes", written.bytes.len());
//! # Ok(())
//! # }
//! ```

pub mod reader;
pub mod writer;

pub use reader::{LoadedPdf, PdfReader};
pub use writer::{PdfWriter, WriteOptions, WrittenPdf, write_atomic};
