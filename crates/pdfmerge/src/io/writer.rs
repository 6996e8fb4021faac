//! PDF serialization and atomic file writes.

use lopdf::Document;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::MergeError;

/// Options for serializing PDF documents.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Compress streams before serializing.
    pub compress: bool,

    /// Initial capacity of the output buffer (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress: true,
            buffer_size: 64 * 1024,
        }
    }
}

/// A serialized PDF document.
#[derive(Debug, Clone)]
pub struct WrittenPdf {
    /// The serialized document.
    pub bytes: Vec<u8>,

    /// Time taken to serialize.
    pub write_time: Duration,

    /// Whether compression was applied.
    pub compressed: bool,
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Create a writer without compression (faster but larger output).
    pub fn without_compression() -> Self {
        Self {
            options: WriteOptions {
                compress: false,
                ..Default::default()
            },
        }
    }

    /// Serialize a document into a byte buffer.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::WriteFailed`] if serialization fails or produces
    /// an empty buffer.
    pub fn write(&self, mut doc: Document) -> Result<WrittenPdf, MergeError> {
        let start = Instant::now();

        if self.options.compress {
            doc.compress();
        }

        let mut bytes = Vec::with_capacity(self.options.buffer_size);
        doc.save_to(&mut bytes)
            .map_err(|e| MergeError::write_failed(e.to_string()))?;

        if bytes.is_empty() {
            return Err(MergeError::write_failed("serializer produced no output"));
        }

        Ok(WrittenPdf {
            bytes,
            write_time: start.elapsed(),
            compressed: self.options.compress,
        })
    }
}

/// Write `bytes` to `path` through a temporary sibling file and a rename.
///
/// Readers of `path` see either the previous contents or the new contents,
/// never a partial write.
///
/// # Errors
///
/// Returns the underlying I/O error if the temporary file cannot be created,
/// written, synced or renamed into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp_path = path.with_extension("tmp");

    let result = (|| {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}
