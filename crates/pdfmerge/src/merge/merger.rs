//! Core PDF merging implementation.
//!
//! Pages from every input are concatenated, in input order, under a single
//! new page tree. Document-level structures of the inputs (outlines, forms,
//! metadata) are not carried over; the output catalog only references the
//! new page tree.

use lopdf::{Document, Object, ObjectId, dictionary};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::MergeError;
use crate::io::PdfWriter;
use crate::merge::pages::PageCollector;
use crate::utils::{format_file_size, parse_pdf_version};
use crate::validation::ParsedDocument;

/// Minimum number of documents a merge accepts.
pub const MIN_INPUTS: usize = 2;

const FALLBACK_VERSION: &str = "1.5";

/// Statistics about a merge operation.
#[derive(Debug, Clone)]
pub struct MergeStatistics {
    /// Number of documents merged.
    pub files_merged: usize,

    /// Total number of pages in the merged document.
    pub total_pages: usize,

    /// Total size of the input documents.
    pub input_size: u64,

    /// Size of the serialized output.
    pub output_size: u64,

    /// Total time taken for the merge, serialization included.
    pub merge_time: Duration,

    /// Whether compression was applied.
    pub compressed: bool,
}

impl MergeStatistics {
    /// Format input size as human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }

    /// Format output size as human-readable string.
    pub fn format_output_size(&self) -> String {
        format_file_size(self.output_size)
    }
}

/// Result of a merge operation.
#[derive(Debug, Clone)]
pub struct MergedPdf {
    /// The serialized merged document.
    pub bytes: Vec<u8>,

    /// Statistics about the merge.
    pub statistics: MergeStatistics,
}

/// PDF merger that combines multiple documents.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    /// Page collector for page tree operations.
    page_collector: PageCollector,

    /// Writer for serializing the output.
    writer: PdfWriter,
}

impl Merger {
    /// Create a new merger with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a merger that serializes with a custom writer.
    pub fn with_writer(writer: PdfWriter) -> Self {
        Self {
            page_collector: PageCollector::new(),
            writer,
        }
    }

    /// Merge validated documents into one serialized PDF.
    ///
    /// The output's page count equals the sum of the inputs' page counts and
    /// its pages appear in input order, each input's pages in their original
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Fewer than two documents are supplied
    /// - The page tree cannot be assembled
    /// - Serialization fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfmerge::merge::Merger;
    /// # use pdfmerge::validation::ParsedDocument;
    /// # fn example(docs: Vec<ParsedDocument>) -> Result<(), Box<dyn std::error::Error>> {
    /// let merger = Merger::new();
    /// let merged = merger.merge(&docs)?;
    /// println!("Merged {} files into {} pages",
    ///          merged.statistics.files_merged,
    ///          merged.statistics.total_pages);
    /// # Ok(())
    /// # }
    /// ```
    pub fn merge(&self, documents: &[ParsedDocument]) -> Result<MergedPdf, MergeError> {
        if documents.len() < MIN_INPUTS {
            return Err(MergeError::InsufficientInputs {
                provided: documents.len(),
            });
        }

        let merge_start = Instant::now();

        let document = self.merge_documents(documents)?;
        let total_pages = document.get_pages().len();

        let expected_pages: usize = documents.iter().map(|d| d.page_count).sum();
        if total_pages != expected_pages {
            return Err(MergeError::write_failed(format!(
                "Merged document has {total_pages} pages, expected {expected_pages}"
            )));
        }

        let written = self.writer.write(document)?;

        let statistics = MergeStatistics {
            files_merged: documents.len(),
            total_pages,
            input_size: documents.iter().map(|d| d.byte_len as u64).sum(),
            output_size: written.bytes.len() as u64,
            merge_time: merge_start.elapsed(),
            compressed: written.compressed,
        };

        debug!(
            files = statistics.files_merged,
            pages = statistics.total_pages,
            input = %statistics.format_input_size(),
            output = %statistics.format_output_size(),
            "Merged documents"
        );

        Ok(MergedPdf {
            bytes: written.bytes,
            statistics,
        })
    }

    /// Combine documents into a single in-memory document.
    ///
    /// Source documents are cloned; the inputs are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if a page of some input cannot be re-parented.
    pub fn merge_documents(&self, documents: &[ParsedDocument]) -> Result<Document, MergeError> {
        let mut merged = Document::with_version(highest_version(documents));
        let pages_id = merged.new_object_id();
        let mut kids: Vec<Object> = Vec::new();

        for parsed in documents {
            let mut doc = parsed.document.clone();

            // Renumber objects to avoid ID conflicts
            doc.renumber_objects_with(merged.max_id + 1);

            let page_ids = self.page_collector.page_ids(&doc);
            for &page_id in &page_ids {
                self.page_collector.detach_page(&mut doc, page_id, pages_id)?;
            }

            merged.max_id = merged.max_id.max(doc.max_id);
            merged.objects.extend(doc.objects);
            kids.extend(page_ids.into_iter().map(Object::Reference));
        }

        self.build_catalog(&mut merged, pages_id, kids);

        // Drops the inputs' old catalogs, page tree nodes and info dictionaries
        merged.prune_objects();
        merged.renumber_objects();

        Ok(merged)
    }

    fn build_catalog(&self, merged: &mut Document, pages_id: ObjectId, kids: Vec<Object>) {
        let count = kids.len() as i64;
        merged.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = merged.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        merged.trailer.set("Root", catalog_id);
    }
}

/// The highest PDF version among `documents`, as a header string.
fn highest_version(documents: &[ParsedDocument]) -> String {
    documents
        .iter()
        .filter_map(|d| parse_pdf_version(&d.version).map(|v| (v, d.version.trim())))
        .max_by_key(|(v, _)| *v)
        .map(|(_, s)| s.to_string())
        .unwrap_or_else(|| FALLBACK_VERSION.to_string())
}
