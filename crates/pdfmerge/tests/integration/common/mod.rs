//! Shared fixtures for the integration tests.
//!
//! PDFs are generated in memory so the suite needs no files on disk. Every
//! page gets a distinct MediaBox width, which makes page order observable in
//! the merged output.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use lopdf::{Document, Object, Stream, dictionary};
use pdfmerge::clock::ManualClock;
use pdfmerge::validation::Upload;
use pdfmerge::{InMemoryStore, MergeService, ServiceConfig};
use std::sync::Arc;

/// Fixed start time for every test clock.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

/// Serialize a PDF with one page per entry in `widths`.
pub fn pdf_with_widths(widths: &[i64]) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids: Vec<Object> = Vec::new();
    for (i, &width) in widths.iter().enumerate() {
        let content = format!("BT /F1 18 Tf 50 700 Td (Page {}) Tj ET", i + 1);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(842),
            ],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize fixture");
    bytes
}

/// One upload per entry, named `doc0.pdf`, `doc1.pdf`, ...
pub fn uploads(docs: &[&[i64]]) -> Vec<Upload> {
    docs.iter()
        .enumerate()
        .map(|(i, widths)| Upload::new(Some(format!("doc{i}.pdf")), pdf_with_widths(widths)))
        .collect()
}

/// A service over a fresh in-memory store and a manual clock.
pub fn service(config: ServiceConfig) -> (MergeService<InMemoryStore>, ManualClock) {
    let clock = ManualClock::new(start_time());
    let service = MergeService::in_memory(config, Arc::new(clock.clone()))
        .expect("Failed to build service");
    (service, clock)
}

/// Page widths of a serialized PDF, in page order.
pub fn page_widths(bytes: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(bytes).expect("Merged output must parse");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_dictionary(page_id).expect("page dictionary");
            let media_box = page
                .get(b"MediaBox")
                .and_then(Object::as_array)
                .expect("page MediaBox");
            media_box[2].as_float().expect("numeric width") as i64
        })
        .collect()
}
