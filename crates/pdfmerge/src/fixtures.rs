//! In-memory PDF builders shared by unit tests.

use lopdf::{Document, Object, Stream, dictionary};

/// Build a document with one page per entry in `widths`.
///
/// Each page gets an explicit MediaBox of `[0 0 width 792]`; the font
/// resources live on the Pages root and are only reachable by inheritance.
pub(crate) fn document_with_widths(widths: &[i64]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for (i, &width) in widths.iter().enumerate() {
        let content = format!("BT /F1 12 Tf 72 712 Td (Page {}) Tj ET", i + 1);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(792),
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
            "Resources" => resources_id,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// A one-page PDF whose only content stream is `content`.
pub(crate) fn pdf_bytes_with_content(content: &str) -> Vec<u8> {
    let mut doc = document_with_widths(&[612]);
    let page_id = doc.page_iter().next().expect("fixture has a page");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
    if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
        page.set("Contents", content_id);
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize fixture");
    bytes
}

/// Serialize a document built by [`document_with_widths`].
pub(crate) fn pdf_bytes(widths: &[i64]) -> Vec<u8> {
    let mut doc = document_with_widths(widths);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize fixture");
    bytes
}

/// A one-page document whose trailer declares standard security.
pub(crate) fn encrypted_pdf_bytes() -> Vec<u8> {
    let mut doc = document_with_widths(&[612]);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "P" => -4,
        "O" => Object::string_literal(vec![0x41u8; 32]),
        "U" => Object::string_literal(vec![0x42u8; 32]),
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.trailer.set(
        "ID",
        vec![
            Object::string_literal(vec![0x01u8; 16]),
            Object::string_literal(vec![0x01u8; 16]),
        ],
    );

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize encrypted fixture");
    bytes
}

/// MediaBox widths of every page, in page order.
pub(crate) fn page_widths(doc: &Document) -> Vec<i64> {
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
