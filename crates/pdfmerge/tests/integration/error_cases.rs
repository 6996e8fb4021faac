//! Integration tests for error handling and edge cases.

use lopdf::{Object, dictionary};
use pdfmerge::store::ArtifactStore;
use pdfmerge::validation::Upload;
use pdfmerge::{PdfMergeError, ServiceConfig, StoreError, ValidationError};

use crate::common::{pdf_with_widths, service, uploads};

fn encrypted_pdf() -> Vec<u8> {
    let mut doc = lopdf::Document::load_mem(&pdf_with_widths(&[612])).unwrap();
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "P" => -44,
        "O" => Object::string_literal(vec![0x11u8; 32]),
        "U" => Object::string_literal(vec![0x22u8; 32]),
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.trailer.set(
        "ID",
        vec![
            Object::string_literal(vec![0x33u8; 16]),
            Object::string_literal(vec![0x33u8; 16]),
        ],
    );

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn rejected_with(request: Vec<Upload>) -> (usize, ValidationError) {
    let (service, _clock) = service(ServiceConfig::default());
    let err = service.process(&request, None).unwrap_err();
    assert!(err.is_client_error());
    assert!(service.store().is_empty(), "Nothing may be stored on rejection");

    match err {
        PdfMergeError::Validation { index, source, .. } => (index, source),
        other => panic!("Expected a validation error, got {other:?}"),
    }
}

#[test]
fn test_error_single_upload() {
    let (service, _clock) = service(ServiceConfig::default());
    let err = service.process(&uploads(&[&[612]]), None).unwrap_err();

    assert_eq!(err.code(), "INSUFFICIENT_INPUTS");
    assert!(err.to_string().contains("at least 2"));
    assert!(service.store().is_empty());
}

#[test]
fn test_error_no_uploads() {
    let (service, _clock) = service(ServiceConfig::default());
    let err = service.process(&[], Some("ignored")).unwrap_err();
    assert_eq!(err.code(), "INSUFFICIENT_INPUTS");
}

#[test]
fn test_error_non_pdf_second_upload() {
    let mut request = uploads(&[&[612]]);
    request.push(Upload::new(Some("B.txt".into()), b"plain text".to_vec()));

    let (index, source) = rejected_with(request);
    assert_eq!(index, 1);
    assert_eq!(source, ValidationError::BadSignature);
}

#[test]
fn test_error_empty_upload() {
    let mut request = uploads(&[&[612]]);
    request.insert(0, Upload::new(Some("empty.pdf".into()), Vec::new()));

    let (index, source) = rejected_with(request);
    assert_eq!(index, 0);
    assert_eq!(source, ValidationError::Empty);
}

#[test]
fn test_error_truncated_upload() {
    let mut request = uploads(&[&[612], &[595]]);
    let full = pdf_with_widths(&[612, 612]);
    request.push(Upload::new(Some("cut.pdf".into()), full[..full.len() / 4].to_vec()));

    let (index, source) = rejected_with(request);
    assert_eq!(index, 2);
    assert_eq!(source.code(), "MALFORMED");
}

#[test]
fn test_error_encrypted_upload() {
    let mut request = uploads(&[&[612]]);
    request.push(Upload::new(Some("locked.pdf".into()), encrypted_pdf()));

    let (index, source) = rejected_with(request);
    assert_eq!(index, 1);
    assert_eq!(source, ValidationError::Encrypted);
}

#[test]
fn test_error_page_ceiling() {
    let (service, _clock) = service(ServiceConfig::default().with_max_pages(3));
    let err = service
        .process(&uploads(&[&[1, 2, 3], &[4, 5, 6, 7]]), None)
        .unwrap_err();

    match err {
        PdfMergeError::Validation { index, source, .. } => {
            assert_eq!(index, 1);
            assert_eq!(source, ValidationError::TooManyPages { pages: 4, max: 3 });
        }
        other => panic!("Expected a validation error, got {other:?}"),
    }
}

#[test]
fn test_first_failure_wins() {
    let request = vec![
        Upload::new(Some("a.pdf".into()), pdf_with_widths(&[612])),
        Upload::new(Some("b.pdf".into()), b"%PDF-1.4 broken".to_vec()),
        Upload::new(Some("c.pdf".into()), Vec::new()),
    ];

    let (index, source) = rejected_with(request);
    assert_eq!(index, 1);
    assert_eq!(source.code(), "MALFORMED");
}

#[test]
fn test_unknown_and_malformed_ids() {
    let (service, _clock) = service(ServiceConfig::default());

    for id in [
        "0123456789abcdef0123456789abcdef",
        "",
        "../../etc/passwd",
        "not-an-id",
    ] {
        let err = service.retrieve(id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }), "id {id:?}");
    }
}

#[test]
fn test_hostile_output_filename() {
    let (service, _clock) = service(ServiceConfig::default());
    let receipt = service
        .process(&uploads(&[&[1], &[2]]), Some("../../evil\"name\r\n.pdf"))
        .unwrap();

    assert_eq!(receipt.filename, "evilname_.pdf");
    assert!(!receipt.filename.contains('/'));
    assert!(!receipt.filename.contains('"'));
}
