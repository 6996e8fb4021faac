//! Upload, download and expiry across the whole service.

use pdfmerge::ServiceConfig;
use pdfmerge::store::ArtifactStore;
use std::time::Duration;

use crate::common::{page_widths, service, uploads};

#[test]
fn test_two_documents_merge_in_order() {
    let (service, _clock) = service(ServiceConfig::default());

    let receipt = service
        .process(&uploads(&[&[101, 102, 103], &[201, 202]]), Some("report"))
        .unwrap();
    assert_eq!(receipt.statistics.total_pages, 5);
    assert_eq!(receipt.filename, "report.pdf");

    let download = service.retrieve(receipt.id.as_str()).unwrap();
    assert_eq!(page_widths(&download.bytes), vec![101, 102, 103, 201, 202]);
}

#[test]
fn test_same_document_twice() {
    let (service, _clock) = service(ServiceConfig::default());
    let request = uploads(&[&[300]]);
    let twice = vec![request[0].clone(), request[0].clone()];

    let receipt = service.process(&twice, None).unwrap();
    let download = service.retrieve(receipt.id.as_str()).unwrap();

    assert_eq!(page_widths(&download.bytes), vec![300, 300]);
}

#[test]
fn test_many_documents() {
    let (service, _clock) = service(ServiceConfig::default());
    let widths: Vec<Vec<i64>> = (0..10).map(|i| vec![100 + i, 200 + i]).collect();
    let docs: Vec<&[i64]> = widths.iter().map(Vec::as_slice).collect();

    let receipt = service.process(&uploads(&docs), None).unwrap();
    let download = service.retrieve(receipt.id.as_str()).unwrap();

    let expected: Vec<i64> = widths.into_iter().flatten().collect();
    assert_eq!(page_widths(&download.bytes), expected);
    assert_eq!(download.filename, "merged_document.pdf");
}

#[test]
fn test_download_is_repeatable_until_expiry() {
    let config = ServiceConfig::default().with_ttl(Duration::from_secs(600));
    let (service, clock) = service(config);
    let receipt = service.process(&uploads(&[&[1], &[2]]), None).unwrap();

    clock.advance(Duration::from_secs(300));
    assert!(service.retrieve(receipt.id.as_str()).is_ok());
    assert!(service.retrieve(receipt.id.as_str()).is_ok());

    clock.advance(Duration::from_secs(300));
    assert!(service.retrieve(receipt.id.as_str()).is_err());
}

#[test]
fn test_expired_artifacts_are_reclaimed_by_later_requests() {
    let config = ServiceConfig::default()
        .with_ttl(Duration::from_secs(60))
        .with_sweep_interval(Duration::from_secs(30));
    let (service, clock) = service(config);

    let first = service.process(&uploads(&[&[1], &[2]]), None).unwrap();
    assert_eq!(service.store().len(), 1);

    clock.advance(Duration::from_secs(120));
    let second = service.process(&uploads(&[&[3], &[4]]), None).unwrap();

    assert_eq!(service.store().len(), 1);
    assert_eq!(
        service.retrieve(first.id.as_str()).unwrap_err().code(),
        "NOT_FOUND"
    );
    assert!(service.retrieve(second.id.as_str()).is_ok());
}

#[test]
fn test_consume_on_read() {
    let config = ServiceConfig::default().with_consume_on_read(true);
    let (service, _clock) = service(config);
    let receipt = service.process(&uploads(&[&[1], &[2]]), None).unwrap();

    let download = service.retrieve(receipt.id.as_str()).unwrap();
    assert_eq!(page_widths(&download.bytes), vec![1, 2]);
    assert!(service.retrieve(receipt.id.as_str()).is_err());
    assert!(service.store().is_empty());
}

#[test]
fn test_concurrent_requests() {
    let (service, _clock) = service(ServiceConfig::default());
    let service = std::sync::Arc::new(service);

    let handles: Vec<_> = (1..=8i64)
        .map(|i| {
            let service = std::sync::Arc::clone(&service);
            std::thread::spawn(move || {
                let receipt = service
                    .process(&uploads(&[&[i], &[i + 100]]), None)
                    .unwrap();
                let download = service.retrieve(receipt.id.as_str()).unwrap();
                (i, page_widths(&download.bytes))
            })
        })
        .collect();

    for handle in handles {
        let (i, widths) = handle.join().unwrap();
        assert_eq!(widths, vec![i, i + 100]);
    }
    assert_eq!(service.store().len(), 8);
}
