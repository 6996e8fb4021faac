//! Snapshots carry pending downloads across a service restart.

use pdfmerge::clock::Clock;
use pdfmerge::persist::Snapshot;
use pdfmerge::store::ArtifactStore;
use pdfmerge::ServiceConfig;
use std::time::Duration;
use tempfile::TempDir;

use crate::common::{page_widths, service, uploads};

#[test]
fn test_restart_keeps_live_downloads() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("artifacts.json");

    let config = ServiceConfig::default().with_ttl(Duration::from_secs(600));
    let (before, _clock) = service(config.clone());
    let receipt = before
        .process(&uploads(&[&[11, 12], &[21]]), Some("kept"))
        .unwrap();
    Snapshot::capture(&**before.store()).save(&path).unwrap();
    drop(before);

    let (after, clock) = service(config);
    clock.advance(Duration::from_secs(60));
    let report = Snapshot::load(&path)
        .unwrap()
        .restore_into(&**after.store(), clock.now());
    assert_eq!(report.restored, 1);

    let download = after.retrieve(receipt.id.as_str()).unwrap();
    assert_eq!(download.filename, "kept.pdf");
    assert_eq!(download.expires_at, receipt.expires_at);
    assert_eq!(page_widths(&download.bytes), vec![11, 12, 21]);
}

#[test]
fn test_restart_drops_expired_downloads() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("artifacts.json");

    let config = ServiceConfig::default().with_ttl(Duration::from_secs(60));
    let (before, _clock) = service(config.clone());
    let receipt = before.process(&uploads(&[&[1], &[2]]), None).unwrap();
    Snapshot::capture(&**before.store()).save(&path).unwrap();

    let (after, clock) = service(config);
    clock.advance(Duration::from_secs(61));
    let report = Snapshot::load(&path)
        .unwrap()
        .restore_into(&**after.store(), clock.now());

    assert_eq!(report.restored, 0);
    assert_eq!(report.expired, 1);
    assert!(after.store().is_empty());
    assert!(after.retrieve(receipt.id.as_str()).is_err());
}
