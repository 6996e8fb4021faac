//! Request-level orchestration.
//!
//! [`MergeService`] ties the pieces together: an upload request is validated,
//! merged and stored; a download request looks the artifact up. Both paths
//! give the sweep gate a chance to reclaim expired artifacts first.
//!
//! # Examples
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
//! let uploads = vec![
//!     Upload::new(Some("a.pdf".into()), a),
//!     Upload::new(Some("b.pdf".into()), b),
//! ];
//! let receipt = service.process(&uploads, Some("report"))?;
//!
//! let download = service.retrieve(receipt.id.as_str())?;
//! assert_eq!(download.filename, "report.pdf");
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::ServiceConfig;
use crate::error::{MergeError, Result, StoreError};
use crate::io::{PdfWriter, WriteOptions};
use crate::merge::{MIN_INPUTS, MergeStatistics, Merger};
use crate::store::{ArtifactId, ArtifactStore, InMemoryStore};
use crate::sweeper::SweepGate;
use crate::utils::output_filename;
use crate::validation::{Upload, Validator};

/// Outcome of a successful upload request.
#[derive(Debug, Clone)]
pub struct MergeReceipt {
    /// Id under which the merged PDF can be downloaded.
    pub id: ArtifactId,

    /// Download filename.
    pub filename: String,

    /// When the download stops being available.
    pub expires_at: DateTime<Utc>,

    /// Statistics about the merge.
    pub statistics: MergeStatistics,
}

/// A retrieved artifact, ready to be sent to the client.
#[derive(Debug, Clone)]
pub struct Download {
    /// The merged PDF bytes.
    pub bytes: Arc<[u8]>,

    /// Download filename.
    pub filename: String,

    /// When the artifact expires.
    pub expires_at: DateTime<Utc>,
}

/// Upload, merge, store and retrieve.
pub struct MergeService<S: ArtifactStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    validator: Validator,
    merger: Merger,
    sweep_gate: SweepGate,
    config: ServiceConfig,
}

impl MergeService<InMemoryStore> {
    /// Create a service backed by a fresh [`InMemoryStore`].
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn in_memory(config: ServiceConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = Arc::new(InMemoryStore::with_policy(
            Arc::clone(&clock),
            config.expiry_policy,
        ));
        Self::new(store, clock, config)
    }
}

impl<S: ArtifactStore> MergeService<S> {
    /// Create a service over an existing store.
    ///
    /// `clock` should be the same clock the store uses.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: ServiceConfig) -> Result<Self> {
        config.validate()?;

        let writer = PdfWriter::with_options(WriteOptions {
            compress: config.compress_output,
            ..Default::default()
        });

        Ok(Self {
            sweep_gate: SweepGate::new(config.sweep_interval, clock.now()),
            validator: Validator::with_max_pages(config.max_pages),
            merger: Merger::with_writer(writer),
            store,
            clock,
            config,
        })
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The active configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Validate, merge and store an upload request.
    ///
    /// `desired_name` is sanitized; when it is missing or unusable the
    /// configured default name is used. The stored filename always ends in
    /// `.pdf`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Fewer than two uploads were supplied
    /// - Any upload fails validation (the first failure is reported)
    /// - The merge or the store insert fails
    ///
    /// Nothing is stored when an error is returned.
    pub fn process(&self, uploads: &[Upload], desired_name: Option<&str>) -> Result<MergeReceipt> {
        self.sweep_gate.maybe_sweep(&*self.store, self.clock.now());

        if uploads.len() < MIN_INPUTS {
            warn!(op = "merge.reject", files = uploads.len(), "Not enough files");
            return Err(MergeError::InsufficientInputs {
                provided: uploads.len(),
            }
            .into());
        }

        let summary = self.validator.validate_all(uploads).inspect_err(|e| {
            warn!(op = "merge.reject", code = e.code(), error = %e, "Upload rejected");
        })?;

        let merged = self.merger.merge(&summary.documents)?;
        let filename = output_filename(desired_name, &self.config.default_output_name);

        let stored = self
            .store
            .insert(merged.bytes, filename.clone(), self.config.ttl)?;
        let (id, expires_at) = (stored.id.clone(), stored.expires_at);

        info!(
            op = "merge.stored",
            id = id.short(),
            files = merged.statistics.files_merged,
            pages = merged.statistics.total_pages,
            size = %merged.statistics.format_output_size(),
            filename = %filename,
            "Merged upload stored"
        );

        Ok(MergeReceipt {
            id,
            filename,
            expires_at,
            statistics: merged.statistics,
        })
    }

    /// Fetch a stored artifact for download.
    ///
    /// With consume-on-read enabled the artifact is removed after this call
    /// succeeds, so a second retrieval reports it as not found.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] or [`StoreError::Expired`].
    pub fn retrieve(&self, id: &str) -> std::result::Result<Download, StoreError> {
        self.sweep_gate.maybe_sweep(&*self.store, self.clock.now());

        let artifact = if self.config.consume_on_read {
            let artifact = self.store.lookup(id)?;
            self.store
                .remove(id)
                .ok_or_else(|| StoreError::not_found(id))?;
            artifact
        } else {
            self.store.lookup(id)?
        };

        info!(
            op = "download",
            id = artifact.id.short(),
            bytes = artifact.size(),
            consumed = self.config.consume_on_read,
            "Serving artifact"
        );

        Ok(Download {
            bytes: Arc::clone(&artifact.bytes),
            filename: artifact.filename.clone(),
            expires_at: artifact.expires_at,
        })
    }

    /// Sweep expired artifacts now, regardless of the sweep interval.
    pub fn sweep_now(&self) -> usize {
        self.store.sweep(self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::ExpiryPolicy;
    use crate::fixtures;
    use chrono::TimeZone;
    use lopdf::Document;
    use std::time::Duration;

    fn service(config: ServiceConfig) -> (MergeService<InMemoryStore>, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        let service = MergeService::in_memory(config, Arc::new(clock.clone())).unwrap();
        (service, clock)
    }

    fn uploads(docs: &[&[i64]]) -> Vec<Upload> {
        docs.iter()
            .enumerate()
            .map(|(i, widths)| Upload::new(Some(format!("{i}.pdf")), fixtures::pdf_bytes(widths)))
            .collect()
    }

    #[test]
    fn process_succeeds_when_ttl_elapses_during_insert() {
        // Every reading of this clock is one second later than the last
        struct SteppingClock(parking_lot::Mutex<DateTime<Utc>>);

        impl Clock for SteppingClock {
            fn now(&self) -> DateTime<Utc> {
                let mut now = self.0.lock();
                *now += chrono::Duration::seconds(1);
                *now
            }
        }

        let clock = Arc::new(SteppingClock(parking_lot::Mutex::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        )));
        let config = ServiceConfig::default().with_ttl(Duration::from_secs(1));
        let service = MergeService::in_memory(config, clock).unwrap();

        let receipt = service.process(&uploads(&[&[1], &[2]]), None).unwrap();
        assert_eq!(service.store().len(), 1);
        assert_eq!(
            service.retrieve(receipt.id.as_str()).unwrap_err().code(),
            "EXPIRED"
        );
    }

    #[test]
    fn process_then_retrieve() {
        let (service, _clock) = service(ServiceConfig::default());
        let receipt = service
            .process(&uploads(&[&[100, 101], &[200]]), Some("report"))
            .unwrap();

        assert_eq!(receipt.filename, "report.pdf");
        assert_eq!(receipt.statistics.total_pages, 3);

        let download = service.retrieve(receipt.id.as_str()).unwrap();
        assert_eq!(download.filename, "report.pdf");
        assert_eq!(download.expires_at, receipt.expires_at);

        let doc = Document::load_mem(&download.bytes).unwrap();
        assert_eq!(fixtures::page_widths(&doc), vec![100, 101, 200]);
    }

    #[test]
    fn default_filename_when_missing() {
        let (service, _clock) = service(ServiceConfig::default());
        let receipt = service.process(&uploads(&[&[1], &[2]]), None).unwrap();
        assert_eq!(receipt.filename, "merged_document.pdf");
    }

    #[test]
    fn insufficient_inputs_stores_nothing() {
        let (service, _clock) = service(ServiceConfig::default());

        let err = service.process(&uploads(&[&[1]]), None).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_INPUTS");

        let err = service.process(&[], None).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_INPUTS");

        assert!(service.store().is_empty());
    }

    #[test]
    fn invalid_upload_stores_nothing() {
        let (service, _clock) = service(ServiceConfig::default());
        let mut request = uploads(&[&[1], &[2]]);
        request.push(Upload::new(Some("notes.txt".into()), b"hello".to_vec()));

        let err = service.process(&request, None).unwrap_err();
        assert_eq!(err.code(), "BAD_SIGNATURE");
        assert!(err.to_string().contains("notes.txt"));
        assert!(service.store().is_empty());
    }

    #[test]
    fn page_ceiling_applies_per_document() {
        let config = ServiceConfig::default().with_max_pages(2);
        let (service, _clock) = service(config);

        assert!(service.process(&uploads(&[&[1, 2], &[3, 4]]), None).is_ok());

        let err = service
            .process(&uploads(&[&[1, 2], &[3, 4, 5]]), None)
            .unwrap_err();
        assert_eq!(err.code(), "TOO_MANY_PAGES");
    }

    #[test]
    fn expired_artifact_is_not_served() {
        let (service, clock) = service(ServiceConfig::default());
        let receipt = service.process(&uploads(&[&[1], &[2]]), None).unwrap();

        clock.advance(Duration::from_secs(3600));
        let err = service.retrieve(receipt.id.as_str()).unwrap_err();
        assert!(matches!(err, StoreError::Expired { .. } | StoreError::NotFound { .. }));
    }

    #[test]
    fn retrieve_triggers_sweep_after_interval() {
        let config = ServiceConfig::default()
            .with_ttl(Duration::from_secs(30))
            .with_sweep_interval(Duration::from_secs(60));
        let (service, clock) = service(config);
        let receipt = service.process(&uploads(&[&[1], &[2]]), None).unwrap();

        clock.advance(Duration::from_secs(61));
        let err = service.retrieve(receipt.id.as_str()).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(service.store().is_empty());
    }

    #[test]
    fn consume_on_read_removes_after_first_download() {
        let config = ServiceConfig::default().with_consume_on_read(true);
        let (service, _clock) = service(config);
        let receipt = service.process(&uploads(&[&[1], &[2]]), None).unwrap();

        assert!(service.retrieve(receipt.id.as_str()).is_ok());
        assert_eq!(
            service.retrieve(receipt.id.as_str()).unwrap_err().code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn repeat_downloads_allowed_by_default() {
        let (service, _clock) = service(ServiceConfig::default());
        let receipt = service.process(&uploads(&[&[1], &[2]]), None).unwrap();

        let first = service.retrieve(receipt.id.as_str()).unwrap();
        let second = service.retrieve(receipt.id.as_str()).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn until_swept_policy_serves_until_sweep() {
        let config = ServiceConfig::default()
            .with_ttl(Duration::from_secs(10))
            .with_expiry_policy(ExpiryPolicy::UntilSwept);
        let (service, clock) = service(config);
        let receipt = service.process(&uploads(&[&[1], &[2]]), None).unwrap();

        clock.advance(Duration::from_secs(20));
        assert!(service.retrieve(receipt.id.as_str()).is_ok());

        assert_eq!(service.sweep_now(), 1);
        assert!(service.retrieve(receipt.id.as_str()).is_err());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let config = ServiceConfig::default().with_ttl(Duration::ZERO);
        let err = MergeService::in_memory(config, clock).err().unwrap();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }

    #[test]
    fn distinct_requests_get_distinct_ids() {
        let (service, _clock) = service(ServiceConfig::default());
        let request = uploads(&[&[1], &[2]]);

        let a = service.process(&request, None).unwrap();
        let b = service.process(&request, None).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(service.store().len(), 2);
    }
}
