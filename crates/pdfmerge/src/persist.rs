//! Store snapshots.
//!
//! A [`Snapshot`] is a JSON document holding every stored artifact, its
//! bytes base64-encoded. The server writes one periodically and on shutdown
//! and restores it on start, so pending downloads survive a restart.
//! Artifacts that expired while the service was down are dropped on restore.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::PersistError;
use crate::io::write_atomic;
use crate::store::{Artifact, ArtifactId, ArtifactStore};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// One artifact as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedArtifact {
    /// Download filename.
    pub filename: String,

    /// Base64-encoded PDF bytes.
    pub data: String,

    /// When the artifact was stored.
    pub created_at: DateTime<Utc>,

    /// When the artifact expires.
    pub expires_at: DateTime<Utc>,
}

/// Serializable copy of a store's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,

    /// Artifacts keyed by id.
    pub artifacts: BTreeMap<ArtifactId, PersistedArtifact>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            artifacts: BTreeMap::new(),
        }
    }
}

/// Outcome of [`Snapshot::restore_into`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Artifacts put back into the store.
    pub restored: usize,

    /// Artifacts dropped because they had expired.
    pub expired: usize,

    /// Artifacts dropped because their data was unreadable or their id was taken.
    pub skipped: usize,
}

impl Snapshot {
    /// Capture every artifact currently in `store`.
    pub fn capture<S: ArtifactStore + ?Sized>(store: &S) -> Self {
        let artifacts = store
            .entries()
            .into_iter()
            .map(|artifact| (artifact.id.clone(), persisted(&artifact)))
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            artifacts,
        }
    }

    /// Number of artifacts in the snapshot.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether the snapshot holds no artifacts.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Write the snapshot to `path`, replacing any previous file atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        let json = serde_json::to_vec(self).map_err(|source| PersistError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        write_atomic(path, &json).map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), artifacts = self.len(), "Saved snapshot");
        Ok(())
    }

    /// Read a snapshot from `path`.
    ///
    /// A missing file yields an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(PersistError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| PersistError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Put the snapshot's live artifacts back into `store`.
    ///
    /// Artifacts with `expires_at <= now` are dropped, as are artifacts whose
    /// lifetime is empty, whose data doesn't decode, or whose id already
    /// exists in the store.
    pub fn restore_into<S: ArtifactStore + ?Sized>(
        self,
        store: &S,
        now: DateTime<Utc>,
    ) -> RestoreReport {
        let mut report = RestoreReport::default();

        for (id, entry) in self.artifacts {
            if entry.expires_at <= now {
                report.expired += 1;
                continue;
            }

            if entry.created_at >= entry.expires_at {
                warn!(id = id.short(), "Skipping snapshot entry that expires before it was created");
                report.skipped += 1;
                continue;
            }

            let bytes = match BASE64.decode(entry.data.as_bytes()) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(id = id.short(), error = %e, "Skipping snapshot entry with unreadable data");
                    report.skipped += 1;
                    continue;
                }
            };

            let artifact = Artifact {
                id,
                bytes: Arc::from(bytes),
                filename: entry.filename,
                created_at: entry.created_at,
                expires_at: entry.expires_at,
            };

            if store.restore(artifact) {
                report.restored += 1;
            } else {
                report.skipped += 1;
            }
        }

        report
    }
}

fn persisted(artifact: &Artifact) -> PersistedArtifact {
    PersistedArtifact {
        filename: artifact.filename.clone(),
        data: BASE64.encode(&artifact.bytes),
        created_at: artifact.created_at,
        expires_at: artifact.expires_at,
    }
}
