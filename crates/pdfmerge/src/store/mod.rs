//! Temporary storage for merged artifacts.
//!
//! An artifact is a merged PDF plus its download filename and lifetime. The
//! [`ArtifactStore`] trait is the seam between the service and the storage
//! backend; [`InMemoryStore`] is the backend shipped with the crate.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::clock::SystemClock;
//! use pdfmerge::store::{ArtifactStore, InMemoryStore};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn example(pdf: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryStore::new(Arc::new(SystemClock));
//! let stored = store.insert(pdf, "report.pdf".into(), Duration::from_secs(3600))?;
//!
//! let artifact = store.lookup(stored.id.as_str())?;
//! println!("{} is {} bytes", artifact.filename, artifact.size());
//! # Ok(())
//! # }
//! ```

pub mod id;
pub mod memory;

pub use id::{ArtifactId, InvalidArtifactId};
pub use memory::InMemoryStore;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;

/// A stored merged PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Unique identifier.
    pub id: ArtifactId,

    /// The merged PDF bytes.
    pub bytes: Arc<[u8]>,

    /// Sanitized download filename, always ending in `.pdf`.
    pub filename: String,

    /// When the artifact was stored.
    pub created_at: DateTime<Utc>,

    /// When the artifact stops being retrievable.
    pub expires_at: DateTime<Utc>,
}

impl Artifact {
    /// Whether the artifact has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Size of the stored PDF in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Storage backend for merged artifacts.
///
/// Implementations must be safe to share across threads. Every method takes
/// `&self` and is atomic with respect to the others.
pub trait ArtifactStore: Send + Sync {
    /// Store a new artifact that expires `ttl` from now.
    ///
    /// Returns the stored artifact. Its id is fresh: it never names an
    /// artifact that was already stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTtl`] if `ttl` is zero or too large.
    fn insert(
        &self,
        bytes: Vec<u8>,
        filename: String,
        ttl: Duration,
    ) -> Result<Arc<Artifact>, StoreError>;

    /// Fetch an artifact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown ids and, depending on the
    /// expiry policy, [`StoreError::Expired`] for expired ones.
    fn lookup(&self, id: &str) -> Result<Arc<Artifact>, StoreError>;

    /// Remove an artifact, returning it if it was present.
    fn remove(&self, id: &str) -> Option<Arc<Artifact>>;

    /// Remove every artifact with `expires_at <= now`; returns how many.
    fn sweep(&self, now: DateTime<Utc>) -> usize;

    /// Number of stored artifacts, expired but unswept ones included.
    fn len(&self) -> usize;

    /// Whether the store holds no artifacts.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A point-in-time copy of every stored artifact.
    fn entries(&self) -> Vec<Arc<Artifact>>;

    /// Put back a previously captured artifact under its original id.
    ///
    /// Returns `false` and leaves the store unchanged if the id is taken.
    fn restore(&self, artifact: Artifact) -> bool;
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for Arc<S> {
    fn insert(
        &self,
        bytes: Vec<u8>,
        filename: String,
        ttl: Duration,
    ) -> Result<Arc<Artifact>, StoreError> {
        (**self).insert(bytes, filename, ttl)
    }

    fn lookup(&self, id: &str) -> Result<Arc<Artifact>, StoreError> {
        (**self).lookup(id)
    }

    fn remove(&self, id: &str) -> Option<Arc<Artifact>> {
        (**self).remove(id)
    }

    fn sweep(&self, now: DateTime<Utc>) -> usize {
        (**self).sweep(now)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn entries(&self) -> Vec<Arc<Artifact>> {
        (**self).entries()
    }

    fn restore(&self, artifact: Artifact) -> bool {
        (**self).restore(artifact)
    }
}
