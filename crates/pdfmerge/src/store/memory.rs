//! In-process artifact store.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{Artifact, ArtifactId, ArtifactStore};
use crate::clock::Clock;
use crate::config::ExpiryPolicy;
use crate::error::StoreError;

/// Artifact store backed by a lock-protected map.
///
/// Artifacts are handed out as `Arc`s, so a reader keeps its bytes even if
/// the entry is swept while the response is still being written.
pub struct InMemoryStore {
    clock: Arc<dyn Clock>,
    policy: ExpiryPolicy,
    artifacts: RwLock<HashMap<ArtifactId, Arc<Artifact>>>,
}

impl InMemoryStore {
    /// Create an empty store with the strict expiry policy.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_policy(clock, ExpiryPolicy::default())
    }

    /// Create an empty store with an explicit expiry policy.
    pub fn with_policy(clock: Arc<dyn Clock>, policy: ExpiryPolicy) -> Self {
        Self {
            clock,
            policy,
            artifacts: RwLock::new(HashMap::new()),
        }
    }

    /// The expiry policy applied by [`ArtifactStore::lookup`].
    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    /// Total bytes held, expired but unswept artifacts included.
    pub fn total_bytes(&self) -> usize {
        self.artifacts.read().values().map(|a| a.size()).sum()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("policy", &self.policy)
            .field("artifacts", &self.artifacts.read().len())
            .finish()
    }
}

impl ArtifactStore for InMemoryStore {
    fn insert(
        &self,
        bytes: Vec<u8>,
        filename: String,
        ttl: Duration,
    ) -> Result<Arc<Artifact>, StoreError> {
        if ttl.is_zero() {
            return Err(StoreError::InvalidTtl);
        }
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| StoreError::InvalidTtl)?;
        let created_at = self.clock.now();
        let expires_at = created_at
            .checked_add_signed(ttl)
            .ok_or(StoreError::InvalidTtl)?;
        let bytes: Arc<[u8]> = Arc::from(bytes);

        let mut artifacts = self.artifacts.write();
        let id = loop {
            let candidate = ArtifactId::generate();
            if !artifacts.contains_key(&candidate) {
                break candidate;
            }
        };

        let artifact = Arc::new(Artifact {
            id: id.clone(),
            bytes,
            filename,
            created_at,
            expires_at,
        });
        debug!(
            id = id.short(),
            bytes = artifact.size(),
            expires_at = %expires_at,
            "Stored artifact"
        );
        artifacts.insert(id, Arc::clone(&artifact));

        Ok(artifact)
    }

    fn lookup(&self, id: &str) -> Result<Arc<Artifact>, StoreError> {
        let artifact = self
            .artifacts
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id))?;

        if self.policy == ExpiryPolicy::Strict && artifact.is_expired_at(self.clock.now()) {
            return Err(StoreError::Expired { id: id.to_string() });
        }

        Ok(artifact)
    }

    fn remove(&self, id: &str) -> Option<Arc<Artifact>> {
        let removed = self.artifacts.write().remove(id);
        if let Some(artifact) = &removed {
            debug!(id = artifact.id.short(), "Removed artifact");
        }
        removed
    }

    fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut artifacts = self.artifacts.write();
        let before = artifacts.len();
        artifacts.retain(|_, artifact| !artifact.is_expired_at(now));
        before - artifacts.len()
    }

    fn len(&self) -> usize {
        self.artifacts.read().len()
    }

    fn entries(&self) -> Vec<Arc<Artifact>> {
        self.artifacts.read().values().cloned().collect()
    }

    fn restore(&self, artifact: Artifact) -> bool {
        let mut artifacts = self.artifacts.write();
        if artifacts.contains_key(&artifact.id) {
            return false;
        }
        artifacts.insert(artifact.id.clone(), Arc::new(artifact));
        true
    }
}
