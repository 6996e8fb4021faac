//! Configuration module for pdfmerge.
//!
//! [`ServiceConfig`] holds the tunables that drive validation, merging and
//! artifact retention. The server binary builds one from its command line and
//! environment; library users can start from [`ServiceConfig::default`] and
//! override individual fields.

use crate::{PdfMergeError, Result};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};

/// Default artifact lifetime (one hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Default page ceiling per uploaded document.
pub const DEFAULT_MAX_PAGES: usize = 2000;

/// Default minimum spacing between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Default upload size limit for a whole request (50 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Base name used when the client supplies no usable output filename.
pub const DEFAULT_OUTPUT_NAME: &str = "merged_document";

/// How lookups treat artifacts whose expiration time has passed but which
/// have not been swept yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpiryPolicy {
    /// Expired entries are reported as expired immediately.
    #[default]
    Strict,
    /// Expired entries stay retrievable until the next sweep removes them.
    UntilSwept,
}

impl FromStr for ExpiryPolicy {
    type Err = PdfMergeError;

    /// Parse an expiry policy: "strict" or "until-swept".
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't name a known policy.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "strict" => Ok(Self::Strict),
            "until-swept" => Ok(Self::UntilSwept),
            _ => Err(PdfMergeError::invalid_config(format!(
                "Invalid expiry policy: {s}. Must be one of: strict, until-swept"
            ))),
        }
    }
}

/// Validated configuration for a [`crate::MergeService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// How long a merged artifact stays retrievable.
    pub ttl: Duration,

    /// Maximum page count accepted for a single uploaded document.
    pub max_pages: usize,

    /// Minimum spacing between opportunistic sweeps.
    pub sweep_interval: Duration,

    /// Remove an artifact after its first successful retrieval.
    pub consume_on_read: bool,

    /// Lookup behavior for expired but unswept artifacts.
    pub expiry_policy: ExpiryPolicy,

    /// Compress streams in the merged output.
    pub compress_output: bool,

    /// Base name used when the requested output name is missing or unusable.
    pub default_output_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_pages: DEFAULT_MAX_PAGES,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            consume_on_read: false,
            expiry_policy: ExpiryPolicy::default(),
            compress_output: true,
            default_output_name: DEFAULT_OUTPUT_NAME.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Set the artifact lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the page ceiling.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Enable or disable consume-on-read.
    pub fn with_consume_on_read(mut self, enabled: bool) -> Self {
        self.consume_on_read = enabled;
        self
    }

    /// Set the expiry policy.
    pub fn with_expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry_policy = policy;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TTL is zero or too large to add to a timestamp
    /// - The page ceiling is zero
    /// - The sweep interval is zero
    /// - The default output name starts with a dot or contains characters
    ///   outside `[A-Za-z0-9._-]`
    pub fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(PdfMergeError::invalid_config("TTL must be greater than zero"));
        }

        if chrono::Duration::from_std(self.ttl).is_err() {
            return Err(PdfMergeError::invalid_config(format!(
                "TTL of {}s is out of range",
                self.ttl.as_secs()
            )));
        }

        if self.max_pages == 0 {
            return Err(PdfMergeError::invalid_config(
                "Maximum page count must be at least 1",
            ));
        }

        if self.sweep_interval.is_zero() {
            return Err(PdfMergeError::invalid_config(
                "Sweep interval must be greater than zero",
            ));
        }

        let name = &self.default_output_name;
        if name.is_empty() || name.starts_with('.') || crate::utils::sanitize_filename(name) != *name {
            return Err(PdfMergeError::invalid_config(format!(
                "Default output name '{name}' must be non-empty and use only letters, digits, '.', '_' or '-'"
            )));
        }

        Ok(())
    }
}
