//! Command-line and environment configuration for pdfmerge-server.
//!
//! Every option can be given as a flag or through a `PDFMERGE_*` environment
//! variable. The build script includes this file to render the man page, so
//! it depends only on `clap` and the `pdfmerge` library.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use pdfmerge::config::{DEFAULT_MAX_PAGES, DEFAULT_OUTPUT_NAME};
use pdfmerge::{ExpiryPolicy, PdfMergeError, ServiceConfig};

/// Serve PDF merging over HTTP.
///
/// Clients upload two or more PDF files, receive a link to the merged
/// document, and download it until the link expires.
#[derive(Parser, Debug, Clone)]
#[command(name = "pdfmerge-server")]
#[command(version)]
#[command(about = "Merge uploaded PDF files and serve the result for a limited time", long_about = None)]
#[command(author)]
pub struct Cli {
    /// Address to listen on
    #[arg(short, long, env = "PDFMERGE_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Seconds a merged document stays downloadable
    #[arg(long, env = "PDFMERGE_TTL_SECS", default_value_t = 3600, value_name = "SECS")]
    pub ttl_secs: u64,

    /// Maximum page count accepted for a single uploaded document
    #[arg(long, env = "PDFMERGE_MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES, value_name = "N")]
    pub max_pages: usize,

    /// Maximum size of one upload request, in megabytes
    #[arg(long, env = "PDFMERGE_MAX_UPLOAD_MB", default_value_t = 50, value_name = "MB")]
    pub max_upload_mb: usize,

    /// Seconds between sweeps of expired documents
    ///
    /// Applies both to the background sweeper and to the sweeps that
    /// incoming requests trigger.
    #[arg(long, env = "PDFMERGE_SWEEP_INTERVAL_SECS", default_value_t = 60, value_name = "SECS")]
    pub sweep_interval_secs: u64,

    /// Delete a merged document after its first download
    #[arg(long, env = "PDFMERGE_CONSUME_ON_READ")]
    pub consume_on_read: bool,

    /// How expired but not yet swept documents are treated
    ///
    /// - strict: report them as expired immediately (default)
    /// - until-swept: keep serving them until the next sweep
    #[arg(long, env = "PDFMERGE_EXPIRY_POLICY", default_value = "strict", value_name = "POLICY")]
    #[arg(value_parser = ["strict", "until-swept"])]
    pub expiry_policy: String,

    /// Write merged documents without stream compression
    #[arg(long, env = "PDFMERGE_NO_COMPRESS")]
    pub no_compress: bool,

    /// Base name for merged documents when the client gives none
    #[arg(long, env = "PDFMERGE_DEFAULT_NAME", default_value = DEFAULT_OUTPUT_NAME, value_name = "NAME")]
    pub default_name: String,

    /// Snapshot file that keeps pending downloads across restarts
    ///
    /// Loaded at startup, rewritten periodically and on shutdown.
    /// Without it, pending downloads are lost when the server stops.
    #[arg(long, env = "PDFMERGE_SNAPSHOT", value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Seconds between periodic snapshot writes
    #[arg(
        long,
        env = "PDFMERGE_SNAPSHOT_INTERVAL_SECS",
        default_value_t = 300,
        value_name = "SECS",
        requires = "snapshot"
    )]
    pub snapshot_interval_secs: u64,

    /// Allow cross-origin requests from any origin
    #[arg(long, env = "PDFMERGE_CORS")]
    pub cors: bool,

    /// Log filter directives (tracing EnvFilter syntax)
    #[arg(
        long,
        env = "PDFMERGE_LOG",
        default_value = "pdfmerge=info,pdfmerge_server=info,tower_http=info",
        value_name = "FILTER"
    )]
    pub log: String,
}

impl Cli {
    /// Request body limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Interval between periodic snapshot writes.
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs)
    }

    /// Validate options that clap cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload limit or snapshot interval is zero,
    /// or if the derived [`ServiceConfig`] is invalid.
    pub fn validate(&self) -> Result<(), PdfMergeError> {
        if self.max_upload_mb == 0 {
            return Err(PdfMergeError::invalid_config(
                "Upload limit must be at least 1 MB",
            ));
        }

        if self.snapshot.is_some() && self.snapshot_interval_secs == 0 {
            return Err(PdfMergeError::invalid_config(
                "Snapshot interval must be greater than zero",
            ));
        }

        ServiceConfig::try_from(self)?.validate()
    }
}

impl TryFrom<&Cli> for ServiceConfig {
    type Error = PdfMergeError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        Ok(ServiceConfig {
            ttl: Duration::from_secs(cli.ttl_secs),
            max_pages: cli.max_pages,
            sweep_interval: Duration::from_secs(cli.sweep_interval_secs),
            consume_on_read: cli.consume_on_read,
            expiry_policy: ExpiryPolicy::from_str(&cli.expiry_policy)?,
            compress_output: !cli.no_compress,
            default_output_name: cli.default_name.clone(),
        })
    }
}
