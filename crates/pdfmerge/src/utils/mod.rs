//! Small helpers for filenames, sizes and PDF version strings.

/// Format file size as human-readable string.
///
/// # Returns
///
/// Formatted string like "1.50 MB" or "234 bytes"
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}

/// Reduce a client-supplied name to a safe filename.
///
/// Only the last path component is kept, runs of whitespace become a single
/// `_`, and every remaining character outside `[A-Za-z0-9._-]` is dropped.
/// The result is safe inside a `Content-Disposition` header.
pub fn sanitize_filename(name: &str) -> String {
    let component = name.rsplit(['/', '\\']).next().unwrap_or_default();

    component
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

/// Build the download filename for a merged artifact.
///
/// The requested name is sanitized and a trailing `.pdf` (any case) is
/// stripped before `.pdf` is appended again. Leading and trailing dots are
/// trimmed; names left empty fall back to `default_name`.
pub fn output_filename(requested: Option<&str>, default_name: &str) -> String {
    let base = requested
        .map(sanitize_filename)
        .map(|name| strip_pdf_extension(&name).trim_matches('.').to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| default_name.to_string());

    format!("{base}.pdf")
}

fn strip_pdf_extension(name: &str) -> &str {
    let len = name.len();
    if len >= 4 && name[len - 4..].eq_ignore_ascii_case(".pdf") {
        &name[..len - 4]
    } else {
        name
    }
}

/// Parse a PDF version string like "1.7" into `(major, minor)`.
pub fn parse_pdf_version(version: &str) -> Option<(u8, u8)> {
    let (major, minor) = version.trim().split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}
