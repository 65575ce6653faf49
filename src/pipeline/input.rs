//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! Converters need a file-system path (pdfium and calamine open files, not
//! byte buffers), so URL inputs are downloaded into a `TempDir` first. The
//! directory lives inside [`ResolvedInput`] and is removed when it drops.
//!
//! The downloaded file keeps the name from the URL so extension dispatch
//! works; when the URL has no usable name, one is derived from the
//! `Content-Type` header.

use crate::error::TextCleanerError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

/// Default download timeout.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// A local path, or a downloaded temp file kept alive by its directory.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local path.
    Local(PathBuf),
    /// Input was a URL; the `TempDir` keeps the download alive.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a local path, downloading it when it is a URL.
///
/// Local paths are returned as given; the security gate validates them
/// before any read.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, TextCleanerError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        debug!("Resolved local input: {}", input);
        Ok(ResolvedInput::Local(PathBuf::from(input)))
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, TextCleanerError> {
    info!("Downloading: {}", url);
    let failed = |reason: String| TextCleanerError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {timeout_secs}s"))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let filename = download_filename(url, content_type.as_deref());

    let temp_dir = TempDir::new().map_err(|e| TextCleanerError::Internal(e.to_string()))?;
    let path = temp_dir.path().join(&filename);

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| TextCleanerError::io(&path, e))?;

    info!("Downloaded {} bytes to {}", bytes.len(), path.display());
    Ok(ResolvedInput::Downloaded {
        path,
        _temp_dir: temp_dir,
    })
}

/// Pick a file name for a download: the last URL segment when it has an
/// extension, otherwise a name whose extension matches the content type.
pub fn download_filename(url: &str, content_type: Option<&str>) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(last) = parsed.path_segments().and_then(|mut s| s.next_back()) {
            if !last.is_empty() && last.contains('.') {
                return last.to_string();
            }
        }
    }
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let extension = match mime.as_str() {
        "application/pdf" => "pdf",
        "text/plain" => "txt",
        "text/markdown" => "md",
        "text/csv" => "csv",
        "application/xml" | "text/xml" => "xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => "pptx",
        _ => "html",
    };
    let stem = if extension == "html" { "index" } else { "download" };
    format!("{stem}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_url_path() {
        assert_eq!(
            download_filename("https://example.com/files/report.docx?v=2", None),
            "report.docx"
        );
    }

    #[test]
    fn filename_from_content_type() {
        assert_eq!(download_filename("https://example.com/", None), "index.html");
        assert_eq!(
            download_filename("https://example.com/get", Some("application/pdf")),
            "download.pdf"
        );
        assert_eq!(
            download_filename("https://example.com/get", Some("text/plain; charset=utf-8")),
            "download.txt"
        );
    }

    #[tokio::test]
    async fn local_input_passes_through() {
        let resolved = resolve_input("notes/today.md", 5).await.unwrap();
        assert_eq!(resolved.path(), Path::new("notes/today.md"));
    }

    #[tokio::test]
    async fn unreachable_url_is_download_error() {
        let err = resolve_input("http://127.0.0.1:9/doc.txt", 2).await.unwrap_err();
        assert!(matches!(err, TextCleanerError::DownloadFailed { .. }), "{err}");
    }
}
