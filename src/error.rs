//! Error types for the textcleaner library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`TextCleanerError`]: the operation on one file (or the whole run, for
//!   configuration and root-directory problems) cannot proceed. Inside the
//!   single-file processor it is captured into a failed
//!   [`crate::output::ProcessingResult`]; it only escapes to the caller from
//!   startup paths such as config loading and directory discovery.
//!
//! * [`StageError`]: a single pipeline stage refused or failed to transform
//!   its input. Stages return it as an explicit value; the pipeline wraps it
//!   into [`TextCleanerError::PipelineStage`] for the file being processed.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the textcleaner library.
#[derive(Debug, Error)]
pub enum TextCleanerError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The security gate rejected a path (traversal, symlink, permissions…).
    #[error("Path validation failed for '{path}': {reason}")]
    PathValidation { path: PathBuf, reason: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// No converter claims the file's extension.
    #[error("Unsupported file format '.{extension}' for '{path}'")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The requested output format is not legal for this kind of input.
    #[error("Output format '{format}' is not supported for '{path}' (supported: {supported})")]
    UnsupportedOutputFormat {
        path: PathBuf,
        format: String,
        supported: String,
    },

    /// A converter could not parse the file as the expected format.
    #[error("Failed to convert '{path}': {detail}")]
    Conversion { path: PathBuf, detail: String },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// A cleaning or structure stage failed.
    #[error("Pipeline stage '{stage}' failed: {reason}")]
    PipelineStage { stage: String, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other filesystem failure tied to a path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Configuration could not be loaded, parsed or validated.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TextCleanerError {
    /// Shorthand for a [`TextCleanerError::Conversion`] from any displayable error.
    pub fn conversion(path: impl Into<PathBuf>, detail: impl std::fmt::Display) -> Self {
        TextCleanerError::Conversion {
            path: path.into(),
            detail: detail.to_string(),
        }
    }

    /// Shorthand for a [`TextCleanerError::Io`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TextCleanerError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A failure reported by one pipeline stage.
///
/// Returned as a value from [`crate::pipeline::Stage::process`] rather than
/// raised, so the pipeline can attribute the failure to the stage by name.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[error("{stage}: {reason}")]
pub struct StageError {
    /// Name of the stage that failed.
    pub stage: String,
    /// Human-readable reason.
    pub reason: String,
}

impl StageError {
    pub fn new(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}

impl From<StageError> for TextCleanerError {
    fn from(e: StageError) -> Self {
        TextCleanerError::PipelineStage {
            stage: e.stage,
            reason: e.reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = TextCleanerError::UnsupportedFormat {
            path: PathBuf::from("/data/archive.rar"),
            extension: "rar".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains(".rar"), "got: {msg}");
        assert!(msg.contains("archive.rar"), "got: {msg}");
    }

    #[test]
    fn path_validation_display() {
        let e = TextCleanerError::PathValidation {
            path: PathBuf::from("/tmp/link"),
            reason: "Path is a symbolic link: /tmp/link".into(),
        };
        assert!(e.to_string().contains("symbolic link"));
    }

    #[test]
    fn stage_error_converts_to_pipeline_error() {
        let e: TextCleanerError = StageError::new("content_cleaner", "bad input").into();
        match &e {
            TextCleanerError::PipelineStage { stage, reason } => {
                assert_eq!(stage, "content_cleaner");
                assert_eq!(reason, "bad input");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert!(e.to_string().contains("content_cleaner"));
    }

    #[test]
    fn output_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = TextCleanerError::OutputWriteFailed {
            path: PathBuf::from("out.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("out.md"));
    }

    #[test]
    fn configuration_display() {
        let e = TextCleanerError::Configuration("unknown field `foo`".into());
        assert!(e.to_string().starts_with("Invalid configuration"));
    }
}
