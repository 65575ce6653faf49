//! Output serialisation and the per-file result record.
//!
//! [`OutputManager`] renders cleaned text plus metadata as Markdown, plain
//! text, JSON or CSV and writes it atomically, so a failed write never
//! leaves a partial file behind. [`ProcessingResult`] is what every
//! processed file reports back to the caller.

use crate::config::{MetadataPosition, OutputConfig, OutputFormat};
use crate::converters::Metadata;
use crate::error::TextCleanerError;
use crate::pipeline::markup::{fence_mask, is_fence, split_blocks};
use crate::security::extension_of;
use crate::stream::write_atomic;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

// ── Result record ────────────────────────────────────────────────────────

/// Outcome of processing one file.
///
/// A successful result always has an `output_path` that exists; a failed
/// one always has an `error` and never a partially written output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingResult {
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub success: bool,
    pub error: Option<String>,
    pub metrics: Metadata,
    pub metadata: Metadata,
}

impl ProcessingResult {
    pub fn succeeded(input: impl Into<PathBuf>, output: impl Into<PathBuf>, metrics: Metadata, metadata: Metadata) -> Self {
        Self {
            input_path: input.into(),
            output_path: Some(output.into()),
            success: true,
            error: None,
            metrics,
            metadata,
        }
    }

    pub fn failed(input: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self {
            input_path: input.into(),
            output_path: None,
            success: false,
            error: Some(error.to_string()),
            metrics: Metadata::new(),
            metadata: Metadata::new(),
        }
    }
}

// ── Output manager ───────────────────────────────────────────────────────

const METADATA_HEADING: &str = "## Document Metadata";

#[derive(Debug, Clone, Default)]
pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// The explicit format if given, else the one implied by the output
    /// extension, else the configured default.
    pub fn resolve_format(&self, path: &Path, format: Option<OutputFormat>) -> OutputFormat {
        format
            .or_else(|| OutputFormat::from_extension(&extension_of(path)))
            .unwrap_or(self.config.default_format)
    }

    /// Serialise `text` and `metadata` as `format`.
    pub fn render(&self, text: &str, metadata: &Metadata, format: OutputFormat) -> Result<String, TextCleanerError> {
        match format {
            OutputFormat::Markdown => Ok(self.render_markdown(text, metadata)),
            OutputFormat::PlainText => Ok(self.render_plain(text, metadata)),
            OutputFormat::Json => serde_json::to_string_pretty(&json!({
                "content": text,
                "metadata": metadata,
            }))
            .map(|s| s + "\n")
            .map_err(|e| TextCleanerError::Internal(format!("JSON serialisation failed: {e}"))),
            OutputFormat::Csv => render_csv(text),
        }
    }

    /// Render and atomically write to `path`; returns the format used.
    pub fn write(
        &self,
        text: &str,
        metadata: &Metadata,
        path: &Path,
        format: Option<OutputFormat>,
    ) -> Result<OutputFormat, TextCleanerError> {
        let format = self.resolve_format(path, format);
        let rendered = self.render(text, metadata, format)?;
        write_atomic(&rendered, path)?;
        debug!("Wrote {} ({} bytes) to {}", format, rendered.len(), path.display());
        Ok(format)
    }

    fn render_markdown(&self, text: &str, metadata: &Metadata) -> String {
        let body = text.trim_end();
        if !self.config.include_metadata || metadata.is_empty() {
            return format!("{body}\n");
        }
        let block = format!(
            "{METADATA_HEADING}\n\n{}",
            metadata_lines(metadata, |k, v| format!("- **{k}**: {v}"))
        );
        match self.config.metadata_position {
            MetadataPosition::Start => format!("{block}\n\n---\n\n{body}\n"),
            MetadataPosition::End => format!("{body}\n\n---\n\n{block}\n"),
        }
    }

    fn render_plain(&self, text: &str, metadata: &Metadata) -> String {
        let body = strip_markdown(text);
        let body = body.trim_end();
        if !self.config.include_metadata || metadata.is_empty() {
            return format!("{body}\n");
        }
        let block = format!(
            "Document Metadata\n\n{}",
            metadata_lines(metadata, |k, v| format!("{k}: {v}"))
        );
        match self.config.metadata_position {
            MetadataPosition::Start => format!("{block}\n\n{body}\n"),
            MetadataPosition::End => format!("{body}\n\n{block}\n"),
        }
    }
}

fn metadata_lines(metadata: &Metadata, line: impl Fn(&str, String) -> String) -> String {
    metadata
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            line(k, value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Plain-text rendering ─────────────────────────────────────────────────

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#{1,6}\s+").unwrap());
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)[*+-]\s+").unwrap());
static RE_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*>\s?").unwrap());
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").unwrap());
static RE_STRONG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\*\*|__)(.+?)(\*\*|__)").unwrap());
static RE_CODE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static RE_TABLE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\|?[\s:|-]*-{3,}[\s:|-]*$").unwrap());
static RE_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*_]{3,}\s*$").unwrap());

/// Remove Markdown markup, keeping the words. Code blocks keep their
/// content but lose the fences; table rows become tab-separated cells.
pub fn strip_markdown(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let fenced = fence_mask(&lines);
    let mut out = Vec::with_capacity(lines.len());
    for (line, fenced) in lines.iter().copied().zip(fenced) {
        if fenced {
            if !is_fence(line) {
                out.push(line.to_string());
            }
            continue;
        }
        let trimmed = line.trim();
        if trimmed.starts_with('|') {
            if RE_TABLE_SEPARATOR.is_match(trimmed) {
                continue;
            }
            out.push(table_cells(trimmed).join("\t"));
            continue;
        }
        if RE_RULE.is_match(line) {
            continue;
        }
        let s = RE_HEADING.replace(line, "");
        let s = RE_QUOTE.replace(&s, "");
        let s = RE_BULLET.replace(&s, "$1");
        let s = RE_LINK.replace_all(&s, "$1");
        let s = RE_STRONG.replace_all(&s, "$2");
        let s = RE_CODE_SPAN.replace_all(&s, "$1");
        out.push(s.into_owned());
    }
    out.join("\n")
}

fn table_cells(row: &str) -> Vec<String> {
    row.trim_matches('|')
        .split('|')
        .map(|c| c.trim().replace("\\|", "|"))
        .collect()
}

// ── CSV rendering ────────────────────────────────────────────────────────

/// First GFM table in `text` as CSV, or a single `Content` column with one
/// row per paragraph when there is no table.
fn render_csv(text: &str) -> Result<String, TextCleanerError> {
    let table: Vec<Vec<String>> = text
        .lines()
        .skip_while(|l| !l.trim_start().starts_with('|'))
        .take_while(|l| l.trim_start().starts_with('|'))
        .filter(|l| !RE_TABLE_SEPARATOR.is_match(l.trim()))
        .map(|l| table_cells(l.trim()))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_err = |e: csv::Error| TextCleanerError::Internal(format!("CSV serialisation failed: {e}"));
    if table.is_empty() {
        writer.write_record(["Content"]).map_err(csv_err)?;
        for block in split_blocks(text) {
            writer.write_record([block.trim()]).map_err(csv_err)?;
        }
    } else {
        for row in &table {
            writer.write_record(row).map_err(csv_err)?;
        }
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| TextCleanerError::Internal(format!("CSV serialisation failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| TextCleanerError::Internal(e.to_string()))
}
