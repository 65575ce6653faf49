//! Markdown converter (`.md`, `.markdown`).
//!
//! The body passes through unchanged except for YAML front matter, which is
//! parsed with `serde_yaml` and moved into metadata. Common keys (`title`,
//! `author`, `date`, `description`, `tags`) are also lifted to the top level.

use super::text::decode_text;
use super::{ensure_convertible, file_metadata, ConversionResult, Converter, Metadata};
use crate::error::TextCleanerError;
use crate::stream;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

static RE_ATX_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").unwrap());

const LIFTED_KEYS: &[&str] = &["title", "author", "date", "description", "tags", "categories"];

#[derive(Debug, Default, Clone)]
pub struct MarkdownConverter;

impl MarkdownConverter {
    pub fn new() -> Self {
        Self
    }
}

impl Converter for MarkdownConverter {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["md", "markdown"]
    }

    fn convert(&self, path: &Path) -> Result<ConversionResult, TextCleanerError> {
        ensure_convertible(self, path)?;
        info!("Converting markdown file: {}", path.display());

        let (text, _encoding) = decode_text(&stream::read_bytes(path)?);
        let (front_matter, body) = split_front_matter(&text);

        let mut metadata = file_metadata(path, "markdown");
        if let Some(yaml) = front_matter {
            match parse_front_matter(yaml) {
                Ok(fm) => merge_front_matter(&mut metadata, fm),
                Err(e) => warn!("Ignoring malformed front matter in {}: {}", path.display(), e),
            }
        }

        let headings = extract_headings(body);
        if !headings.is_empty() {
            metadata.insert("heading_count".into(), headings.len().into());
            metadata.insert("headings".into(), Value::Array(headings));
        }

        Ok(ConversionResult {
            raw_text: body.to_string(),
            metadata,
        })
    }
}

/// Split `---`-delimited front matter from the body.
///
/// Returns `(None, text)` when the first line is not `---` or the block is
/// never closed.
fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let mut lines = text.split_inclusive('\n');
    let first = match lines.next() {
        Some(l) if l.trim() == "---" => l,
        _ => return (None, text),
    };
    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim() == "---" {
            let yaml = &text[start..offset];
            let body = &text[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, text)
}

fn parse_front_matter(yaml: &str) -> Result<Metadata, String> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
    match serde_json::to_value(value).map_err(|e| e.to_string())? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Metadata::new()),
        other => Err(format!("front matter is not a mapping: {}", other)),
    }
}

fn merge_front_matter(metadata: &mut Metadata, fm: Metadata) {
    for key in LIFTED_KEYS {
        if let Some(v) = fm.get(*key) {
            metadata.insert(key.to_string(), v.clone());
        }
    }
    metadata.insert("frontmatter".into(), Value::Object(fm));
}

/// ATX headings as `{level, text}` objects, skipping fenced code.
fn extract_headings(body: &str) -> Vec<Value> {
    let mut in_fence = false;
    let mut out = Vec::new();
    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = RE_ATX_HEADING.captures(line) {
            out.push(serde_json::json!({
                "level": caps[1].len(),
                "text": caps[2].to_string(),
            }));
        }
    }
    out
}
