//! Input-extension ↔ output-format table.
//!
//! Independent of the converters: the registry answers which inputs are
//! eligible for processing and which output formats each may become. The
//! directory walker consults it before dispatch, and new entries can be
//! registered at runtime next to a newly registered converter.

use crate::security::extension_of;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Extension used when a format has no registered extension.
pub const FALLBACK_EXTENSION: &str = "txt";

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "docx", "doc", "odt", "pptx", "odp", "html", "htm", "xhtml", "txt", "text", "log", "md",
    "markdown", "xml",
];
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "ods", "csv", "tsv"];
const DOCUMENT_FORMATS: &[&str] = &["markdown", "plain_text", "json"];

#[derive(Debug, Clone)]
pub struct FileTypeRegistry {
    /// format → default output extension
    formats: BTreeMap<String, String>,
    /// input extension → legal output formats
    extensions: BTreeMap<String, BTreeSet<String>>,
}

impl Default for FileTypeRegistry {
    fn default() -> Self {
        let mut registry = Self {
            formats: BTreeMap::new(),
            extensions: BTreeMap::new(),
        };
        for (format, ext) in [
            ("markdown", "md"),
            ("plain_text", "txt"),
            ("json", "json"),
            ("csv", "csv"),
            ("html", "html"),
            ("xml", "xml"),
        ] {
            registry.register_format(format, ext);
        }
        for ext in DOCUMENT_EXTENSIONS {
            registry.register_extension(ext, DOCUMENT_FORMATS);
        }
        for ext in SPREADSHEET_EXTENSIONS {
            registry.register_extension(ext, DOCUMENT_FORMATS);
            registry.register_extension(ext, &["csv"]);
        }
        registry
    }
}

impl FileTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default output extension for `format`, or `"txt"` when unknown.
    pub fn get_default_extension(&self, format: &str) -> &str {
        self.formats
            .get(&format.to_lowercase())
            .map(String::as_str)
            .unwrap_or(FALLBACK_EXTENSION)
    }

    /// Output formats `path` may be converted to; empty for unknown types.
    pub fn get_supported_formats(&self, path: &Path) -> Vec<String> {
        self.extensions
            .get(&extension_of(path))
            .map(|formats| formats.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_supported_extension(&self, extension: &str) -> bool {
        self.extensions
            .contains_key(&normalise_extension(extension))
    }

    /// Whether `path` should be picked up for processing, optionally limited
    /// to an extension allow-list (compared case-insensitively, dots ignored).
    pub fn should_process_file(&self, path: &Path, allowed_extensions: Option<&[String]>) -> bool {
        let ext = extension_of(path);
        if !self.extensions.contains_key(&ext) {
            return false;
        }
        match allowed_extensions {
            Some(allowed) => allowed.iter().any(|a| normalise_extension(a) == ext),
            None => true,
        }
    }

    pub fn get_all_supported_extensions(&self) -> Vec<String> {
        self.extensions.keys().cloned().collect()
    }

    /// Add (or extend) the output formats available to `extension`.
    pub fn register_extension(&mut self, extension: &str, formats: &[&str]) {
        self.extensions
            .entry(normalise_extension(extension))
            .or_default()
            .extend(formats.iter().map(|f| f.to_lowercase()));
    }

    /// Register `format` with its default output extension.
    pub fn register_format(&mut self, format: &str, extension: &str) {
        self.formats
            .insert(format.to_lowercase(), normalise_extension(extension));
    }
}

fn normalise_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_extensions() {
        let r = FileTypeRegistry::new();
        assert_eq!(r.get_default_extension("markdown"), "md");
        assert_eq!(r.get_default_extension("PLAIN_TEXT"), "txt");
        assert_eq!(r.get_default_extension("nonsense"), "txt");
    }

    #[test]
    fn spreadsheets_can_become_csv() {
        let r = FileTypeRegistry::new();
        assert_eq!(
            r.get_supported_formats(Path::new("a.xlsx")),
            vec!["csv", "json", "markdown", "plain_text"]
        );
        assert!(!r.get_supported_formats(Path::new("a.pdf")).contains(&"csv".to_string()));
    }

    #[test]
    fn unknown_extension_has_no_formats() {
        let r = FileTypeRegistry::new();
        assert!(r.get_supported_formats(Path::new("a.exe")).is_empty());
        assert!(r.get_supported_formats(Path::new("noext")).is_empty());
    }

    #[test]
    fn should_process_respects_allow_list() {
        let r = FileTypeRegistry::new();
        assert!(r.should_process_file(Path::new("A.PDF"), None));
        assert!(!r.should_process_file(Path::new("a.bin"), None));
        let allowed = vec![".pdf".to_string(), "TXT".to_string()];
        assert!(r.should_process_file(Path::new("x.txt"), Some(&allowed)));
        assert!(!r.should_process_file(Path::new("x.md"), Some(&allowed)));
    }

    #[test]
    fn runtime_registration() {
        let mut r = FileTypeRegistry::new();
        assert!(!r.is_supported_extension("rtf"));
        r.register_extension(".RTF", &["markdown"]);
        r.register_format("rich", "rtf");
        assert!(r.is_supported_extension("rtf"));
        assert_eq!(r.get_default_extension("rich"), "rtf");
        assert!(r.get_all_supported_extensions().contains(&"rtf".to_string()));
    }
}
