//! Format converters and the extension-keyed registry that dispatches to them.
//!
//! Each converter turns one family of file formats into raw text plus a
//! metadata map ([`ConversionResult`]). Converters are stateless per file:
//! they may hold their own options (CSV delimiter, OCR settings) but never
//! mutable state shared between calls, so one instance serves every worker.
//!
//! ## Dispatch
//!
//! [`ConverterRegistry`] maps a lowercase extension to exactly one converter.
//! Registering a second converter for an already-claimed extension fails with
//! [`TextCleanerError::Configuration`] when the registry is built, not later
//! when a matching file shows up.

use crate::config::PipelineConfig;
use crate::error::TextCleanerError;
use crate::security::extension_of;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub mod csv;
pub mod html;
pub mod markdown;
pub mod office;
pub mod pdf;
pub mod text;

pub use self::csv::CsvConverter;
pub use self::html::HtmlConverter;
pub use self::markdown::MarkdownConverter;
pub use self::office::OfficeConverter;
pub use self::pdf::PdfConverter;
pub use self::text::TextConverter;

/// Key-value metadata attached to a document (title, page count, …).
pub type Metadata = serde_json::Map<String, Value>;

/// Raw text and metadata produced by a converter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionResult {
    pub raw_text: String,
    pub metadata: Metadata,
}

impl ConversionResult {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Add a metadata entry, builder-style.
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Capability contract for a format converter.
pub trait Converter: Send + Sync {
    /// Short name used in logs and metadata, e.g. `"csv"`.
    fn name(&self) -> &'static str;

    /// Lowercase extensions (without dots) this converter claims.
    fn supported_extensions(&self) -> &[&'static str];

    /// Extract raw text and metadata from the file at `path`.
    ///
    /// Fails with [`TextCleanerError::FileNotFound`] when the file is missing,
    /// [`TextCleanerError::UnsupportedFormat`] when the extension is not
    /// claimed, and [`TextCleanerError::Conversion`] when the content does not
    /// parse as the expected format.
    fn convert(&self, path: &Path) -> Result<ConversionResult, TextCleanerError>;

    /// Whether this converter claims the extension of `path`.
    fn can_convert(&self, path: &Path) -> bool {
        let ext = extension_of(path);
        self.supported_extensions().contains(&ext.as_str())
    }
}

/// Shared precondition checks for [`Converter::convert`] implementations.
pub(crate) fn ensure_convertible(
    converter: &dyn Converter,
    path: &Path,
) -> Result<(), TextCleanerError> {
    if !path.exists() {
        return Err(TextCleanerError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if !converter.can_convert(path) {
        return Err(TextCleanerError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: extension_of(path),
        });
    }
    Ok(())
}

/// File-level metadata every converter starts from.
pub(crate) fn file_metadata(path: &Path, format: &str) -> Metadata {
    let mut meta = Metadata::new();
    if let Some(name) = path.file_name() {
        meta.insert("file_name".into(), name.to_string_lossy().to_string().into());
    }
    meta.insert("file_extension".into(), extension_of(path).into());
    if let Ok(m) = std::fs::metadata(path) {
        meta.insert("file_size_bytes".into(), m.len().into());
    }
    meta.insert("format".into(), format.into());
    meta
}

/// Render rows as a GFM table, treating the first row as the header.
///
/// Short rows are padded to the widest row. Pipes inside cells are escaped.
/// Returns `None` for an empty table.
pub(crate) fn gfm_table(rows: Vec<Vec<String>>) -> Option<String> {
    let width = rows.iter().map(Vec::len).max().filter(|w| *w > 0)?;
    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, row) in rows.into_iter().enumerate() {
        let mut cells: Vec<String> = row.into_iter().map(|c| c.replace('|', "\\|")).collect();
        cells.resize(width, String::new());
        lines.push(format!("| {} |", cells.join(" | ")));
        if i == 0 {
            lines.push(format!("|{}", " --- |".repeat(width)));
        }
    }
    Some(lines.join("\n"))
}

/// Extension → converter dispatch table.
#[derive(Default, Clone)]
pub struct ConverterRegistry {
    by_extension: HashMap<String, Arc<dyn Converter>>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(&str, &str)> = self
            .by_extension
            .iter()
            .map(|(ext, c)| (ext.as_str(), c.name()))
            .collect();
        entries.sort_unstable();
        f.debug_struct("ConverterRegistry")
            .field("extensions", &entries)
            .finish()
    }
}

impl ConverterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in converter, configured from `config`.
    pub fn with_defaults(config: &PipelineConfig) -> Result<Self, TextCleanerError> {
        let mut registry = Self::new();
        registry.register(Arc::new(TextConverter::new()))?;
        registry.register(Arc::new(MarkdownConverter::new()))?;
        registry.register(Arc::new(CsvConverter::new(config.formats.csv.clone())))?;
        registry.register(Arc::new(HtmlConverter::new(
            config.formats.html.clone(),
            config.structure.preserve_links,
        )))?;
        registry.register(Arc::new(OfficeConverter::new(config.formats.office.clone())))?;
        registry.register(Arc::new(PdfConverter::new(
            config.formats.pdf.clone(),
            config.ocr.clone(),
        )))?;
        Ok(registry)
    }

    /// Register `converter` for all of its extensions.
    ///
    /// Nothing is registered if any extension is already claimed.
    pub fn register(&mut self, converter: Arc<dyn Converter>) -> Result<(), TextCleanerError> {
        for ext in converter.supported_extensions() {
            if let Some(existing) = self.by_extension.get(*ext) {
                return Err(TextCleanerError::Configuration(format!(
                    "extension '.{}' is claimed by both '{}' and '{}' converters",
                    ext,
                    existing.name(),
                    converter.name()
                )));
            }
        }
        for ext in converter.supported_extensions() {
            debug!("Registered converter '{}' for .{}", converter.name(), ext);
            self.by_extension
                .insert(ext.to_string(), Arc::clone(&converter));
        }
        Ok(())
    }

    /// The converter for `path`'s extension (case-insensitive).
    pub fn get_converter(&self, path: &Path) -> Result<Arc<dyn Converter>, TextCleanerError> {
        let ext = extension_of(path);
        self.by_extension
            .get(&ext)
            .cloned()
            .ok_or_else(|| TextCleanerError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: ext,
            })
    }

    /// Whether some converter claims `path`'s extension.
    pub fn supports(&self, path: &Path) -> bool {
        self.by_extension.contains_key(&extension_of(path))
    }

    /// Every registered extension, sorted.
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.by_extension.keys().cloned().collect();
        exts.sort_unstable();
        exts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake(&'static str, &'static [&'static str]);

    impl Converter for Fake {
        fn name(&self) -> &'static str {
            self.0
        }
        fn supported_extensions(&self) -> &[&'static str] {
            self.1
        }
        fn convert(&self, _path: &Path) -> Result<ConversionResult, TextCleanerError> {
            Ok(ConversionResult::new(self.0))
        }
    }

    #[test]
    fn dispatch_is_case_insensitive() {
        let mut reg = ConverterRegistry::new();
        reg.register(Arc::new(Fake("fake", &["abc"]))).unwrap();
        assert_eq!(reg.get_converter(Path::new("x/FILE.ABC")).unwrap().name(), "fake");
    }

    #[test]
    fn duplicate_extension_is_rejected_atomically() {
        let mut reg = ConverterRegistry::new();
        reg.register(Arc::new(Fake("first", &["abc"]))).unwrap();
        let err = reg
            .register(Arc::new(Fake("second", &["xyz", "abc"])))
            .unwrap_err();
        assert!(matches!(err, TextCleanerError::Configuration(_)));
        assert!(!reg.supports(Path::new("a.xyz")));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let reg = ConverterRegistry::with_defaults(&PipelineConfig::default()).unwrap();
        for name in ["a.rar", "b.exe", "noext"] {
            assert!(matches!(
                reg.get_converter(Path::new(name)),
                Err(TextCleanerError::UnsupportedFormat { .. })
            ));
        }
    }

    #[test]
    fn defaults_cover_every_family() {
        let reg = ConverterRegistry::with_defaults(&PipelineConfig::default()).unwrap();
        let expect = [
            ("a.txt", "text"),
            ("a.md", "markdown"),
            ("a.csv", "csv"),
            ("a.tsv", "csv"),
            ("a.html", "html"),
            ("a.xml", "html"),
            ("a.docx", "office"),
            ("a.xlsx", "office"),
            ("a.pptx", "office"),
            ("a.pdf", "pdf"),
        ];
        for (file, name) in expect {
            assert_eq!(reg.get_converter(Path::new(file)).unwrap().name(), name, "{file}");
        }
    }

    #[test]
    fn convert_checks_preconditions() {
        let dir = tempfile::TempDir::new().unwrap();
        let conv = TextConverter::new();
        let missing = dir.path().join("gone.txt");
        assert!(matches!(
            conv.convert(&missing),
            Err(TextCleanerError::FileNotFound { .. })
        ));
        let wrong = dir.path().join("table.csv");
        std::fs::write(&wrong, "a,b").unwrap();
        assert!(matches!(
            conv.convert(&wrong),
            Err(TextCleanerError::UnsupportedFormat { .. })
        ));
    }
}
