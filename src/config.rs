//! Configuration types for document conversion and cleaning.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], a typed
//! tree that mirrors the YAML configuration file section for section:
//!
//! ```yaml
//! processing:   { enable_content_cleaner: true, parallelism: 0 }
//! cleaning:     { remove_headers_footers: true, merge_short_paragraphs: false }
//! optimization: { remove_redundant_phrases: true, max_line_length: 0 }
//! structure:    { preserve_headings: true, preserve_lists: true }
//! output:       { default_format: markdown, include_metadata: false }
//! formats:
//!   csv:        { delimiter: ",", max_rows: 1000 }
//! ocr:          { enabled: false, language: eng }
//! ```
//!
//! Every section is `deny_unknown_fields`: a misspelt key fails at load time
//! with [`TextCleanerError::Configuration`] instead of being silently ignored.
//! Missing keys fall back to the defaults documented on each field.
//!
//! Three presets ([`ConfigPreset`]) cover the common cases; the builder
//! ([`PipelineConfig::builder`]) adjusts individual knobs on top of a preset.

use crate::error::TextCleanerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Resolved configuration for one processing run.
///
/// Built once and shared read-only (behind an `Arc`) by every worker.
///
/// # Example
/// ```rust
/// use textcleaner::{OutputFormat, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .output_format(OutputFormat::Json)
///     .csv_max_rows(Some(500))
///     .parallelism(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.formats.csv.max_rows, Some(500));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub processing: ProcessingConfig,
    pub cleaning: CleaningConfig,
    pub optimization: OptimizationConfig,
    pub structure: StructureConfig,
    pub output: OutputConfig,
    pub formats: FormatsConfig,
    pub ocr: OcrConfig,
    pub security: SecurityConfig,
}

/// Which stages run and how many files are processed at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Run the content-cleaning stage. Default: true.
    pub enable_content_cleaner: bool,

    /// Run the structure-normalisation stage. Default: true.
    pub enable_structure_processor: bool,

    /// Run OCR post-processing on text that came out of OCR. Default: true.
    ///
    /// The stage only touches documents whose metadata carries
    /// `ocr_applied: true`; everything else passes through untouched.
    pub enable_ocr_postprocessing: bool,

    /// Number of files processed concurrently. `0` means one per available
    /// CPU. Default: 0.
    pub parallelism: usize,

    /// Optional extension allow-list (without dots, case-insensitive) applied
    /// during directory discovery. `None` accepts every supported extension.
    pub allowed_extensions: Option<Vec<String>>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            enable_content_cleaner: true,
            enable_structure_processor: true,
            enable_ocr_postprocessing: true,
            parallelism: 0,
            allowed_extensions: None,
        }
    }
}

/// Toggles for the structural removals and normalisations of the content cleaner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleaningConfig {
    /// Drop short lines that repeat three or more times (running headers and
    /// footers). Default: true.
    pub remove_headers_footers: bool,
    /// Drop standalone page numbers and "Page N of M" lines. Default: true.
    pub remove_page_numbers: bool,
    /// Drop CONFIDENTIAL / DRAFT style watermark lines. Default: true.
    pub remove_watermarks: bool,
    /// Drop footnote markers and footnote definitions. Default: false.
    pub remove_footnotes: bool,
    /// Drop legal notices, email signatures and similar boilerplate. Default: true.
    pub remove_boilerplate: bool,
    /// Drop repeated paragraphs. Default: true.
    pub remove_duplicate_content: bool,
    /// Drop email headers, document references and bare date stamps. Default: true.
    pub remove_irrelevant_metadata: bool,
    /// Collapse runs of spaces and blank lines. Default: true.
    pub clean_whitespace: bool,
    /// Replace ligatures, smart quotes and invisible characters. Default: true.
    pub normalize_unicode: bool,
    /// Merge paragraphs shorter than 80 characters with the next one. Default: false.
    pub merge_short_paragraphs: bool,
    /// Join hard-wrapped lines that belong to one paragraph. Default: true.
    pub join_paragraph_lines: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            remove_headers_footers: true,
            remove_page_numbers: true,
            remove_watermarks: true,
            remove_footnotes: false,
            remove_boilerplate: true,
            remove_duplicate_content: true,
            remove_irrelevant_metadata: true,
            clean_whitespace: true,
            normalize_unicode: true,
            merge_short_paragraphs: false,
            join_paragraph_lines: true,
        }
    }
}

/// Token-saving rewrites applied by the content cleaner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizationConfig {
    /// "due to the fact that" → "because", and friends. Default: true.
    pub remove_redundant_phrases: bool,
    /// Collapse repeated words and consecutive duplicate lines. Default: true.
    pub condense_repetitive_patterns: bool,
    /// Collapse `!!`, `..`, `--` runs to one character. Default: true.
    pub remove_excessive_punctuation: bool,
    /// `(Smith et al., 2020)` → `[Smith et al. 2020]`. Default: true.
    pub simplify_citations: bool,
    /// Strip protocol, `www.`, query and fragment from URLs. Default: false.
    pub simplify_urls: bool,
    /// Replace common multi-word terms with abbreviations. Default: false.
    pub abbreviate_common_terms: bool,
    /// Domain-specific abbreviation tables to apply. Default: none.
    pub domain_abbreviations: Vec<AbbreviationDomain>,
    /// Wrap prose lines at this many characters; `0` disables wrapping.
    /// Default: 0.
    pub max_line_length: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            remove_redundant_phrases: true,
            condense_repetitive_patterns: true,
            remove_excessive_punctuation: true,
            simplify_citations: true,
            simplify_urls: false,
            abbreviate_common_terms: false,
            domain_abbreviations: Vec::new(),
            max_line_length: 0,
        }
    }
}

/// Structure-preservation flags for the structure processor.
///
/// The flags are independent: `preserve_lists: false` standardises list
/// markers, `preserve_headings: false` normalises headings, and leaving both
/// set makes the structure stage an identity transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructureConfig {
    pub preserve_headings: bool,
    pub preserve_lists: bool,
    /// Keep GFM table rows verbatim during cleaning. Default: true.
    pub preserve_tables: bool,
    /// Keep markdown link targets verbatim during URL simplification and
    /// keep `<a href>` targets when converting HTML. Default: true.
    pub preserve_links: bool,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            preserve_headings: true,
            preserve_lists: true,
            preserve_tables: true,
            preserve_links: true,
        }
    }
}

/// Output serialisation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Format used when neither the caller nor the output extension picks one.
    pub default_format: OutputFormat,
    /// Emit a "Document Metadata" section (markdown) or key (json). Default: false.
    pub include_metadata: bool,
    /// Where the markdown metadata section goes. Default: end.
    pub metadata_position: MetadataPosition,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::Markdown,
            include_metadata: false,
            metadata_position: MetadataPosition::End,
        }
    }
}

/// Per-converter options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatsConfig {
    pub csv: CsvFormatConfig,
    pub html: HtmlFormatConfig,
    pub office: OfficeFormatConfig,
    pub pdf: PdfFormatConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvFormatConfig {
    /// Field delimiter. `.tsv` files always use a tab. Default: `,`.
    pub delimiter: char,
    /// Quote character. Default: `"`.
    pub quotechar: char,
    /// Maximum number of records emitted, header included. `None` = all.
    pub max_rows: Option<usize>,
    /// Emit the first record. Default: true.
    pub include_header: bool,
}

impl Default for CsvFormatConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quotechar: '"',
            max_rows: None,
            include_header: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HtmlFormatConfig {
    /// Render `<a href>` as `[text](href)` instead of bare text. Default: true.
    pub preserve_links: bool,
    /// Drop `<nav>`, `<header>`, `<footer>` and `<aside>`. Default: true.
    pub remove_navigation: bool,
}

impl Default for HtmlFormatConfig {
    fn default() -> Self {
        Self {
            preserve_links: true,
            remove_navigation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OfficeFormatConfig {
    /// Prefix each spreadsheet table with `## Sheet: <name>`. Default: true.
    pub include_sheet_names: bool,
}

impl Default for OfficeFormatConfig {
    fn default() -> Self {
        Self {
            include_sheet_names: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PdfFormatConfig {
    /// User password for encrypted PDFs.
    pub password: Option<String>,
    /// Pages with fewer extracted characters than this are sent to OCR
    /// (when [`OcrConfig::enabled`]). Default: 10.
    pub min_chars_per_page: usize,
}

impl Default for PdfFormatConfig {
    fn default() -> Self {
        Self {
            password: None,
            min_chars_per_page: 10,
        }
    }
}

/// OCR fallback for scanned PDF pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OcrConfig {
    /// Default: false. Requires the `command` binary on `PATH`.
    pub enabled: bool,
    /// Tesseract language code(s), e.g. `eng` or `eng+deu`. Default: `eng`.
    pub language: String,
    /// OCR executable. Default: `tesseract`.
    pub command: String,
    /// Render resolution for OCR pages. Range: 72–600. Default: 300.
    pub dpi: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            language: "eng".to_string(),
            command: "tesseract".to_string(),
            dpi: 300,
        }
    }
}

/// Limits enforced by the security gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Maximum input size for extensions without a specific limit. Default: 300 MB.
    pub max_file_size_mb: u64,
    /// Per-extension overrides (lowercase, no dot).
    pub per_extension_size_mb: BTreeMap<String, u64>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        let per_extension_size_mb = [("pdf", 50), ("docx", 30), ("xlsx", 20), ("txt", 200)]
            .into_iter()
            .map(|(ext, mb)| (ext.to_string(), mb))
            .collect();
        Self {
            max_file_size_mb: 300,
            per_extension_size_mb,
        }
    }
}

impl SecurityConfig {
    /// Size limit in bytes for a file with the given (lowercase) extension.
    pub fn limit_bytes(&self, extension: &str) -> u64 {
        let mb = self
            .per_extension_size_mb
            .get(extension)
            .copied()
            .unwrap_or(self.max_file_size_mb);
        mb.saturating_mul(1024 * 1024)
    }
}

// ── Loading ──────────────────────────────────────────────────────────────

impl PipelineConfig {
    /// Create a new builder starting from the `standard` preset.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// The configuration for a named preset.
    pub fn preset(preset: ConfigPreset) -> Self {
        let mut c = Self::default();
        match preset {
            ConfigPreset::Standard => {}
            ConfigPreset::Minimal => {
                c.cleaning = CleaningConfig {
                    remove_headers_footers: false,
                    remove_page_numbers: false,
                    remove_watermarks: false,
                    remove_footnotes: false,
                    remove_boilerplate: false,
                    remove_duplicate_content: false,
                    remove_irrelevant_metadata: false,
                    clean_whitespace: true,
                    normalize_unicode: true,
                    merge_short_paragraphs: false,
                    join_paragraph_lines: false,
                };
                c.optimization = OptimizationConfig {
                    remove_redundant_phrases: false,
                    condense_repetitive_patterns: false,
                    remove_excessive_punctuation: false,
                    simplify_citations: false,
                    ..OptimizationConfig::default()
                };
            }
            ConfigPreset::Aggressive => {
                c.cleaning.remove_footnotes = true;
                c.cleaning.merge_short_paragraphs = true;
                c.optimization.simplify_urls = true;
                c.optimization.abbreviate_common_terms = true;
                c.structure.preserve_lists = false;
            }
        }
        c
    }

    /// Parse a YAML document, rejecting unknown keys, then validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, TextCleanerError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| TextCleanerError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TextCleanerError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            TextCleanerError::Configuration(format!(
                "cannot read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&text).map_err(|e| match e {
            TextCleanerError::Configuration(msg) => {
                TextCleanerError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Config file if given, otherwise the named preset.
    pub fn load(path: Option<&Path>, preset: ConfigPreset) -> Result<Self, TextCleanerError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::preset(preset)),
        }
    }

    /// Serialise to YAML (used by `generate-config`).
    pub fn to_yaml(&self) -> Result<String, TextCleanerError> {
        serde_yaml::to_string(self).map_err(|e| TextCleanerError::Internal(e.to_string()))
    }

    /// Look up a value by dotted path, e.g. `"formats.csv.max_rows"`.
    ///
    /// Returns `None` for unknown keys. Prefer the typed fields in code; this
    /// exists for diagnostics and for tooling that only knows key names.
    pub fn get(&self, dotted_key: &str) -> Option<serde_yaml::Value> {
        let mut current = serde_yaml::to_value(self).ok()?;
        for part in dotted_key.split('.') {
            current = match current {
                serde_yaml::Value::Mapping(mut map) => map.remove(part)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Number of concurrent workers after resolving `parallelism: 0`.
    pub fn effective_parallelism(&self) -> usize {
        if self.processing.parallelism > 0 {
            return self.processing.parallelism;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), TextCleanerError> {
        let csv = &self.formats.csv;
        if !csv.delimiter.is_ascii() || csv.delimiter == '\n' {
            return Err(TextCleanerError::Configuration(format!(
                "formats.csv.delimiter must be a single ASCII character, got {:?}",
                csv.delimiter
            )));
        }
        if !csv.quotechar.is_ascii() {
            return Err(TextCleanerError::Configuration(format!(
                "formats.csv.quotechar must be a single ASCII character, got {:?}",
                csv.quotechar
            )));
        }
        if csv.max_rows == Some(0) {
            return Err(TextCleanerError::Configuration(
                "formats.csv.max_rows must be ≥ 1 (omit it for no limit)".into(),
            ));
        }
        if !(72..=600).contains(&self.ocr.dpi) {
            return Err(TextCleanerError::Configuration(format!(
                "ocr.dpi must be 72–600, got {}",
                self.ocr.dpi
            )));
        }
        let wrap = self.optimization.max_line_length;
        if wrap != 0 && wrap < 20 {
            return Err(TextCleanerError::Configuration(format!(
                "optimization.max_line_length must be 0 (off) or ≥ 20, got {}",
                wrap
            )));
        }
        if self.security.max_file_size_mb == 0 {
            return Err(TextCleanerError::Configuration(
                "security.max_file_size_mb must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Reset every section to the given preset; call before other setters.
    pub fn preset(mut self, preset: ConfigPreset) -> Self {
        self.config = PipelineConfig::preset(preset);
        self
    }

    pub fn parallelism(mut self, n: usize) -> Self {
        self.config.processing.parallelism = n;
        self
    }

    pub fn allowed_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.processing.allowed_extensions = Some(
            exts.into_iter()
                .map(|e| e.into().trim_start_matches('.').to_lowercase())
                .collect(),
        );
        self
    }

    pub fn enable_content_cleaner(mut self, v: bool) -> Self {
        self.config.processing.enable_content_cleaner = v;
        self
    }

    pub fn enable_structure_processor(mut self, v: bool) -> Self {
        self.config.processing.enable_structure_processor = v;
        self
    }

    pub fn enable_ocr_postprocessing(mut self, v: bool) -> Self {
        self.config.processing.enable_ocr_postprocessing = v;
        self
    }

    pub fn merge_short_paragraphs(mut self, v: bool) -> Self {
        self.config.cleaning.merge_short_paragraphs = v;
        self
    }

    pub fn remove_headers_footers(mut self, v: bool) -> Self {
        self.config.cleaning.remove_headers_footers = v;
        self
    }

    pub fn simplify_urls(mut self, v: bool) -> Self {
        self.config.optimization.simplify_urls = v;
        self
    }

    /// `0` disables wrapping; other values are clamped to 20–1000.
    pub fn max_line_length(mut self, n: usize) -> Self {
        self.config.optimization.max_line_length = if n == 0 { 0 } else { n.clamp(20, 1000) };
        self
    }

    pub fn preserve_headings(mut self, v: bool) -> Self {
        self.config.structure.preserve_headings = v;
        self
    }

    pub fn preserve_lists(mut self, v: bool) -> Self {
        self.config.structure.preserve_lists = v;
        self
    }

    pub fn preserve_links(mut self, v: bool) -> Self {
        self.config.structure.preserve_links = v;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output.default_format = format;
        self
    }

    pub fn include_metadata(mut self, v: bool) -> Self {
        self.config.output.include_metadata = v;
        self
    }

    pub fn csv_delimiter(mut self, c: char) -> Self {
        self.config.formats.csv.delimiter = c;
        self
    }

    /// `Some(0)` is treated as `Some(1)`.
    pub fn csv_max_rows(mut self, n: Option<usize>) -> Self {
        self.config.formats.csv.max_rows = n.map(|n| n.max(1));
        self
    }

    pub fn ocr_enabled(mut self, v: bool) -> Self {
        self.config.ocr.enabled = v;
        self
    }

    pub fn ocr_dpi(mut self, dpi: u32) -> Self {
        self.config.ocr.dpi = dpi.clamp(72, 600);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, TextCleanerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Named starting points for a configuration.
///
/// | Preset | Effect |
/// |--------|--------|
/// | `minimal` | whitespace and unicode normalisation only |
/// | `standard` | structural removals, phrase and punctuation rewrites (default) |
/// | `aggressive` | standard + footnotes, short-paragraph merging, URL and term abbreviation, list standardisation |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigPreset {
    Minimal,
    #[default]
    Standard,
    Aggressive,
}

impl FromStr for ConfigPreset {
    type Err = TextCleanerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minimal" => Ok(ConfigPreset::Minimal),
            "standard" => Ok(ConfigPreset::Standard),
            "aggressive" => Ok(ConfigPreset::Aggressive),
            other => Err(TextCleanerError::Configuration(format!(
                "unknown preset '{}' (expected minimal, standard or aggressive)",
                other
            ))),
        }
    }
}

impl fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigPreset::Minimal => "minimal",
            ConfigPreset::Standard => "standard",
            ConfigPreset::Aggressive => "aggressive",
        })
    }
}

/// Serialisation format for processed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Markdown,
    PlainText,
    Json,
    Csv,
}

impl OutputFormat {
    /// Registry key, e.g. `plain_text`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::PlainText => "plain_text",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }

    /// Infer the format from a file extension (`md`, `txt`, `json`, `csv`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "md" | "markdown" => Some(OutputFormat::Markdown),
            "txt" | "text" => Some(OutputFormat::PlainText),
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = TextCleanerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "plain_text" | "plain" | "text" | "txt" => Ok(OutputFormat::PlainText),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(TextCleanerError::Configuration(format!(
                "unknown output format '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placement of the markdown "Document Metadata" section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataPosition {
    Start,
    #[default]
    End,
}

/// Domain-specific abbreviation tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbbreviationDomain {
    Legal,
    Technical,
    Academic,
    Business,
    Medical,
}
