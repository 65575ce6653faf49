//! # textcleaner
//!
//! Turn PDF, Office, HTML, CSV and plain-text documents into compact, clean
//! text for LLM prompts.
//!
//! ## Why this crate?
//!
//! Text pulled out of real documents is full of tokens that carry no
//! meaning: running headers and footers, page numbers, watermarks, legal
//! boilerplate, wordy stock phrases and broken line wrapping. Every one of
//! them costs prompt budget. This crate extracts the text, strips the noise
//! with deterministic rules and writes the result as Markdown, plain text,
//! JSON or CSV, with per-file metrics on how much was saved.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file or directory
//!  │
//!  ├─ 1. Gate       path, symlink, size and permission checks
//!  ├─ 2. Convert    extension dispatch → raw text + metadata
//!  ├─ 3. Clean      noise removal and token-saving rewrites
//!  ├─ 4. Structure  heading/list/table/link normalisation
//!  ├─ 5. OCR fixes  only for documents that went through OCR
//!  └─ 6. Output     atomic write + ProcessingResult with metrics
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use textcleaner::{DirectoryProcessor, PipelineConfig, TextProcessor};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let processor = Arc::new(TextProcessor::new(PipelineConfig::default())?);
//!
//!     // One file: never fails, errors end up in the result.
//!     let result = processor.process_file(Path::new("report.docx"), Path::new("report.md"), None);
//!     eprintln!("ok={} metrics={:?}", result.success, result.metrics);
//!
//!     // A whole tree, processed in parallel.
//!     let results = DirectoryProcessor::new(processor)
//!         .process_directory_sync(Path::new("docs"), Path::new("processed_files"), None, true)?;
//!     eprintln!("{} files", results.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `textcleaner` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! textcleaner = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod converters;
pub mod directory;
pub mod error;
pub mod file_registry;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod processor;
pub mod progress;
pub mod security;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    AbbreviationDomain, ConfigPreset, MetadataPosition, OutputFormat, PipelineConfig,
    PipelineConfigBuilder,
};
pub use converters::{ConversionResult, Converter, ConverterRegistry, Metadata};
pub use directory::DirectoryProcessor;
pub use error::{StageError, TextCleanerError};
pub use file_registry::FileTypeRegistry;
pub use output::{OutputManager, ProcessingResult};
pub use pipeline::{ContentCleaner, OcrPostProcessor, ProcessorPipeline, Stage, StructureProcessor};
pub use processor::TextProcessor;
pub use progress::{NoopProgressCallback, ProcessingProgressCallback, ProgressCallback};
pub use security::SecurityGate;
