//! Single-file processor: the unit of failure isolation.
//!
//! ## Sequence
//!
//! ```text
//! validate input ──▶ dispatch ──▶ convert ──▶ pipeline ──▶ validate output ──▶ write
//!                                                                            │
//!                                                     metrics ◀──────────────┘
//! ```
//!
//! Every error raised along the way, including a panic inside a converter or
//! a stage, ends up in a failed [`ProcessingResult`]. Nothing escapes to the
//! batch caller.

use crate::config::{OutputFormat, PipelineConfig};
use crate::converters::{ConverterRegistry, Metadata};
use crate::error::TextCleanerError;
use crate::file_registry::FileTypeRegistry;
use crate::metrics;
use crate::output::{OutputManager, ProcessingResult};
use crate::pipeline::input::{self, ResolvedInput, DEFAULT_DOWNLOAD_TIMEOUT_SECS};
use crate::pipeline::ProcessorPipeline;
use crate::security::SecurityGate;
use serde_json::json;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything needed to process one file, built once per run and shared
/// read-only by every worker.
#[derive(Debug)]
pub struct TextProcessor {
    config: Arc<PipelineConfig>,
    converters: ConverterRegistry,
    file_types: FileTypeRegistry,
    pipeline: ProcessorPipeline,
    gate: SecurityGate,
    output: OutputManager,
}

impl TextProcessor {
    /// Validate `config` and build the converters and stages it describes.
    ///
    /// Fails with [`TextCleanerError::Configuration`] before any file is
    /// touched when the configuration is unusable.
    pub fn new(config: PipelineConfig) -> Result<Self, TextCleanerError> {
        config.validate()?;
        let converters = ConverterRegistry::with_defaults(&config)?;
        let pipeline = ProcessorPipeline::from_config(&config)?;
        let gate = SecurityGate::new(config.security.clone());
        let output = OutputManager::new(config.output.clone());
        debug!(
            "Processor ready: {} extensions, stages {:?}",
            converters.supported_extensions().len(),
            pipeline.stage_names()
        );
        Ok(Self {
            config: Arc::new(config),
            converters,
            file_types: FileTypeRegistry::new(),
            pipeline,
            gate,
            output,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Mutable access for registering extra converters before processing.
    pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.converters
    }

    pub fn file_types(&self) -> &FileTypeRegistry {
        &self.file_types
    }

    pub fn file_types_mut(&mut self) -> &mut FileTypeRegistry {
        &mut self.file_types
    }

    pub fn gate(&self) -> &SecurityGate {
        &self.gate
    }

    /// Format used when the caller names none and the output path's
    /// extension does not imply one.
    pub fn default_format(&self) -> OutputFormat {
        self.config.output.default_format
    }

    /// Whether a directory run should pick up `path`.
    pub fn is_eligible(&self, path: &Path) -> bool {
        self.file_types
            .should_process_file(path, self.config.processing.allowed_extensions.as_deref())
            && self.converters.supports(path)
    }

    /// Process one local file into `output`.
    ///
    /// Never fails: every error becomes a failed [`ProcessingResult`].
    pub fn process_file(&self, input: &Path, output: &Path, format: Option<OutputFormat>) -> ProcessingResult {
        let start = Instant::now();
        info!("Processing {}", input.display());

        let outcome = catch_unwind(AssertUnwindSafe(|| self.try_process(input, output, format, start)))
            .unwrap_or_else(|_| {
                Err(TextCleanerError::Internal(format!(
                    "processing panicked for {}",
                    input.display()
                )))
            });

        match outcome {
            Ok(result) => {
                info!(
                    "Processed {} → {} in {:.2?}",
                    input.display(),
                    output.display(),
                    start.elapsed()
                );
                result
            }
            Err(e) => {
                warn!("Failed to process {}: {}", input.display(), e);
                ProcessingResult::failed(input, e)
            }
        }
    }

    /// Like [`TextProcessor::process_file`], but `input` may be an
    /// `http(s)://` URL, which is downloaded to a temporary file first.
    pub async fn process_input(
        self: &Arc<Self>,
        input: &str,
        output: &Path,
        format: Option<OutputFormat>,
    ) -> ProcessingResult {
        let resolved = match input::resolve_input(input, DEFAULT_DOWNLOAD_TIMEOUT_SECS).await {
            Ok(r) => r,
            Err(e) => {
                warn!("Failed to resolve {}: {}", input, e);
                return ProcessingResult::failed(input, e);
            }
        };

        let processor = Arc::clone(self);
        let output_path = output.to_path_buf();
        let source = input.to_string();
        let joined = tokio::task::spawn_blocking(move || {
            let mut result = processor.process_file(resolved.path(), &output_path, format);
            if matches!(resolved, ResolvedInput::Downloaded { .. }) {
                result.input_path = PathBuf::from(&source);
                result.metadata.insert("source_url".into(), json!(source));
            }
            result
        })
        .await;

        joined.unwrap_or_else(|e| ProcessingResult::failed(input, TextCleanerError::Internal(e.to_string())))
    }

    fn try_process(
        &self,
        input: &Path,
        output: &Path,
        format: Option<OutputFormat>,
        start: Instant,
    ) -> Result<ProcessingResult, TextCleanerError> {
        self.gate
            .validate_input_file(input)
            .map_err(|reason| TextCleanerError::PathValidation {
                path: input.to_path_buf(),
                reason,
            })?;

        let format = self.output.resolve_format(output, format);
        // Unknown extensions are left to dispatch, which names the extension.
        let supported = self.file_types.get_supported_formats(input);
        if !supported.is_empty() && !supported.iter().any(|f| f == format.as_str()) {
            return Err(TextCleanerError::UnsupportedOutputFormat {
                path: input.to_path_buf(),
                format: format.as_str().to_string(),
                supported: supported.join(", "),
            });
        }

        let converter = self.converters.get_converter(input)?;
        debug!("Dispatching {} to '{}' converter", input.display(), converter.name());
        let converted = converter.convert(input)?;
        let mut metadata: Metadata = converted.metadata;
        metadata.insert("converter".into(), json!(converter.name()));

        let cleaned = self.pipeline.run(&converted.raw_text, &metadata)?;

        self.gate
            .validate_output_path(output)
            .map_err(|reason| TextCleanerError::PathValidation {
                path: output.to_path_buf(),
                reason,
            })?;
        metadata.insert("output_format".into(), json!(format.as_str()));
        self.output.write(&cleaned, &metadata, output, Some(format))?;

        let metrics = metrics::calculate(&converted.raw_text, &cleaned, start.elapsed());
        Ok(ProcessingResult::succeeded(input, output, metrics, metadata))
    }
}
