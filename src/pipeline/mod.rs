//! Text-processing stages and the pipeline that runs them.
//!
//! Each submodule implements exactly one transformation step. Stages are
//! pure functions of their input text and their own configuration, so one
//! pipeline instance is shared read-only by every worker.
//!
//! ## Data Flow
//!
//! ```text
//! raw text ──▶ cleaner ──▶ structure ──▶ ocr ──▶ cleaned text
//!              (noise,      (headings,    (only when the converter
//!               rewrites)    lists, …)     reports ocr_applied)
//! ```
//!
//! 1. [`cleaner`]   : noise removal and token-saving rewrites
//! 2. [`structure`] : heading/list/table/link normalisation
//! 3. [`ocr`]       : OCR confusion fixes
//!
//! A stage disabled in configuration is not part of the pipeline at all.
//! [`input`] resolves URL inputs to local files before conversion.

pub mod cleaner;
pub mod input;
pub mod markup;
pub mod ocr;
pub mod phrases;
pub mod structure;

pub use cleaner::ContentCleaner;
pub use ocr::OcrPostProcessor;
pub use structure::StructureProcessor;

use crate::config::PipelineConfig;
use crate::converters::Metadata;
use crate::error::{StageError, TextCleanerError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::debug;

/// One text-to-text step of the pipeline.
pub trait Stage: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Whether the stage should run for a document with `metadata`.
    fn applies_to(&self, _metadata: &Metadata) -> bool {
        true
    }

    /// Transform `text`. Empty input must produce empty output.
    fn process(&self, text: &str, metadata: &Metadata) -> Result<String, StageError>;
}

/// An ordered, immutable sequence of stages.
pub struct ProcessorPipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl std::fmt::Debug for ProcessorPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorPipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl ProcessorPipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Build the stages enabled in `config`, in their fixed order.
    ///
    /// Fails with [`TextCleanerError::Configuration`] when no stage is
    /// enabled.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, TextCleanerError> {
        let mut stages: Vec<Box<dyn Stage>> = Vec::new();
        if config.processing.enable_content_cleaner {
            stages.push(Box::new(ContentCleaner::new(
                &config.cleaning,
                &config.optimization,
                config.structure.preserve_links,
            )));
        }
        if config.processing.enable_structure_processor {
            stages.push(Box::new(StructureProcessor::new(&config.structure)));
        }
        if config.processing.enable_ocr_postprocessing {
            stages.push(Box::new(OcrPostProcessor::new()));
        }
        if stages.is_empty() {
            return Err(TextCleanerError::Configuration(
                "no processing stages enabled".into(),
            ));
        }
        let pipeline = Self::new(stages);
        debug!("Pipeline stages: {:?}", pipeline.stage_names());
        Ok(pipeline)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Fold `text` through every applicable stage in order.
    ///
    /// The first failing stage aborts the run. A stage that panics is
    /// reported as a [`TextCleanerError::PipelineStage`] failure instead of
    /// unwinding into the caller.
    pub fn run(&self, text: &str, metadata: &Metadata) -> Result<String, TextCleanerError> {
        if text.is_empty() {
            return Ok(String::new());
        }
        let mut current = text.to_string();
        for stage in &self.stages {
            if !stage.applies_to(metadata) {
                debug!("Skipping stage {} for this document", stage.name());
                continue;
            }
            let start = Instant::now();
            let input_len = current.len();
            current = catch_unwind(AssertUnwindSafe(|| stage.process(&current, metadata)))
                .unwrap_or_else(|panic| Err(StageError::new(stage.name(), panic_message(&panic))))?;
            debug!(
                "Stage {}: {} → {} bytes in {:.1?}",
                stage.name(),
                input_len,
                current.len(),
                start.elapsed()
            );
        }
        Ok(current)
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("stage panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("stage panicked: {s}")
    } else {
        "stage panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Upper;

    impl Stage for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn process(&self, text: &str, _metadata: &Metadata) -> Result<String, StageError> {
            Ok(text.to_uppercase())
        }
    }

    struct Refuses;

    impl Stage for Refuses {
        fn name(&self) -> &'static str {
            "refuses"
        }

        fn process(&self, _text: &str, _metadata: &Metadata) -> Result<String, StageError> {
            Err(StageError::new("refuses", "not today"))
        }
    }

    struct Panics;

    impl Stage for Panics {
        fn name(&self) -> &'static str {
            "panics"
        }

        fn process(&self, _text: &str, _metadata: &Metadata) -> Result<String, StageError> {
            panic!("boom")
        }
    }

    #[test]
    fn default_config_builds_cleaner_and_structure() {
        let pipeline = ProcessorPipeline::from_config(&PipelineConfig::default()).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["content_cleaner", "structure_processor", "ocr_postprocessor"]
        );
    }

    #[test]
    fn no_stages_is_a_configuration_error() {
        let mut config = PipelineConfig::default();
        config.processing.enable_content_cleaner = false;
        config.processing.enable_structure_processor = false;
        config.processing.enable_ocr_postprocessing = false;
        assert!(matches!(
            ProcessorPipeline::from_config(&config),
            Err(TextCleanerError::Configuration(_))
        ));
    }

    #[test]
    fn disabled_stage_is_absent() {
        let mut config = PipelineConfig::default();
        config.processing.enable_structure_processor = false;
        let pipeline = ProcessorPipeline::from_config(&config).unwrap();
        assert!(!pipeline.stage_names().contains(&"structure_processor"));
    }

    #[test]
    fn empty_text_stays_empty() {
        let pipeline = ProcessorPipeline::new(vec![Box::new(Upper), Box::new(Refuses)]);
        assert_eq!(pipeline.run("", &Metadata::new()).unwrap(), "");
    }

    #[test]
    fn stages_run_in_order_and_failures_surface() {
        let ok = ProcessorPipeline::new(vec![Box::new(Upper)]);
        assert_eq!(ok.run("abc", &Metadata::new()).unwrap(), "ABC");

        let failing = ProcessorPipeline::new(vec![Box::new(Upper), Box::new(Refuses)]);
        match failing.run("abc", &Metadata::new()) {
            Err(TextCleanerError::PipelineStage { stage, reason }) => {
                assert_eq!(stage, "refuses");
                assert_eq!(reason, "not today");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn panicking_stage_becomes_error() {
        let pipeline = ProcessorPipeline::new(vec![Box::new(Panics)]);
        match pipeline.run("abc", &Metadata::new()) {
            Err(TextCleanerError::PipelineStage { stage, reason }) => {
                assert_eq!(stage, "panics");
                assert!(reason.contains("boom"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn ocr_stage_runs_only_for_ocr_documents() {
        let pipeline = ProcessorPipeline::new(vec![Box::new(OcrPostProcessor::new())]);
        let mut meta = Metadata::new();
        assert_eq!(pipeline.run("c0de", &meta).unwrap(), "c0de");
        meta.insert("ocr_applied".into(), json!(true));
        assert_eq!(pipeline.run("c0de", &meta).unwrap(), "code");
    }
}
