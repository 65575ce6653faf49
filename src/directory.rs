//! Directory processor: discovery plus a bounded concurrent worker pool.
//!
//! Discovery walks the input root (optionally recursively) and keeps every
//! file the processor can handle. Each file then runs through
//! [`TextProcessor::process_file`] on tokio's blocking pool, at most
//! `effective_parallelism()` at a time. Because the single-file processor
//! never fails, one bad file cannot cancel its siblings: the batch returns
//! exactly one [`ProcessingResult`] per discovered file, in completion order.
//!
//! The only fatal errors are those raised before any file is touched: an
//! input root that fails the security gate or is not a directory.

use crate::config::OutputFormat;
use crate::error::TextCleanerError;
use crate::output::ProcessingResult;
use crate::processor::TextProcessor;
use crate::progress::{NoopProgressCallback, ProgressCallback};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Runs a [`TextProcessor`] over every eligible file below a root.
pub struct DirectoryProcessor {
    processor: Arc<TextProcessor>,
    progress: ProgressCallback,
}

impl std::fmt::Debug for DirectoryProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryProcessor")
            .field("processor", &self.processor)
            .finish_non_exhaustive()
    }
}

impl DirectoryProcessor {
    pub fn new(processor: Arc<TextProcessor>) -> Self {
        Self {
            processor,
            progress: Arc::new(NoopProgressCallback),
        }
    }

    /// Receive batch and per-file events.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn processor(&self) -> &Arc<TextProcessor> {
        &self.processor
    }

    /// Eligible files below `root`, sorted by path.
    ///
    /// Symlinks are not followed but are still listed when their name is
    /// eligible, so the security gate reports them as failed results.
    pub fn discover(&self, root: &Path, recursive: bool) -> Result<Vec<PathBuf>, TextCleanerError> {
        self.processor
            .gate()
            .validate_path(root)
            .map_err(|reason| TextCleanerError::PathValidation {
                path: root.to_path_buf(),
                reason,
            })?;
        if !root.is_dir() {
            return Err(TextCleanerError::PathValidation {
                path: root.to_path_buf(),
                reason: format!("Path is not a directory: {}", root.display()),
            });
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();
        for entry in WalkDir::new(root).max_depth(max_depth).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            let candidate = entry.file_type().is_file() || entry.path_is_symlink();
            if candidate && self.processor.is_eligible(entry.path()) {
                files.push(entry.into_path());
            } else if candidate {
                debug!("Ignoring {}", entry.path().display());
            }
        }
        files.sort();
        info!("Discovered {} eligible files under {}", files.len(), root.display());
        Ok(files)
    }

    /// Process every eligible file under `input_dir` into `output_dir`,
    /// mirroring the relative layout.
    ///
    /// Output files take the default extension of `format` (or the
    /// configured default format). When two inputs would map to the same
    /// output, both keep their original extension in the output name.
    pub async fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        format: Option<OutputFormat>,
        recursive: bool,
    ) -> Result<Vec<ProcessingResult>, TextCleanerError> {
        let start = Instant::now();
        let files = self.discover(input_dir, recursive)?;
        let format = format.unwrap_or_else(|| self.processor.default_format());
        let extension = self
            .processor
            .file_types()
            .get_default_extension(format.as_str())
            .to_string();
        let jobs = output_paths(&files, input_dir, output_dir, &extension);
        let total = jobs.len();
        let workers = self.processor.config().effective_parallelism().max(1);

        info!(
            "Processing {} files from {} with {} workers",
            total,
            input_dir.display(),
            workers
        );
        self.progress.on_batch_start(total);

        let results: Vec<ProcessingResult> = stream::iter(jobs.into_iter().map(|(input, output)| {
            let processor = Arc::clone(&self.processor);
            let progress = Arc::clone(&self.progress);
            async move {
                progress.on_file_start(&input);
                let fallback = input.clone();
                let result = tokio::task::spawn_blocking(move || {
                    processor.process_file(&input, &output, Some(format))
                })
                .await
                .unwrap_or_else(|e| ProcessingResult::failed(fallback, TextCleanerError::Internal(e.to_string())));
                progress.on_file_complete(&result);
                result
            }
        }))
        .buffer_unordered(workers)
        .collect()
        .await;

        let succeeded = results.iter().filter(|r| r.success).count();
        let failed = results.len() - succeeded;
        self.progress.on_batch_complete(succeeded, failed);
        info!(
            "Directory run complete: {} ok, {} failed in {:.2?}",
            succeeded,
            failed,
            start.elapsed()
        );
        Ok(results)
    }

    /// Synchronous wrapper around [`DirectoryProcessor::process_directory`].
    ///
    /// Creates a temporary tokio runtime internally.
    pub fn process_directory_sync(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        format: Option<OutputFormat>,
        recursive: bool,
    ) -> Result<Vec<ProcessingResult>, TextCleanerError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| TextCleanerError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.process_directory(input_dir, output_dir, format, recursive))
    }
}

/// Pair every input with its mirrored output path.
///
/// Inputs whose mirrored paths clash keep their source extension
/// (`a.txt` → `a.txt.md`); if that is taken too, a counter is added
/// (`a.txt.2.md`). Every output path in the result is distinct.
fn output_paths(files: &[PathBuf], input_dir: &Path, output_dir: &Path, extension: &str) -> Vec<(PathBuf, PathBuf)> {
    let relative = |file: &PathBuf| file.strip_prefix(input_dir).unwrap_or(file).to_path_buf();
    let plain = |file: &PathBuf| output_dir.join(relative(file)).with_extension(extension);

    let mut claims: HashMap<PathBuf, usize> = HashMap::new();
    for file in files {
        *claims.entry(plain(file)).or_default() += 1;
    }
    // Uncontested mirrored paths are reserved up front so renamed outputs
    // cannot land on them.
    let mut assigned: HashSet<PathBuf> = claims
        .iter()
        .filter(|(_, &n)| n == 1)
        .map(|(p, _)| p.clone())
        .collect();

    files
        .iter()
        .map(|file| {
            let target = plain(file);
            if claims.get(&target).copied().unwrap_or(0) <= 1 {
                return (file.clone(), target);
            }
            let target = output_dir.join(relative(file));
            let name = target
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "output".to_string());
            let mut output = target.with_file_name(format!("{name}.{extension}"));
            let mut counter = 2;
            while assigned.contains(&output) {
                output = target.with_file_name(format!("{name}.{counter}.{extension}"));
                counter += 1;
            }
            assigned.insert(output.clone());
            (file.clone(), output)
        })
        .collect()
}
