//! CLI binary for textcleaner.
//!
//! A thin shim over the library crate: maps flags to a `PipelineConfig`,
//! runs a single file or a directory and prints a summary. Per-file failures
//! are reported but do not change the exit status; configuration problems and
//! an unusable input root do.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use textcleaner::pipeline::input::{download_filename, is_url};
use textcleaner::{
    ConfigPreset, DirectoryProcessor, OutputFormat, PipelineConfig, ProcessingProgressCallback,
    ProcessingResult, ProgressCallback, TextProcessor,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Renders one bar for the whole batch and a log line per failed file.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>4}/{len} files  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Cleaning");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ProcessingProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.reset_eta();
    }

    fn on_file_start(&self, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.bar.set_message(name);
    }

    fn on_file_complete(&self, result: &ProcessingResult) {
        if !result.success {
            self.bar.println(format!(
                "  {} {}  {}",
                red("✗"),
                result.input_path.display(),
                dim(&first_line(result.error.as_deref().unwrap_or("unknown error"))),
            ));
        }
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Clean a whole tree into processed_files/
  textcleaner process ./docs

  # One file, JSON output
  textcleaner process report.pdf out/report.json

  # Aggressive cleaning, top-level files only
  textcleaner process ./docs ./clean --config-type aggressive --no-recursive

  # Start from a preset and edit it
  textcleaner generate-config textcleaner.yaml --config-type minimal
  textcleaner process ./docs --config textcleaner.yaml

SUPPORTED INPUTS:
  pdf, docx, odt, pptx, odp, xlsx, xls, ods, html, htm, xhtml, xml,
  csv, tsv, md, markdown, txt, text, log, and http(s):// URLs

ENVIRONMENT VARIABLES:
  RUST_LOG             Overrides --log-level (tracing EnvFilter syntax)
  TEXTCLEANER_CONFIG   Default for --config
  PDFIUM_LIB_PATH      Directory containing libpdfium for PDF input
"#;

/// Convert documents into clean, token-efficient text for LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "textcleaner",
    version,
    about = "Convert documents into clean, token-efficient text for LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "TEXTCLEANER_VERBOSE")]
    verbose: bool,

    /// Log level: error, warn, info, debug, trace.
    #[arg(long, global = true, env = "TEXTCLEANER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Append logs to this file instead of stderr.
    #[arg(long, global = true, env = "TEXTCLEANER_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean a file, URL or directory.
    Process {
        /// Input file, directory or HTTP/HTTPS URL.
        input: String,

        /// Output file or directory.
        #[arg(default_value = "processed_files")]
        output: PathBuf,

        /// YAML configuration file.
        #[arg(short, long, env = "TEXTCLEANER_CONFIG")]
        config: Option<PathBuf>,

        /// Output format: markdown, plain_text, json, csv.
        #[arg(short, long, value_parser = parse_format)]
        format: Option<OutputFormat>,

        /// Preset used when no --config is given.
        #[arg(long, value_enum, default_value = "standard")]
        config_type: PresetArg,

        /// Only process the top level of an input directory.
        #[arg(long)]
        no_recursive: bool,

        /// Disable the progress bar.
        #[arg(long, env = "TEXTCLEANER_NO_PROGRESS")]
        no_progress: bool,
    },

    /// Write a preset configuration as YAML.
    GenerateConfig {
        /// Destination YAML file.
        output: PathBuf,

        /// Preset to write.
        #[arg(long, value_enum, default_value = "standard")]
        config_type: PresetArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PresetArg {
    Minimal,
    Standard,
    Aggressive,
}

impl From<PresetArg> for ConfigPreset {
    fn from(v: PresetArg) -> Self {
        match v {
            PresetArg::Minimal => ConfigPreset::Minimal,
            PresetArg::Standard => ConfigPreset::Standard,
            PresetArg::Aggressive => ConfigPreset::Aggressive,
        }
    }
}

fn parse_format(s: &str) -> std::result::Result<OutputFormat, String> {
    s.parse::<OutputFormat>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let show_progress = match &cli.command {
        Command::Process { no_progress, .. } => !no_progress,
        Command::GenerateConfig { .. } => false,
    };
    init_logging(&cli, show_progress)?;

    match cli.command {
        Command::GenerateConfig {
            output,
            config_type,
        } => generate_config(&output, config_type.into()),
        Command::Process {
            input,
            output,
            config,
            format,
            config_type,
            no_recursive,
            no_progress,
        } => {
            let config = PipelineConfig::load(config.as_deref(), config_type.into())
                .context("Failed to load configuration")?;
            let processor =
                Arc::new(TextProcessor::new(config).context("Invalid configuration")?);
            let start = Instant::now();
            let results = if is_url(&input) || Path::new(&input).is_file() {
                vec![process_single(&processor, &input, &output, format).await]
            } else {
                let input_dir = Path::new(&input);
                let mut runner = DirectoryProcessor::new(Arc::clone(&processor));
                if !no_progress {
                    runner = runner.with_progress(CliProgressCallback::new() as ProgressCallback);
                }
                runner
                    .process_directory(input_dir, &output, format, !no_recursive)
                    .await
                    .with_context(|| format!("Cannot process input '{}'", input))?
            };
            print_summary(&results, start.elapsed());
            Ok(())
        }
    }
}

// ── Logging setup ────────────────────────────────────────────────────────────

fn init_logging(cli: &Cli, show_progress: bool) -> Result<()> {
    // INFO lines on stderr would tear the progress bar; the bar reports
    // the same thing.
    let level = if cli.verbose {
        "debug"
    } else if show_progress && cli.log_file.is_none() {
        "warn"
    } else {
        cli.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

// ── Commands ─────────────────────────────────────────────────────────────────

fn generate_config(output: &Path, preset: ConfigPreset) -> Result<()> {
    let yaml = PipelineConfig::preset(preset)
        .to_yaml()
        .context("Failed to serialise configuration")?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(output, yaml)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {} configuration to {}", preset, output.display());
    Ok(())
}

/// Process one file or URL; failures come back as a failed result.
async fn process_single(
    processor: &Arc<TextProcessor>,
    input: &str,
    output: &Path,
    format: Option<OutputFormat>,
) -> ProcessingResult {
    let target = single_output_path(processor, input, output, format);
    processor.process_input(input, &target, format).await
}

/// `output` itself when it names a file, otherwise a file inside it named
/// after the input.
fn single_output_path(
    processor: &TextProcessor,
    input: &str,
    output: &Path,
    format: Option<OutputFormat>,
) -> PathBuf {
    if output.extension().is_some() && !output.is_dir() {
        return output.to_path_buf();
    }
    let name = if is_url(input) {
        download_filename(input, None)
    } else {
        Path::new(input)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string())
    };
    let format = format.unwrap_or_else(|| processor.default_format());
    let extension = processor.file_types().get_default_extension(format.as_str());
    output.join(Path::new(&name).with_extension(extension))
}

fn print_summary(results: &[ProcessingResult], elapsed: Duration) {
    let succeeded = results.iter().filter(|r| r.success).count();
    let failed = results.len() - succeeded;
    println!(
        "Processed {} files in {:.2}s: {} successful, {} failed",
        results.len(),
        elapsed.as_secs_f64(),
        succeeded,
        failed
    );
    for result in results.iter().filter(|r| !r.success) {
        eprintln!(
            "  {} {}: {}",
            red("✗"),
            result.input_path.display(),
            first_line(result.error.as_deref().unwrap_or("unknown error"))
        );
    }
    if failed == 0 && !results.is_empty() {
        eprintln!("{} all files cleaned", green("✔"));
    } else if !results.is_empty() {
        eprintln!("{} {} of {} files failed", cyan("⚠"), failed, results.len());
    }
}

fn first_line(s: &str) -> String {
    s.lines().next().unwrap_or_default().to_string()
}
