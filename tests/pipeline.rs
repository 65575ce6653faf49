//! Integration tests for the library: dispatch, cleaning properties and
//! batch behaviour, all against fixtures written into temp directories.

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use textcleaner::converters::CsvConverter;
use textcleaner::{
    ContentCleaner, Converter, ConverterRegistry, DirectoryProcessor, Metadata, PipelineConfig,
    ProcessorPipeline, StructureProcessor, TextCleanerError, TextProcessor,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn processor() -> Arc<TextProcessor> {
    Arc::new(TextProcessor::new(PipelineConfig::default()).unwrap())
}

const SAMPLES: &[&str] = &[
    "",
    "Plain sentence.",
    "Due to the fact that the   server was down,, we waited!!!!\n\n\nIn order to fix it we rebooted.",
    "ACME Corp\nIntro text here.\n\nACME Corp\nMore text follows.\n\nACME Corp\nEnd of the story.\n\nPage 3 of 9",
    "# Title\n\n- first\n+ second\n1) third\n\n| a | b |\n| --- | --- |\n| 1 | 2 |\n\nSee [docs](https://example.com/docs?a=1).",
    "Overview\n\nThe quick brown fox jumps over the lazy dog and keeps running far away.\n\nThe quick brown fox jumps over the lazy dog and keeps running far away.",
    "```\nkeep    this\n\n\n\nexactly\n```\nafter the   fence",
    "Smart \u{201c}quotes\u{201d} and \u{fb01}ne ligatures\u{200b}.\nA hyphen-\nated word across lines.",
];

// ── Dispatch ─────────────────────────────────────────────────────────────────

#[test]
fn every_supported_extension_has_exactly_one_converter() {
    let registry = ConverterRegistry::with_defaults(&PipelineConfig::default()).unwrap();
    let extensions = registry.supported_extensions();
    assert!(extensions.len() >= 15);
    for ext in &extensions {
        let path = PathBuf::from(format!("file.{ext}"));
        let converter = registry.get_converter(&path).unwrap();
        assert!(converter.supported_extensions().contains(&ext.as_str()), "{ext}");
        let upper = PathBuf::from(format!("FILE.{}", ext.to_uppercase()));
        assert_eq!(registry.get_converter(&upper).unwrap().name(), converter.name());
    }
}

#[test]
fn unsupported_extensions_fail_dispatch() {
    let registry = ConverterRegistry::with_defaults(&PipelineConfig::default()).unwrap();
    for name in ["a.exe", "a.bmp", "a.zip", "a.doc", "no_extension"] {
        match registry.get_converter(Path::new(name)) {
            Err(TextCleanerError::UnsupportedFormat { .. }) => {}
            Err(other) => panic!("{name}: unexpected error {other}"),
            Ok(c) => panic!("{name}: dispatched to {}", c.name()),
        }
    }
}

// ── Stage properties ─────────────────────────────────────────────────────────

#[test]
fn content_cleaner_is_idempotent() {
    for preset in ["minimal", "standard", "aggressive"] {
        let config = PipelineConfig::preset(preset.parse().unwrap());
        let cleaner = ContentCleaner::new(
            &config.cleaning,
            &config.optimization,
            config.structure.preserve_links,
        );
        for sample in SAMPLES {
            let once = cleaner.clean(sample);
            assert_eq!(cleaner.clean(&once), once, "{preset}: {sample:?}");
        }
    }
}

#[test]
fn structure_processor_is_idempotent() {
    for preset in ["minimal", "standard", "aggressive"] {
        let config = PipelineConfig::preset(preset.parse().unwrap());
        let structure = StructureProcessor::new(&config.structure);
        for sample in SAMPLES {
            let once = structure.normalise(sample);
            assert_eq!(structure.normalise(&once), once, "{preset}: {sample:?}");
        }
    }
}

#[test]
fn empty_text_through_full_pipeline_is_empty() {
    let pipeline = ProcessorPipeline::from_config(&PipelineConfig::default()).unwrap();
    let mut metadata = Metadata::new();
    assert_eq!(pipeline.run("", &metadata).unwrap(), "");
    metadata.insert("ocr_applied".into(), json!(true));
    assert_eq!(pipeline.run("", &metadata).unwrap(), "");
}

#[test]
fn redundant_phrase_becomes_because() {
    let config = PipelineConfig::default();
    let cleaner = ContentCleaner::new(&config.cleaning, &config.optimization, true);
    let out = cleaner.clean("We left early due to the fact that it rained.");
    assert!(out.contains("because"), "{out}");
    assert!(!out.contains("due to the fact that"), "{out}");
}

#[test]
fn csv_max_rows_truncates() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "t.csv", b"H1,H2\nR1,R2\nR3,R4");
    let config = PipelineConfig::builder().csv_max_rows(Some(2)).build().unwrap();
    let out = CsvConverter::new(config.formats.csv.clone()).convert(&path).unwrap();
    assert_eq!(out.raw_text, "H1 H2\nR1 R2");
    assert_eq!(out.metadata["truncated"], true);
}

// ── Security ─────────────────────────────────────────────────────────────────

#[cfg(unix)]
#[test]
fn symlink_input_is_rejected() {
    let dir = TempDir::new().unwrap();
    let target = write(dir.path(), "real.txt", b"hello");
    let link = dir.path().join("link.txt");
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let reason = processor().gate().validate_path(&link).unwrap_err();
    assert!(reason.contains("symbolic link"), "{reason}");

    let result = processor().process_file(&link, &dir.path().join("out.md"), None);
    assert!(!result.success);
    assert!(result.error.unwrap().contains("symbolic link"));
}

#[cfg(unix)]
#[test]
fn planted_temp_symlink_next_to_output_is_not_followed() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "in.txt", b"Fresh content line.\n");
    let victim = write(dir.path(), "victim.txt", b"Secret payload line.\n");
    let out_dir = dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();
    std::os::unix::fs::symlink(&victim, out_dir.join("in.md.tmp")).unwrap();

    let output = out_dir.join("in.md");
    let result = processor().process_file(&input, &output, None);
    assert!(result.success, "{:?}", result.error);
    assert_eq!(fs::read_to_string(&victim).unwrap(), "Secret payload line.\n");
    assert!(!fs::symlink_metadata(&output).unwrap().file_type().is_symlink());
    assert!(fs::read_to_string(&output).unwrap().contains("Fresh content line."));
}

// ── Batches ──────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn directory_run_skips_unsupported_files() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "a.txt", b"Alpha file.\n");
    write(input.path(), "b.md", b"# Beta\n\nBeta file.\n");
    write(input.path(), "nested/c.csv", b"x,y\n1,2\n");
    write(input.path(), "nested/deeper/d.html", b"<html><body><p>Delta file.</p></body></html>");
    write(input.path(), "e.bin", &[0u8, 159, 146, 150]);
    write(input.path(), "nested/f.exe", b"MZ");

    let results = DirectoryProcessor::new(processor())
        .process_directory(input.path(), output.path(), None, true)
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.success), "{results:#?}");
    for r in &results {
        let ext = r.input_path.extension().unwrap().to_string_lossy().to_string();
        assert!(["txt", "md", "csv", "html"].contains(&ext.as_str()));
        assert!(r.output_path.as_ref().unwrap().exists());
    }
    assert!(output.path().join("nested/deeper/d.md").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_corrupt_file_does_not_affect_siblings() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "one.txt", b"First document body.\n");
    write(input.path(), "two.md", b"# Second\n\nSecond document body.\n");
    write(input.path(), "three.csv", b"name,qty\nbolt,4\n");
    write(input.path(), "four.html", b"<html><body><h1>Four</h1><p>Fourth body.</p></body></html>");
    write(input.path(), "five.xlsx", b"definitely not a spreadsheet");

    let results = DirectoryProcessor::new(processor())
        .process_directory(input.path(), output.path(), None, true)
        .await
        .unwrap();

    assert_eq!(results.len(), 5);
    let failed: Vec<_> = results.iter().filter(|r| !r.success).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].input_path.ends_with("five.xlsx"));
    assert!(failed[0].error.is_some());
    assert!(failed[0].output_path.is_none());
    assert!(!output.path().join("five.md").exists());
    assert_eq!(results.iter().filter(|r| r.success).count(), 4);
}

#[test]
fn invalid_root_is_fatal() {
    let dir = TempDir::new().unwrap();
    let err = DirectoryProcessor::new(processor())
        .process_directory_sync(&dir.path().join("missing"), dir.path(), None, true)
        .unwrap_err();
    assert!(matches!(err, TextCleanerError::PathValidation { .. }), "{err}");
}

#[test]
fn allow_list_limits_discovery() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write(input.path(), "a.txt", b"Alpha.\n");
    write(input.path(), "b.md", b"Beta.\n");
    let config = PipelineConfig::builder().allowed_extensions(["md"]).build().unwrap();
    let processor = Arc::new(TextProcessor::new(config).unwrap());
    let results = DirectoryProcessor::new(processor)
        .process_directory_sync(input.path(), output.path(), None, true)
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].input_path.ends_with("b.md"));
}

// ── End to end ───────────────────────────────────────────────────────────────

#[test]
fn report_is_cleaned_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = write(
        dir.path(),
        "report.txt",
        b"CONFIDENTIAL\nQuarterly Report\n\nIn order to grow, we hired staff due to the fact that demand rose!!!\n\n1\n",
    );
    let output = dir.path().join("report.md");
    let result = processor().process_file(&input, &output, None);
    assert!(result.success, "{:?}", result.error);

    let written = fs::read_to_string(&output).unwrap();
    assert!(!written.contains("CONFIDENTIAL"), "{written}");
    assert!(written.contains("because demand rose!"), "{written}");
    assert!(!written.contains("!!!"), "{written}");
    assert!(result.metrics["text_length_reduction_percent"].as_f64().unwrap() > 0.0);
}

#[test]
fn csv_rows_survive_the_full_pipeline() {
    let dir = TempDir::new().unwrap();
    let input = write(
        dir.path(),
        "parts.csv",
        b"name,qty\nbolt,4\nbolt,4\nnut,5\nnut,5\nnut,5\nwasher,6",
    );
    let output = dir.path().join("parts.md");
    let result = processor().process_file(&input, &output, None);
    assert!(result.success, "{:?}", result.error);

    let written = fs::read_to_string(&output).unwrap();
    assert!(
        written.contains("name qty\nbolt 4\nbolt 4\nnut 5\nnut 5\nnut 5\nwasher 6"),
        "{written}"
    );
}

#[test]
fn json_output_carries_metadata() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "data.csv", b"city,pop\nOslo,700\n");
    let output = dir.path().join("data.json");
    let result = processor().process_file(&input, &output, None);
    assert!(result.success, "{:?}", result.error);

    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert!(v["content"].as_str().unwrap().contains("Oslo 700"));
    assert_eq!(v["metadata"]["converter"], "csv");
    assert_eq!(v["metadata"]["truncated"], false);
}
