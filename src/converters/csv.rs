//! CSV / TSV converter.
//!
//! Each record becomes one line of space-joined, trimmed cells. `max_rows`
//! counts records including the header; when it cuts the file short the
//! metadata carries `truncated: true`.

use super::{ensure_convertible, file_metadata, ConversionResult, Converter};
use crate::config::CsvFormatConfig;
use crate::error::TextCleanerError;
use csv::{ByteRecord, ReaderBuilder};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct CsvConverter {
    options: CsvFormatConfig,
}

impl CsvConverter {
    pub fn new(options: CsvFormatConfig) -> Self {
        Self { options }
    }
}

impl Converter for CsvConverter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["csv", "tsv"]
    }

    fn convert(&self, path: &Path) -> Result<ConversionResult, TextCleanerError> {
        ensure_convertible(self, path)?;
        info!("Converting CSV file: {}", path.display());

        let delimiter = if crate::security::extension_of(path) == "tsv" {
            b'\t'
        } else {
            self.options.delimiter as u8
        };
        let file = File::open(path).map_err(|e| TextCleanerError::io(path, e))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .quote(self.options.quotechar as u8)
            .from_reader(file);

        let mut lines: Vec<String> = Vec::new();
        let mut original_rows = 0usize;
        let mut max_columns = 0usize;
        let mut header: Option<Vec<String>> = None;
        let mut truncated = false;
        let mut record = ByteRecord::new();

        loop {
            let more = reader
                .read_byte_record(&mut record)
                .map_err(|e| TextCleanerError::conversion(path, format!("invalid CSV: {e}")))?;
            if !more {
                break;
            }
            let index = original_rows;
            original_rows += 1;
            if let Some(limit) = self.options.max_rows {
                if index >= limit {
                    truncated = true;
                    continue;
                }
            }

            let cells: Vec<String> = record
                .iter()
                .enumerate()
                .map(|(i, raw)| {
                    let cell = String::from_utf8_lossy(raw);
                    let cell = if index == 0 && i == 0 {
                        cell.trim_start_matches('\u{feff}').to_string()
                    } else {
                        cell.into_owned()
                    };
                    cell.trim().to_string()
                })
                .collect();
            max_columns = max_columns.max(cells.len());

            if index == 0 && !self.options.include_header {
                header = Some(cells);
                continue;
            }
            lines.push(cells.join(" "));
        }

        if truncated {
            warn!(
                "Reached max_rows limit ({:?}) for {}; output truncated",
                self.options.max_rows,
                path.display()
            );
        }
        debug!(
            "Extracted {} of {} rows from {}",
            lines.len(),
            original_rows,
            path.display()
        );

        let mut metadata = file_metadata(path, "csv");
        metadata.insert("truncated".into(), truncated.into());
        metadata.insert("original_rows".into(), original_rows.into());
        metadata.insert("processed_rows".into(), lines.len().into());
        metadata.insert("columns".into(), max_columns.into());
        metadata.insert(
            "delimiter".into(),
            (delimiter as char).to_string().into(),
        );
        metadata.insert("included_header".into(), header.is_none().into());
        if let Some(h) = header {
            metadata.insert("header".into(), h.into());
        }

        Ok(ConversionResult {
            raw_text: lines.join("\n"),
            metadata,
        })
    }
}
