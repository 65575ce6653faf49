//! Plain-text converter (`.txt`, `.text`, `.log`).

use super::{ensure_convertible, file_metadata, ConversionResult, Converter};
use crate::error::TextCleanerError;
use crate::stream;
use encoding_rs::{Encoding, WINDOWS_1252};
use std::path::Path;
use tracing::{debug, info};

/// Reads text files, decoding UTF-8 first and falling back to the BOM's
/// encoding or Windows-1252 so legacy files still convert.
#[derive(Debug, Default, Clone)]
pub struct TextConverter;

impl TextConverter {
    pub fn new() -> Self {
        Self
    }
}

impl Converter for TextConverter {
    fn name(&self) -> &'static str {
        "text"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["txt", "text", "log"]
    }

    fn convert(&self, path: &Path) -> Result<ConversionResult, TextCleanerError> {
        ensure_convertible(self, path)?;
        info!("Converting text file: {}", path.display());

        let bytes = stream::read_bytes(path)?;
        let (text, encoding) = decode_text(&bytes);
        debug!("Decoded {} bytes as {}", bytes.len(), encoding);

        let mut result = ConversionResult {
            metadata: file_metadata(path, "text"),
            raw_text: String::new(),
        };
        result
            .metadata
            .insert("encoding".into(), encoding.to_string().into());
        result
            .metadata
            .insert("line_count".into(), text.lines().count().into());
        result.raw_text = text;
        Ok(result)
    }
}

/// Decode bytes into text, returning the encoding name used.
///
/// A UTF-8 BOM is stripped. Non-UTF-8 input without a BOM is read as
/// Windows-1252, which maps every byte and so never fails.
pub(crate) fn decode_text(bytes: &[u8]) -> (String, &'static str) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (text.into_owned(), encoding.name());
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), "UTF-8"),
        Err(_) => {
            let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
            (text.into_owned(), WINDOWS_1252.name())
        }
    }
}
