//! PDF converter backed by pdfium.
//!
//! Text comes from pdfium's text layer, page by page. A page whose text layer
//! holds fewer than `min_chars_per_page` characters is treated as scanned:
//! when OCR is enabled it is rendered to PNG at `ocr.dpi` and passed to the
//! external OCR command (tesseract by default), and the result metadata
//! carries `ocr_applied: true` so the OCR clean-up stage runs on it.
//!
//! ## Library binding
//!
//! `PDFIUM_LIB_PATH` may point at the pdfium shared library itself. Without
//! it the library is looked up next to the executable's working directory,
//! then in the system library path.
//!
//! The library is bound once per converter, on the first PDF, and shared by
//! clones. Documents are opened per call, so call [`PdfConverter::convert`]
//! from blocking worker threads.

use super::{ensure_convertible, file_metadata, ConversionResult, Converter};
use crate::config::{OcrConfig, PdfFormatConfig};
use crate::error::TextCleanerError;
use crate::security::SecurityGate;
use once_cell::sync::OnceCell;
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::process::Command;
use tracing::{debug, info, warn};

/// PDF user space is 72 points per inch.
const POINTS_PER_INCH: f32 = 72.0;
/// Upper bound on the rendered width, whatever the DPI and page size.
const MAX_RENDER_WIDTH: i32 = 10_000;

#[derive(Debug, Clone, Default)]
pub struct PdfConverter {
    options: PdfFormatConfig,
    ocr: OcrConfig,
    gate: SecurityGate,
    pdfium: Arc<OnceCell<Pdfium>>,
}

impl PdfConverter {
    pub fn new(options: PdfFormatConfig, ocr: OcrConfig) -> Self {
        Self {
            options,
            ocr,
            gate: SecurityGate::default(),
            pdfium: Arc::default(),
        }
    }

    /// The bound library, binding it on first use. A failed bind is not
    /// cached, so a library installed later is picked up.
    fn pdfium(&self) -> Result<&Pdfium, String> {
        self.pdfium.get_or_try_init(bind_pdfium)
    }

    /// Render `page` to a temporary PNG and OCR it.
    fn ocr_page(&self, page: &PdfPage<'_>, page_number: usize) -> Result<String, String> {
        let width_px = ((page.width().value / POINTS_PER_INCH) * self.ocr.dpi as f32).round() as i32;
        let render_config = PdfRenderConfig::new().set_target_width(width_px.clamp(1, MAX_RENDER_WIDTH));
        let image = page
            .render_with_config(&render_config)
            .map_err(|e| format!("render failed: {e:?}"))?
            .as_image();

        let png = self
            .gate
            .create_secure_temp_file(&format!("page{page_number}_"), Some(".png"))?;
        let result = image
            .save_with_format(&png, image::ImageFormat::Png)
            .map_err(|e| format!("cannot write page image: {e}"))
            .and_then(|_| run_ocr(&self.ocr, &png));
        if let Err(e) = self.gate.secure_delete_file(&png) {
            warn!("Could not remove temporary page image {}: {}", png.display(), e);
        }
        debug!(
            "OCR page {} at {}x{} px",
            page_number,
            image.width(),
            image.height()
        );
        result
    }
}

impl Converter for PdfConverter {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn convert(&self, path: &Path) -> Result<ConversionResult, TextCleanerError> {
        ensure_convertible(self, path)?;
        info!("Converting PDF: {}", path.display());

        let pdfium = self.pdfium().map_err(|e| TextCleanerError::conversion(path, e))?;
        let document = pdfium
            .load_pdf_from_file(path, self.options.password.as_deref())
            .map_err(|e| {
                let detail = format!("{e:?}");
                if detail.to_lowercase().contains("password") {
                    TextCleanerError::conversion(path, "document is encrypted; set formats.pdf.password")
                } else {
                    TextCleanerError::conversion(path, format!("cannot open PDF: {detail}"))
                }
            })?;

        let pages = document.pages();
        let page_count = pages.len() as usize;
        info!("PDF loaded: {} pages", page_count);

        let mut texts = Vec::with_capacity(page_count);
        let mut ocr_pages = Vec::new();
        for (idx, page) in pages.iter().enumerate() {
            let text = page
                .text()
                .map(|t| t.all())
                .map_err(|e| TextCleanerError::conversion(path, format!("page {}: {e:?}", idx + 1)))?;

            let sparse = text.trim().chars().count() < self.options.min_chars_per_page;
            if sparse && self.ocr.enabled {
                match self.ocr_page(&page, idx + 1) {
                    Ok(ocr_text) => {
                        ocr_pages.push(idx + 1);
                        texts.push(ocr_text);
                        continue;
                    }
                    Err(e) => warn!("OCR failed for page {} of {}: {}", idx + 1, path.display(), e),
                }
            }
            texts.push(text);
        }

        let mut metadata = file_metadata(path, "pdf");
        metadata.insert("page_count".into(), page_count.into());
        let info = document.metadata();
        for (tag, key) in [
            (PdfDocumentMetadataTagType::Title, "title"),
            (PdfDocumentMetadataTagType::Author, "author"),
            (PdfDocumentMetadataTagType::Subject, "subject"),
            (PdfDocumentMetadataTagType::Creator, "creator"),
            (PdfDocumentMetadataTagType::CreationDate, "created"),
        ] {
            if let Some(value) = info.get(tag).map(|t| t.value().trim().to_string()) {
                if !value.is_empty() {
                    metadata.insert(key.into(), value.into());
                }
            }
        }
        metadata.insert("ocr_applied".into(), (!ocr_pages.is_empty()).into());
        if !ocr_pages.is_empty() {
            metadata.insert("ocr_pages".into(), ocr_pages.into());
        }

        Ok(ConversionResult {
            raw_text: texts
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
            metadata,
        })
    }
}

fn bind_pdfium() -> Result<Pdfium, String> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(lib) => Pdfium::bind_to_library(&lib)
            .map_err(|e| format!("cannot load pdfium from PDFIUM_LIB_PATH={lib}: {e:?}"))?,
        Err(_) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| format!("pdfium library not found (set PDFIUM_LIB_PATH): {e:?}"))?,
    };
    Ok(Pdfium::new(bindings))
}

/// Run the configured OCR command on `image`, returning its stdout.
fn run_ocr(ocr: &OcrConfig, image: &Path) -> Result<String, String> {
    let output = Command::new(&ocr.command)
        .arg(image)
        .arg("stdout")
        .args(["-l", &ocr.language])
        .output()
        .map_err(|e| format!("cannot run '{}': {e}", ocr.command))?;
    if !output.status.success() {
        return Err(format!(
            "'{}' exited with {}: {}",
            ocr.command,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn clones_share_one_library_binding() {
        let converter = PdfConverter::default();
        let clone = converter.clone();
        assert!(Arc::ptr_eq(&converter.pdfium, &clone.pdfium));
        if converter.pdfium().is_ok() {
            assert!(std::ptr::eq(converter.pdfium().unwrap(), clone.pdfium().unwrap()));
        }
    }

    #[test]
    fn garbage_pdf_is_conversion_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.7 but not really").unwrap();
        let err = PdfConverter::default().convert(&path).unwrap_err();
        assert!(matches!(err, TextCleanerError::Conversion { .. }), "{err}");
    }

    #[test]
    fn missing_ocr_command_is_reported() {
        let ocr = OcrConfig {
            command: "definitely-not-an-ocr-binary".into(),
            ..OcrConfig::default()
        };
        let err = run_ocr(&ocr, Path::new("page.png")).unwrap_err();
        assert!(err.contains("definitely-not-an-ocr-binary"));
    }
}
