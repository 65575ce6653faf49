//! Office document converter.
//!
//! OOXML (`.docx`, `.pptx`) and OpenDocument (`.odt`, `.odp`) files are zip
//! archives of XML parts; their text is pulled out with `zip` + `quick-xml`.
//! Spreadsheets (`.xlsx`, `.xls`, `.ods`) go through `calamine` and come out
//! as one GFM table per sheet.
//!
//! Legacy binary `.doc` / `.ppt` are not supported.

use super::{ensure_convertible, file_metadata, gfm_table, ConversionResult, Converter, Metadata};
use crate::config::OfficeFormatConfig;
use crate::error::TextCleanerError;
use crate::security::extension_of;
use calamine::{open_workbook_auto, Data, Reader as _};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde_json::json;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::ZipArchive;

static RE_SLIDE_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// Core-property element (local name) → metadata key.
const CORE_PROPERTIES: &[(&[u8], &str)] = &[
    (b"title", "title"),
    (b"subject", "subject"),
    (b"creator", "author"),
    (b"initial-creator", "author"),
    (b"lastModifiedBy", "last_modified_by"),
    (b"keywords", "keywords"),
    (b"created", "created"),
    (b"creation-date", "created"),
    (b"modified", "modified"),
];

#[derive(Debug, Clone, Default)]
pub struct OfficeConverter {
    options: OfficeFormatConfig,
}

impl OfficeConverter {
    pub fn new(options: OfficeFormatConfig) -> Self {
        Self { options }
    }

    fn convert_spreadsheet(&self, path: &Path) -> Result<ConversionResult, TextCleanerError> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| TextCleanerError::conversion(path, format!("cannot open workbook: {e}")))?;
        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

        let mut blocks = Vec::new();
        let mut sheets = Metadata::new();
        for name in &sheet_names {
            let range = match workbook.worksheet_range(name) {
                Ok(range) => range,
                Err(e) => {
                    warn!("Skipping unreadable sheet '{}' in {}: {}", name, path.display(), e);
                    continue;
                }
            };
            let rows: Vec<Vec<String>> = range
                .rows()
                .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
                .filter(|row| row.iter().any(|c| !c.is_empty()))
                .collect();
            let (height, width) = range.get_size();
            sheets.insert(
                name.clone(),
                json!({ "row_count": height, "column_count": width }),
            );

            if self.options.include_sheet_names {
                blocks.push(format!("## Sheet: {name}"));
            }
            if let Some(table) = gfm_table(rows) {
                blocks.push(table);
            }
        }

        let mut metadata = file_metadata(path, "spreadsheet");
        metadata.insert("sheet_count".into(), sheet_names.len().into());
        metadata.insert("sheets".into(), sheets.into());
        Ok(ConversionResult {
            raw_text: blocks.join("\n\n"),
            metadata,
        })
    }

    fn convert_archive(&self, path: &Path, ext: &str) -> Result<ConversionResult, TextCleanerError> {
        let file = File::open(path).map_err(|e| TextCleanerError::io(path, e))?;
        let mut archive = ZipArchive::new(file)
            .map_err(|e| TextCleanerError::conversion(path, format!("not a valid archive: {e}")))?;
        let bad_xml = |e: quick_xml::Error| TextCleanerError::conversion(path, format!("malformed XML: {e}"));

        let (document, props_part, format) = match ext {
            "docx" => {
                let xml = require_part(&mut archive, "word/document.xml", path)?;
                (docx_text(&xml).map_err(bad_xml)?, "docProps/core.xml", "word")
            }
            "pptx" => (pptx_text(&mut archive, path)?, "docProps/core.xml", "presentation"),
            _ => {
                let xml = require_part(&mut archive, "content.xml", path)?;
                let format = if ext == "odp" { "presentation" } else { "word" };
                (odf_text(&xml).map_err(bad_xml)?, "meta.xml", format)
            }
        };

        let mut metadata = file_metadata(path, format);
        if let Ok(Some(xml)) = read_part(&mut archive, props_part) {
            match core_properties(&xml) {
                Ok(props) => metadata.extend(props),
                Err(e) => warn!("Ignoring unreadable document properties in {}: {}", path.display(), e),
            }
        }
        for (key, value) in document.counts {
            metadata.insert(key.into(), value.into());
        }
        Ok(ConversionResult {
            raw_text: document.text,
            metadata,
        })
    }
}

impl Converter for OfficeConverter {
    fn name(&self) -> &'static str {
        "office"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["docx", "odt", "pptx", "odp", "xlsx", "xls", "ods"]
    }

    fn convert(&self, path: &Path) -> Result<ConversionResult, TextCleanerError> {
        ensure_convertible(self, path)?;
        let ext = extension_of(path);
        info!("Converting office document: {}", path.display());

        let result = match ext.as_str() {
            "xlsx" | "xls" | "ods" => self.convert_spreadsheet(path)?,
            _ => self.convert_archive(path, &ext)?,
        };
        debug!("Extracted {} chars from {}", result.raw_text.len(), path.display());
        Ok(result)
    }
}

/// Extracted body text plus element counts for metadata.
struct DocumentText {
    text: String,
    counts: Vec<(&'static str, usize)>,
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, std::io::Error> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(_) => return Ok(None),
    };
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(Some(content))
}

fn require_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    path: &Path,
) -> Result<String, TextCleanerError> {
    match read_part(archive, name) {
        Ok(Some(xml)) => Ok(xml),
        Ok(None) => Err(TextCleanerError::conversion(path, format!("missing part {name}"))),
        Err(e) => Err(TextCleanerError::conversion(path, format!("cannot read {name}: {e}"))),
    }
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// `Heading2` / `heading 2` → 2, `Title` → 1.
fn heading_level(style: &str) -> Option<usize> {
    let style = style.to_ascii_lowercase().replace(' ', "");
    if style == "title" {
        return Some(1);
    }
    let level: usize = style.strip_prefix("heading")?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

/// Paragraph-level blocks; consecutive list items share a single newline.
#[derive(Default)]
struct Blocks {
    out: String,
    last_was_list: bool,
}

impl Blocks {
    fn push(&mut self, text: &str, is_list: bool) {
        if !self.out.is_empty() {
            self.out.push_str(if is_list && self.last_was_list { "\n" } else { "\n\n" });
        }
        self.out.push_str(text);
        self.last_was_list = is_list;
    }
}

/// Table under construction while walking WordprocessingML.
#[derive(Default)]
struct TableState {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: Vec<String>,
}

fn docx_text(xml: &str) -> Result<DocumentText, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut blocks = Blocks::default();
    let mut tables: Vec<TableState> = Vec::new();
    let mut para = String::new();
    let mut style: Option<String> = None;
    let mut is_list = false;
    let mut in_text = false;
    let mut paragraphs = 0usize;
    let mut table_count = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => {
                    para.clear();
                    style = None;
                    is_list = false;
                }
                b"t" => in_text = true,
                b"numPr" => is_list = true,
                b"tbl" => {
                    tables.push(TableState::default());
                    table_count += 1;
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"pStyle" => style = attribute(&e, b"val"),
                b"numPr" => is_list = true,
                b"tab" => para.push('\t'),
                b"br" | b"cr" => para.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_text => para.push_str(&e.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = para.trim();
                    if text.is_empty() {
                        continue;
                    }
                    paragraphs += 1;
                    if let Some(table) = tables.last_mut() {
                        table.cell.push(text.to_string());
                        continue;
                    }
                    let level = style.as_deref().and_then(heading_level);
                    let list_style = style
                        .as_deref()
                        .map(|s| s.to_ascii_lowercase().starts_with("list"))
                        .unwrap_or(false);
                    match level {
                        Some(n) => blocks.push(&format!("{} {}", "#".repeat(n), text), false),
                        None if is_list || list_style => blocks.push(&format!("* {text}"), true),
                        None => blocks.push(text, false),
                    }
                }
                b"tc" => {
                    if let Some(table) = tables.last_mut() {
                        let cell = std::mem::take(&mut table.cell).join(" ");
                        table.row.push(cell);
                    }
                }
                b"tr" => {
                    if let Some(table) = tables.last_mut() {
                        let row = std::mem::take(&mut table.row);
                        table.rows.push(row);
                    }
                }
                b"tbl" => {
                    if let Some(table) = tables.pop() {
                        if let Some(rendered) = gfm_table(table.rows) {
                            match tables.last_mut() {
                                Some(outer) => outer.cell.push(rendered.replace('\n', " ")),
                                None => blocks.push(&rendered, false),
                            }
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(DocumentText {
        text: blocks.out,
        counts: vec![("paragraph_count", paragraphs), ("table_count", table_count)],
    })
}

/// One slide's text shapes; `title` holds the title placeholder if any.
#[derive(Default)]
struct Slide {
    title: Option<String>,
    body: Vec<String>,
}

fn pptx_text<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &Path,
) -> Result<DocumentText, TextCleanerError> {
    let mut parts: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| {
            let caps = RE_SLIDE_PART.captures(name)?;
            Some((caps[1].parse().ok()?, name.to_string()))
        })
        .collect();
    parts.sort_unstable();

    let mut blocks = Blocks::default();
    for (number, part) in &parts {
        let xml = require_part(archive, part, path)?;
        let slide = parse_slide(&xml)
            .map_err(|e| TextCleanerError::conversion(path, format!("malformed {part}: {e}")))?;
        let heading = match &slide.title {
            Some(title) => format!("## Slide {number}: {title}"),
            None => format!("## Slide {number}"),
        };
        blocks.push(&heading, false);
        let bullet = slide.body.len() > 1;
        for line in &slide.body {
            if bullet {
                blocks.push(&format!("* {line}"), true);
            } else {
                blocks.push(line, false);
            }
        }
    }

    Ok(DocumentText {
        text: blocks.out,
        counts: vec![("slide_count", parts.len())],
    })
}

fn parse_slide(xml: &str) -> Result<Slide, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut slide = Slide::default();
    let mut shape_is_title = false;
    let mut shape_text: Vec<String> = Vec::new();
    let mut para = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sp" => {
                    shape_is_title = false;
                    shape_text.clear();
                }
                b"p" => para.clear(),
                b"t" => in_text = true,
                b"ph" => shape_is_title |= is_title_placeholder(&e),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"ph" => {
                shape_is_title |= is_title_placeholder(&e);
            }
            Event::Text(e) if in_text => para.push_str(&e.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = para.trim();
                    if !text.is_empty() {
                        shape_text.push(text.to_string());
                    }
                }
                b"sp" => {
                    if shape_is_title && slide.title.is_none() && !shape_text.is_empty() {
                        slide.title = Some(shape_text.join(" "));
                    } else {
                        slide.body.append(&mut shape_text);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(slide)
}

fn is_title_placeholder(e: &BytesStart<'_>) -> bool {
    matches!(attribute(e, b"type").as_deref(), Some("title" | "ctrTitle"))
}

/// OpenDocument `content.xml`: `text:h` headings, `text:p` paragraphs,
/// list items and `draw:page` slides.
fn odf_text(xml: &str) -> Result<DocumentText, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut blocks = Blocks::default();
    let mut para = String::new();
    let mut depth = 0usize;
    let mut heading: Option<usize> = None;
    let mut list_depth = 0usize;
    let mut paragraphs = 0usize;
    let mut pages = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" | b"h" => {
                    if depth == 0 {
                        para.clear();
                        heading = (e.local_name().as_ref() == b"h").then(|| {
                            attribute(&e, b"outline-level")
                                .and_then(|l| l.parse().ok())
                                .unwrap_or(1usize)
                                .clamp(1, 6)
                        });
                    }
                    depth += 1;
                }
                b"list-item" => list_depth += 1,
                b"page" => {
                    pages += 1;
                    let name = attribute(&e, b"name").unwrap_or_else(|| format!("Slide {pages}"));
                    blocks.push(&format!("## {name}"), false);
                }
                _ => {}
            },
            Event::Empty(e) if depth > 0 => match e.local_name().as_ref() {
                b"tab" => para.push('\t'),
                b"line-break" => para.push('\n'),
                b"s" => {
                    let n = attribute(&e, b"c").and_then(|c| c.parse().ok()).unwrap_or(1usize);
                    para.push_str(&" ".repeat(n));
                }
                _ => {}
            },
            Event::Text(e) if depth > 0 => para.push_str(&e.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"p" | b"h" => {
                    depth = depth.saturating_sub(1);
                    if depth > 0 {
                        continue;
                    }
                    let text = para.trim();
                    if text.is_empty() {
                        continue;
                    }
                    paragraphs += 1;
                    match heading {
                        Some(n) => blocks.push(&format!("{} {}", "#".repeat(n), text), false),
                        None if list_depth > 0 => blocks.push(&format!("* {text}"), true),
                        None => blocks.push(text, false),
                    }
                }
                b"list-item" => list_depth = list_depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let mut counts = vec![("paragraph_count", paragraphs)];
    if pages > 0 {
        counts.push(("slide_count", pages));
    }
    Ok(DocumentText {
        text: blocks.out,
        counts,
    })
}

/// Dublin Core / ODF meta properties as metadata.
fn core_properties(xml: &str) -> Result<Metadata, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut current: Option<&'static str> = None;
    let mut props = Metadata::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                current = CORE_PROPERTIES
                    .iter()
                    .find(|(tag, _)| *tag == e.local_name().as_ref())
                    .map(|(_, key)| *key);
            }
            Event::Text(e) => {
                if let Some(key) = current {
                    let value = e.unescape()?.trim().to_string();
                    if !value.is_empty() && !props.contains_key(key) {
                        props.insert(key.into(), value.into());
                    }
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(props)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().replace('\n', " "),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR:{e:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, parts: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, body) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    const DOCX_BODY: &str = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Overview</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:t>world &amp; all</w:t></w:r></w:p>
<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/></w:numPr></w:pPr><w:r><w:t>first</w:t></w:r></w:p>
<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/></w:numPr></w:pPr><w:r><w:t>second</w:t></w:r></w:p>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>B</w:t></w:r></w:p></w:tc></w:tr>
<w:tr><w:tc><w:p><w:r><w:t>1</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>2</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
</w:body></w:document>"#;

    const CORE: &str = r#"<?xml version="1.0"?>
<cp:coreProperties xmlns:cp="x" xmlns:dc="http://purl.org/dc/elements/1.1/">
<dc:title>Quarterly Report</dc:title><dc:creator>Ann</dc:creator></cp:coreProperties>"#;

    #[test]
    fn docx_headings_lists_and_tables() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.docx");
        write_zip(&path, &[("word/document.xml", DOCX_BODY), ("docProps/core.xml", CORE)]);

        let out = OfficeConverter::default().convert(&path).unwrap();
        assert_eq!(
            out.raw_text,
            "# Overview\n\nHello world & all\n\n* first\n* second\n\n| A | B |\n| --- | --- |\n| 1 | 2 |"
        );
        assert_eq!(out.metadata["title"], "Quarterly Report");
        assert_eq!(out.metadata["author"], "Ann");
        assert_eq!(out.metadata["table_count"], 1);
    }

    #[test]
    fn pptx_slides_in_numeric_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deck.pptx");
        let slide = |title: &str, body: &[&str]| {
            let mut xml = format!(
                r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree><p:sp><p:nvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:txBody><a:p><a:r><a:t>{title}</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:txBody>"#
            );
            for line in body {
                xml.push_str(&format!("<a:p><a:r><a:t>{line}</a:t></a:r></a:p>"));
            }
            xml.push_str("</p:txBody></p:sp></p:spTree></p:cSld></p:sld>");
            xml
        };
        let s1 = slide("Intro", &["only line"]);
        let s10 = slide("Wrap up", &["a", "b"]);
        let s2 = slide("Middle", &[]);
        write_zip(
            &path,
            &[
                ("ppt/slides/slide10.xml", s10.as_str()),
                ("ppt/slides/slide1.xml", s1.as_str()),
                ("ppt/slides/slide2.xml", s2.as_str()),
            ],
        );

        let out = OfficeConverter::default().convert(&path).unwrap();
        assert_eq!(
            out.raw_text,
            "## Slide 1: Intro\n\nonly line\n\n## Slide 2: Middle\n\n## Slide 10: Wrap up\n\n* a\n* b"
        );
        assert_eq!(out.metadata["slide_count"], 3);
    }

    #[test]
    fn odt_paragraphs_and_headings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.odt");
        let content = r#"<office:document-content xmlns:office="o" xmlns:text="t"><office:body><office:text>
<text:h text:outline-level="2">Plan</text:h>
<text:p>Step<text:s text:c="2"/>one <text:span>done</text:span></text:p>
<text:list><text:list-item><text:p>milk</text:p></text:list-item></text:list>
</office:text></office:body></office:document-content>"#;
        write_zip(&path, &[("content.xml", content)]);

        let out = OfficeConverter::default().convert(&path).unwrap();
        assert_eq!(out.raw_text, "## Plan\n\nStep  one done\n\n* milk");
    }

    #[test]
    fn garbage_is_conversion_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"this is not a zip").unwrap();
        assert!(matches!(
            OfficeConverter::default().convert(&path),
            Err(TextCleanerError::Conversion { .. })
        ));

        let empty = dir.path().join("empty.docx");
        write_zip(&empty, &[("other.xml", "<x/>")]);
        let err = OfficeConverter::default().convert(&empty).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"));
    }

    #[test]
    fn heading_styles() {
        assert_eq!(heading_level("Heading2"), Some(2));
        assert_eq!(heading_level("heading 3"), Some(3));
        assert_eq!(heading_level("Title"), Some(1));
        assert_eq!(heading_level("Normal"), None);
        assert_eq!(heading_level("Heading9"), None);
    }

    #[test]
    fn cells_format_compactly() {
        assert_eq!(cell_to_string(&Data::Float(10.0)), "10");
        assert_eq!(cell_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&Data::Bool(true)), "TRUE");
        assert_eq!(cell_to_string(&Data::String(" a\nb ".into())), "a b");
    }
}
