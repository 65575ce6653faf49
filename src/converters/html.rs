//! HTML and XML converter.
//!
//! HTML is parsed with `scraper` and walked as a DOM tree, emitting
//! markdown-flavoured text: `#` headings, `*` / `1.` list items, GFM tables,
//! fenced `<pre>` blocks and (optionally) `[text](href)` links. Scripts,
//! styles and, when configured, navigation chrome are dropped.
//!
//! XML has no presentational structure, so it is streamed with `quick-xml`
//! and every non-empty text node becomes one line.

use super::text::decode_text;
use super::{ensure_convertible, file_metadata, gfm_table, ConversionResult, Converter, Metadata};
use crate::config::HtmlFormatConfig;
use crate::error::TextCleanerError;
use crate::security::extension_of;
use crate::stream;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use scraper::{ElementRef, Html, Node, Selector};
use std::path::Path;
use tracing::{debug, info};

static SEL_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static SEL_META: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").unwrap());
static SEL_BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static SEL_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static SEL_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").unwrap());

/// Elements whose content never reaches the output.
const SKIPPED: &[&str] = &[
    "head", "script", "style", "noscript", "template", "svg", "iframe", "object",
];
/// Page chrome dropped when `remove_navigation` is set.
const NAVIGATION: &[&str] = &["nav", "header", "footer", "aside", "menu"];
/// Elements that start a new paragraph.
const BLOCKS: &[&str] = &[
    "p", "div", "section", "article", "main", "blockquote", "figure", "figcaption",
    "address", "dl", "dt", "dd", "form", "fieldset", "details", "summary", "body", "html",
];
const META_NAMES: &[&str] = &["description", "keywords", "author", "date", "generator"];

#[derive(Debug, Clone, Default)]
pub struct HtmlConverter {
    options: HtmlFormatConfig,
    preserve_links: bool,
}

impl HtmlConverter {
    /// `preserve_links` is ANDed with the format-level option, so either
    /// setting can turn links off.
    pub fn new(options: HtmlFormatConfig, preserve_links: bool) -> Self {
        Self {
            preserve_links: preserve_links && options.preserve_links,
            options,
        }
    }

    fn convert_html(&self, source: &str, metadata: &mut Metadata) -> String {
        let document = Html::parse_document(source);

        if let Some(title) = document.select(&SEL_TITLE).next() {
            let title = collapse(&title.text().collect::<String>());
            if !title.is_empty() {
                metadata.insert("title".into(), title.into());
            }
        }
        for meta in document.select(&SEL_META) {
            let el = meta.value();
            if let (Some(name), Some(content)) = (el.attr("name"), el.attr("content")) {
                let name = name.to_ascii_lowercase();
                if META_NAMES.contains(&name.as_str()) {
                    metadata.insert(name, content.trim().to_string().into());
                }
            }
        }

        let mut renderer = Renderer {
            converter: self,
            blocks: Vec::new(),
            inline: String::new(),
            links: 0,
        };
        match document.select(&SEL_BODY).next() {
            Some(body) => renderer.walk(body),
            None => renderer.walk(document.root_element()),
        }
        renderer.flush();
        metadata.insert("link_count".into(), renderer.links.into());
        renderer.blocks.join("\n\n")
    }

    fn skips(&self, tag: &str) -> bool {
        SKIPPED.contains(&tag) || (self.options.remove_navigation && NAVIGATION.contains(&tag))
    }
}

impl Converter for HtmlConverter {
    fn name(&self) -> &'static str {
        "html"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["html", "htm", "xhtml", "xml"]
    }

    fn convert(&self, path: &Path) -> Result<ConversionResult, TextCleanerError> {
        ensure_convertible(self, path)?;
        let (source, _encoding) = decode_text(&stream::read_bytes(path)?);

        let ext = extension_of(path);
        let is_xml = ext == "xml";
        info!(
            "Converting {} file: {}",
            if is_xml { "XML" } else { "HTML" },
            path.display()
        );

        let mut metadata = file_metadata(path, if is_xml { "xml" } else { "html" });
        let raw_text = if is_xml {
            xml_text(&source, &mut metadata)
                .map_err(|e| TextCleanerError::conversion(path, format!("invalid XML: {e}")))?
        } else {
            self.convert_html(&source, &mut metadata)
        };
        debug!("Extracted {} chars from {}", raw_text.len(), path.display());

        Ok(ConversionResult { raw_text, metadata })
    }
}

/// Accumulates output blocks while walking the DOM.
struct Renderer<'a> {
    converter: &'a HtmlConverter,
    blocks: Vec<String>,
    inline: String,
    links: usize,
}

impl Renderer<'_> {
    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.inline.push_str(text),
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        self.element(el);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, el: ElementRef<'_>) {
        let tag = el.value().name();
        if self.converter.skips(tag) {
            return;
        }
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                let level = tag[1..].parse::<usize>().unwrap_or(1);
                let text = self.inline_text(el);
                if !text.is_empty() {
                    self.blocks.push(format!("{} {}", "#".repeat(level), text));
                }
            }
            "ul" | "ol" => {
                self.flush();
                let ordered = tag == "ol";
                let mut items = Vec::new();
                for li in el.children().filter_map(ElementRef::wrap) {
                    if li.value().name() != "li" {
                        continue;
                    }
                    let text = self.inline_text(li);
                    if text.is_empty() {
                        continue;
                    }
                    let marker = if ordered {
                        format!("{}.", items.len() + 1)
                    } else {
                        "*".to_string()
                    };
                    items.push(format!("{marker} {text}"));
                }
                if !items.is_empty() {
                    self.blocks.push(items.join("\n"));
                }
            }
            "table" => {
                self.flush();
                if let Some(table) = self.table(el) {
                    self.blocks.push(table);
                }
            }
            "pre" => {
                self.flush();
                let code = el.text().collect::<String>();
                let code = code.trim_matches('\n');
                if !code.trim().is_empty() {
                    self.blocks.push(format!("```\n{code}\n```"));
                }
            }
            "br" => self.inline.push('\n'),
            "hr" => {
                self.flush();
                self.blocks.push("---".to_string());
            }
            "a" => {
                let text = self.inline_text(el);
                self.inline.push(' ');
                self.inline.push_str(&text);
                self.inline.push(' ');
            }
            _ if BLOCKS.contains(&tag) || tag == "li" => {
                self.flush();
                self.walk(el);
                self.flush();
            }
            _ => self.walk(el),
        }
    }

    /// Text of `el` on one line, with links rendered when enabled.
    fn inline_text(&mut self, el: ElementRef<'_>) -> String {
        let mut out = String::new();
        self.collect_inline(el, &mut out);
        collapse(&out)
    }

    fn collect_inline(&mut self, el: ElementRef<'_>, out: &mut String) {
        let tag = el.value().name();
        if tag == "a" {
            let text = collapse(&el.text().collect::<String>());
            match el.value().attr("href") {
                Some(href) if self.converter.preserve_links && !text.is_empty() => {
                    self.links += 1;
                    out.push_str(&format!(" [{}]({}) ", text, href.trim()));
                }
                _ => {
                    out.push(' ');
                    out.push_str(&text);
                    out.push(' ');
                }
            }
            return;
        }
        for child in el.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(_) => {
                    if let Some(inner) = ElementRef::wrap(child) {
                        let name = inner.value().name();
                        if self.converter.skips(name) {
                            continue;
                        }
                        if name == "br" {
                            out.push(' ');
                        } else {
                            self.collect_inline(inner, out);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn table(&mut self, el: ElementRef<'_>) -> Option<String> {
        let mut rows: Vec<Vec<String>> = Vec::new();
        for tr in el.select(&SEL_ROW) {
            let cells: Vec<String> = tr.select(&SEL_CELL).map(|c| self.inline_text(c)).collect();
            if !cells.is_empty() {
                rows.push(cells);
            }
        }
        gfm_table(rows)
    }

    fn flush(&mut self) {
        let text: Vec<String> = self
            .inline
            .split('\n')
            .map(collapse)
            .filter(|l| !l.is_empty())
            .collect();
        if !text.is_empty() {
            self.blocks.push(text.join("\n"));
        }
        self.inline.clear();
    }
}

/// Collapse every whitespace run to a single space and trim.
fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One line per non-empty XML text or CDATA node.
fn xml_text(source: &str, metadata: &mut Metadata) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(source);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut lines = Vec::new();
    let mut root: Option<String> = None;
    let mut elements = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => {
                elements += 1;
                if root.is_none() {
                    root = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
            }
            Event::Text(e) => {
                let text = collapse(&e.unescape()?);
                if !text.is_empty() {
                    lines.push(text);
                }
            }
            Event::CData(e) => {
                let text = collapse(&String::from_utf8_lossy(&e.into_inner()));
                if !text.is_empty() {
                    lines.push(text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(root) = root {
        metadata.insert("root_element".into(), root.into());
    }
    metadata.insert("element_count".into(), elements.into());
    Ok(lines.join("\n"))
}
