//! Structure normalisation of headings, lists, tables and links.
//!
//! Each `preserve_*` flag independently switches one normalisation off.
//! With every flag set the stage returns its input unchanged.
//!
//! | flag off            | effect                                             |
//! |---------------------|----------------------------------------------------|
//! | `preserve_tables`   | GFM rows flattened to space-joined cells           |
//! | `preserve_links`    | `[text](url)` reduced to `text`                    |
//! | `preserve_lists`    | bullets (`•`, `–`, `+`, …) become `* `, `1)` → `1.`|
//! | `preserve_headings` | ATX headings tidied, standalone short lines promoted|
//!
//! They run in table, link, list, heading order, so list standardisation
//! feeds heading detection when both are requested.

use super::markup::{fence_mask, is_structural, map_lines, Scope};
use super::Stage;
use crate::config::StructureConfig;
use crate::converters::Metadata;
use crate::error::StageError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Lines at least this long are never promoted to headings.
const MAX_HEADING_LEN: usize = 60;
/// Promoted lines shorter than this become `##`, longer ones `###`.
const MAJOR_HEADING_LEN: usize = 25;

static RE_TABLE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\|?\s*:?-{3,}:?\s*(?:\|\s*:?-{3,}:?\s*)*\|?\s*$").unwrap());
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"!?\[([^\]]*)\]\([^)\s]*\)").unwrap());
static RE_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)(?:[•·◦▪▫●○■□►▸▹➢➣➤→⇒]|[-–—+])\s+(\S)").unwrap());
static RE_PAREN_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)(\d{1,3})\)\s+").unwrap());
static RE_ATX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").unwrap());

#[derive(Debug, Clone)]
pub struct StructureProcessor {
    config: StructureConfig,
}

impl StructureProcessor {
    pub fn new(config: &StructureConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Whether every flag is set, making the stage an identity transform.
    pub fn is_identity(&self) -> bool {
        let c = &self.config;
        c.preserve_headings && c.preserve_lists && c.preserve_tables && c.preserve_links
    }

    pub fn normalise(&self, text: &str) -> String {
        if text.is_empty() || self.is_identity() {
            return text.to_string();
        }
        let mut s = text.to_string();
        if !self.config.preserve_tables {
            s = flatten_tables(&s);
        }
        if !self.config.preserve_links {
            s = map_lines(&s, Scope::Unfenced, |l| Some(RE_LINK.replace_all(l, "$1").into_owned()));
        }
        if !self.config.preserve_lists {
            s = standardise_lists(&s);
        }
        if !self.config.preserve_headings {
            s = normalise_headings(&s);
        }
        s
    }
}

impl Stage for StructureProcessor {
    fn name(&self) -> &'static str {
        "structure_processor"
    }

    fn process(&self, text: &str, _metadata: &Metadata) -> Result<String, StageError> {
        Ok(self.normalise(text))
    }
}

fn flatten_tables(input: &str) -> String {
    map_lines(input, Scope::Unfenced, |line| {
        let trimmed = line.trim();
        if !trimmed.starts_with('|') {
            return Some(line.to_string());
        }
        if RE_TABLE_SEPARATOR.is_match(trimmed) {
            return None;
        }
        let cells: Vec<&str> = trimmed
            .trim_matches('|')
            .split('|')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        Some(cells.join(" "))
    })
}

fn standardise_lists(input: &str) -> String {
    map_lines(input, Scope::Unfenced, |line| {
        let line = RE_BULLET.replace(line, "${1}* ${2}");
        Some(RE_PAREN_NUMBER.replace(&line, "${1}${2}. ").into_owned())
    })
}

fn normalise_headings(input: &str) -> String {
    let tidied = map_lines(input, Scope::Unfenced, |line| Some(RE_ATX.replace(line, "$1 $2").into_owned()));
    let lines: Vec<&str> = tidied.split('\n').collect();
    let fenced = fence_mask(&lines);
    let blank = |i: Option<usize>| i.map_or(true, |i| lines.get(i).map_or(true, |l| l.trim().is_empty()));
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let standalone = blank(i.checked_sub(1)) && blank(Some(i + 1));
            if !fenced[i] && standalone && looks_like_heading(line) {
                let title = line.trim();
                let level = if title.chars().count() < MAJOR_HEADING_LEN { "##" } else { "###" };
                format!("{level} {title}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn looks_like_heading(line: &str) -> bool {
    let title = line.trim();
    !title.is_empty()
        && !is_structural(line)
        && !RE_BULLET.is_match(line)
        && title.chars().count() < MAX_HEADING_LEN
        && !title.ends_with(|c: char| matches!(c, '.' | '!' | '?' | ',' | ';' | ':'))
        && title.chars().any(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor(headings: bool, lists: bool, tables: bool, links: bool) -> StructureProcessor {
        StructureProcessor::new(&StructureConfig {
            preserve_headings: headings,
            preserve_lists: lists,
            preserve_tables: tables,
            preserve_links: links,
        })
    }

    const DOC: &str = "Overview\n\n#Not a heading\n##   Spaced title ##\n\n• first\n– second\n+ third\n1) numbered\n\n| a | b |\n| --- | --- |\n| 1 | 2 |\n\nSee [docs](https://example.com) for more.\n\n```\n• code stays\n```";

    #[test]
    fn all_preserved_is_identity() {
        let p = processor(true, true, true, true);
        assert!(p.is_identity());
        assert_eq!(p.normalise(DOC), DOC);
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(processor(false, false, false, false).normalise(""), "");
    }

    #[test]
    fn lists_standardised() {
        let out = processor(true, false, true, true).normalise(DOC);
        assert!(out.contains("* first\n* second\n* third\n1. numbered"), "{out}");
        assert!(out.contains("```\n• code stays\n```"));
        assert!(out.starts_with("Overview\n"));
    }

    #[test]
    fn headings_normalised_and_promoted() {
        let out = processor(false, true, true, true).normalise(DOC);
        assert!(out.starts_with("## Overview\n"), "{out}");
        assert!(out.contains("## Spaced title\n"));
        assert!(out.contains("#Not a heading\n"));
    }

    #[test]
    fn sentences_are_not_promoted() {
        let text = "A full sentence here.\n\nShort title\n\n12345";
        let out = processor(false, true, true, true).normalise(text);
        assert_eq!(out, "A full sentence here.\n\n## Short title\n\n12345");
    }

    #[test]
    fn long_titles_get_minor_level() {
        let out = processor(false, true, true, true).normalise("A somewhat longer section title");
        assert_eq!(out, "### A somewhat longer section title");
    }

    #[test]
    fn tables_flattened() {
        let out = processor(true, true, false, true).normalise("| a | b |\n| --- | :---: |\n| 1 | 2 |");
        assert_eq!(out, "a b\n1 2");
    }

    #[test]
    fn links_reduced_to_text() {
        let out = processor(true, true, true, false).normalise("See [docs](https://example.com) and ![logo](a.png).");
        assert_eq!(out, "See docs and logo.");
    }

    #[test]
    fn flags_are_independent() {
        let lists_only = processor(true, false, true, true).normalise("Title\n\n• item");
        assert_eq!(lists_only, "Title\n\n* item");
        let headings_only = processor(false, true, true, true).normalise("Title\n\n• item");
        assert_eq!(headings_only, "## Title\n\n• item");
    }

    #[test]
    fn normalisation_is_idempotent() {
        for p in [
            processor(false, false, false, false),
            processor(false, true, true, true),
            processor(true, false, false, true),
        ] {
            let once = p.normalise(DOC);
            assert_eq!(p.normalise(&once), once);
        }
    }
}
