//! Content cleaning: deterministic removal of layout noise and token-saving
//! rewrites of converted text.
//!
//! Converters hand over whatever the source format contained, including
//! running headers, page numbers, legal footers and hard-wrapped lines. This
//! stage strips that noise and then applies the optimisation rewrites
//! (phrase shortening, citation and URL compaction, wrapping).
//!
//! ## Rule Order
//!
//! Noise removal runs before the rewrites so that duplicate and repetition
//! detection see the text as converted. Joining and merging run after the
//! rewrites, whitespace clean-up after that, and wrapping last so it sees the
//! final line content.
//!
//! ## Fixpoint
//!
//! Some rules expose work for others (joining two lines can create a
//! duplicate phrase, removing a line can make two lines adjacent). A single
//! pass is therefore not always stable, so [`ContentCleaner::clean`] repeats
//! the pass until the output stops changing. Running the cleaner on its own
//! output is a no-op.
//!
//! Structural lines (headings, list items, table rows, quotes, code) are
//! never joined, wrapped or rewritten by the prose rules.

use super::markup::{fence_mask, is_fence, is_structural, is_table_row, map_lines, split_blocks, Scope};
use super::phrases::{common_terms, domain_terms, redundant_phrases};
use super::Stage;
use crate::config::{CleaningConfig, OptimizationConfig};
use crate::converters::Metadata;
use crate::error::StageError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Upper bound on clean passes; real documents settle in two.
const MAX_PASSES: usize = 8;

/// Lines repeated at least this often are treated as running headers/footers.
const REPEAT_THRESHOLD: usize = 3;
/// Only lines shorter than this are candidates for header/footer removal.
const REPEAT_MAX_LEN: usize = 100;
/// Paragraphs at or below this length are never treated as duplicates.
const DUPLICATE_MIN_LEN: usize = 20;
/// Paragraphs shorter than this are merged into the next one.
const SHORT_PARAGRAPH_LEN: usize = 80;
/// Noise removal is abandoned when it would keep less than 1/N of the lines.
const MAX_REMOVAL_RATIO: usize = 20;

/// The content-cleaning stage.
#[derive(Debug, Clone, Default)]
pub struct ContentCleaner {
    cleaning: CleaningConfig,
    optimization: OptimizationConfig,
    preserve_links: bool,
}

impl ContentCleaner {
    pub fn new(cleaning: &CleaningConfig, optimization: &OptimizationConfig, preserve_links: bool) -> Self {
        Self {
            cleaning: cleaning.clone(),
            optimization: optimization.clone(),
            preserve_links,
        }
    }

    /// Clean `text` until it is stable.
    pub fn clean(&self, text: &str) -> String {
        self.clean_text(text, false)
    }

    /// Clean one-record-per-line text (CSV output). Line joining, repeated
    /// line removal, page-number removal and wrapping are skipped so no row
    /// is merged or dropped.
    pub fn clean_rows(&self, text: &str) -> String {
        self.clean_text(text, true)
    }

    fn clean_text(&self, text: &str, rows: bool) -> String {
        if text.trim().is_empty() {
            return String::new();
        }
        let mut current = self.clean_once(text, rows);
        for pass in 1..MAX_PASSES {
            let next = self.clean_once(&current, rows);
            if next == current {
                debug!("Content cleaner settled after {} passes", pass);
                return current;
            }
            current = next;
        }
        warn!("Content cleaner did not settle after {} passes", MAX_PASSES);
        current
    }

    fn clean_once(&self, input: &str, rows: bool) -> String {
        let c = &self.cleaning;
        let o = &self.optimization;

        let mut s = normalise_line_endings(input);
        if c.normalize_unicode {
            s = normalize_unicode(&s);
        }
        s = self.remove_noise_lines(&s, rows);
        if c.remove_boilerplate {
            s = remove_boilerplate(&s);
        }
        if c.remove_duplicate_content {
            s = remove_duplicate_paragraphs(&s);
        }
        if o.abbreviate_common_terms {
            s = map_lines(&s, Scope::Unfenced, |l| Some(common_terms().apply(l)));
        }
        for domain in &o.domain_abbreviations {
            s = map_lines(&s, Scope::Unfenced, |l| Some(domain_terms(*domain).apply(l)));
        }
        if o.remove_redundant_phrases {
            s = map_lines(&s, Scope::Unfenced, |l| Some(redundant_phrases().apply(l)));
        }
        if o.condense_repetitive_patterns {
            s = condense_repetition(&s, rows);
        }
        if o.remove_excessive_punctuation {
            s = collapse_punctuation(&s);
        }
        if o.simplify_citations {
            s = simplify_citations(&s);
        }
        if o.simplify_urls {
            s = simplify_urls(&s, self.preserve_links);
        }
        if c.join_paragraph_lines && !rows {
            s = join_paragraph_lines(&s, o.max_line_length > 0);
        }
        if c.merge_short_paragraphs {
            s = merge_short_paragraphs(&s);
        }
        if c.clean_whitespace {
            s = clean_whitespace(&s);
        }
        if o.max_line_length > 0 && !rows {
            s = wrap_lines(&s, o.max_line_length);
        }
        finish(&s)
    }

    // ── Rule 3: Noise lines ──────────────────────────────────────────────────

    fn is_noise(&self, line: &str, rows: bool) -> bool {
        let c = &self.cleaning;
        (c.remove_page_numbers && !rows && RE_PAGE_NUMBERS.iter().any(|re| re.is_match(line)))
            || (c.remove_headers_footers && RE_HEADER_LABEL.is_match(line))
            || (c.remove_watermarks && RE_WATERMARK.is_match(line))
            || (c.remove_irrelevant_metadata && RE_METADATA_LINES.iter().any(|re| re.is_match(line)))
            || (c.remove_footnotes && RE_FOOTNOTE_DEFINITION.is_match(line))
    }

    fn remove_noise_lines(&self, text: &str, rows: bool) -> String {
        let lines: Vec<&str> = text.split('\n').collect();
        let fenced = fence_mask(&lines);

        let repeated: HashSet<&str> = if self.cleaning.remove_headers_footers && !rows {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for (line, fenced) in lines.iter().copied().zip(&fenced) {
                let key = line.trim();
                if !fenced && !key.is_empty() && key.len() < REPEAT_MAX_LEN && !is_structural(line) {
                    *counts.entry(key).or_default() += 1;
                }
            }
            counts
                .into_iter()
                .filter(|(_, n)| *n >= REPEAT_THRESHOLD)
                .map(|(k, _)| k)
                .collect()
        } else {
            HashSet::new()
        };

        let mut kept = Vec::with_capacity(lines.len());
        for (line, fenced) in lines.iter().copied().zip(&fenced) {
            if *fenced {
                kept.push(line.to_string());
                continue;
            }
            if self.is_noise(line, rows) || repeated.contains(line.trim()) {
                continue;
            }
            if self.cleaning.remove_footnotes {
                kept.push(RE_FOOTNOTE_MARKER.replace_all(line, "").into_owned());
            } else {
                kept.push(line.to_string());
            }
        }

        let before = lines.iter().filter(|l| !l.trim().is_empty()).count();
        let after = kept.iter().filter(|l| !l.trim().is_empty()).count();
        if before > 0 && after * MAX_REMOVAL_RATIO < before {
            warn!(
                "Noise removal would keep {} of {} lines; leaving text unchanged",
                after, before
            );
            return text.to_string();
        }
        kept.join("\n")
    }
}

impl Stage for ContentCleaner {
    fn name(&self) -> &'static str {
        "content_cleaner"
    }

    fn process(&self, text: &str, metadata: &Metadata) -> Result<String, StageError> {
        if metadata.get("format").and_then(|v| v.as_str()) == Some("csv") {
            return Ok(self.clean_rows(text));
        }
        Ok(self.clean(text))
    }
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Unicode normalisation ────────────────────────────────────────────

fn normalize_unicode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\u{FB00}' => out.push_str("ff"),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{FB03}' => out.push_str("ffi"),
            '\u{FB04}' => out.push_str("ffl"),
            '\u{FB05}' | '\u{FB06}' => out.push_str("st"),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2002}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}' => out.push(' '),
            // zero-width space/joiners, word joiner, BOM, soft hyphen
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}' => {}
            _ => out.push(ch),
        }
    }
    out
}

static RE_PAGE_NUMBERS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"^\s*\d{1,4}\s*$").unwrap(),
        Regex::new(r"(?i)^\s*(?:#{1,3}\s*)?page\s+\d+(?:\s+of\s+\d+)?\s*$").unwrap(),
        Regex::new(r"^\s*[-–]\s*\d{1,4}\s*[-–]\s*$").unwrap(),
    ]
});

static RE_HEADER_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:#{1,3}\s*)?(?:header|footer)\s*$").unwrap());

static RE_WATERMARK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:#{1,3}\s*)?(?:confidential|draft|internal use only|do not (?:copy|distribute)|sample|proprietary)\s*$",
    )
    .unwrap()
});

static RE_METADATA_LINES: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"^\s*(?:From|To|Cc|Bcc|Subject|Sent|Date|Reply-To):\s+\S").unwrap(),
        Regex::new(r"^\s*\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}\s*$").unwrap(),
        Regex::new(r"(?i)^\s*(?:ref|reference|doc|document)\s*(?:#|:|no\.)\s*[\w./-]+\s*$").unwrap(),
    ]
});

static RE_FOOTNOTE_DEFINITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\[\^?\d+\]:?|[¹²³⁴⁵⁶⁷⁸⁹⁰]+)\s+\S").unwrap());

static RE_FOOTNOTE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\^\d+\]|[¹²³⁴⁵⁶⁷⁸⁹⁰]+").unwrap());

// ── Rule 4: Boilerplate ──────────────────────────────────────────────────────

static RE_BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)all rights reserved\.?.*",
        r"(?i)confidentiality notice:.*",
        r"(?i)this (?:email|e-mail|document|message) (?:contains|is) confidential.*",
        r"(?i)^\s*disclaimer:.*",
        r"(?i)if you (?:have received|are not).*in error.*",
        r"(?i)sent from my (?:iphone|ipad|android|mobile device)",
        r"(?i)\b(?:tel|phone|fax|email):\s*[\w.@+-]+",
        r"(?i)copyright\s+©?\s*\d{4}.*",
        r"©\s*\d{4}.*",
        r"(?i)^\s*privacy policy\b.*",
        r"(?i)please (?:find|see) (?:the )?attached (?:file|document)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

fn remove_boilerplate(input: &str) -> String {
    map_lines(input, Scope::Prose, |line| {
        let mut out = line.to_string();
        for re in RE_BOILERPLATE.iter() {
            if re.is_match(&out) {
                out = re.replace_all(&out, "").into_owned();
            }
        }
        if out.trim().is_empty() && !line.trim().is_empty() {
            None
        } else if out == line {
            Some(out)
        } else {
            Some(out.trim_end().to_string())
        }
    })
}

// ── Rule 5: Duplicate paragraphs ─────────────────────────────────────────────

fn remove_duplicate_paragraphs(input: &str) -> String {
    let mut seen = HashSet::new();
    split_blocks(input)
        .into_iter()
        .filter(|block| {
            if is_fence(block) {
                return true;
            }
            let key = block
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            key.len() <= DUPLICATE_MIN_LEN || seen.insert(key)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ── Rule 8: Repeated words and lines ─────────────────────────────────────────

fn condense_repetition(input: &str, rows: bool) -> String {
    let words = map_lines(input, Scope::Prose, |line| Some(collapse_repeated_words(line)));
    if rows {
        return words;
    }
    remove_consecutive_duplicate_lines(&words)
}

/// "the the cat" → "the cat", "very very." → "very.". Only alphabetic words
/// collapse, so repeated figures in data rows survive.
fn collapse_repeated_words(line: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for token in line.split(' ') {
        if let Some(prev) = out.last_mut() {
            let prev_core = word_core(prev);
            let core = word_core(token);
            if prev_core.len() == prev.len()
                && !core.is_empty()
                && core.chars().all(char::is_alphabetic)
                && prev_core.to_lowercase() == core.to_lowercase()
            {
                prev.push_str(&token[core.len()..]);
                continue;
            }
        }
        out.push(token.to_string());
    }
    out.join(" ")
}

fn word_core(token: &str) -> &str {
    token.trim_end_matches(|c: char| c.is_ascii_punctuation())
}

fn remove_consecutive_duplicate_lines(input: &str) -> String {
    let lines: Vec<&str> = input.split('\n').collect();
    let fenced = fence_mask(&lines);
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut previous: Option<&str> = None;
    for (line, fenced) in lines.iter().copied().zip(fenced) {
        let key = line.trim();
        if !fenced && !key.is_empty() && !is_table_row(line) && previous == Some(key) {
            continue;
        }
        previous = (!fenced && !key.is_empty()).then_some(key);
        out.push(line);
    }
    out.join("\n")
}

// ── Rule 9: Excessive punctuation ────────────────────────────────────────────

static RE_PUNCTUATION_RUNS: Lazy<[(Regex, &str); 5]> = Lazy::new(|| {
    [
        (Regex::new(r"\.{2,}").unwrap(), "."),
        (Regex::new(r"!{2,}").unwrap(), "!"),
        (Regex::new(r"\?{2,}").unwrap(), "?"),
        (Regex::new(r"-{2,}").unwrap(), "-"),
        (Regex::new(r"_{2,}").unwrap(), "_"),
    ]
});

fn collapse_punctuation(input: &str) -> String {
    map_lines(input, Scope::Prose, |line| {
        let mut out = line.to_string();
        for (re, replacement) in RE_PUNCTUATION_RUNS.iter() {
            if re.is_match(&out) {
                out = re.replace_all(&out, *replacement).into_owned();
            }
        }
        Some(out)
    })
}

// ── Rule 10: Citations ───────────────────────────────────────────────────────

static RE_CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\(([A-Z][\w'’-]+(?: et al\.?| (?:and|&) [A-Z][\w'’-]+)?),? (\d{4}[a-z]?)(?:[,;][^)]*)?\)",
    )
    .unwrap()
});

/// `(Smith et al., 2020, p. 4)` → `[Smith et al. 2020]`.
fn simplify_citations(input: &str) -> String {
    map_lines(input, Scope::Unfenced, |line| {
        Some(RE_CITATION.replace_all(line, "[$1 $2]").into_owned())
    })
}

// ── Rule 11: URLs ────────────────────────────────────────────────────────────

static RE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\]\([^)\s]*\))|https?://(?:www\.)?([^/\s)?#]+)([^?#\s)]*)(?:\?[^\s)]*)?(?:#[^\s)]*)?")
        .unwrap()
});

/// `https://www.example.com/a/b?x=1#top` → `example.com/a/b`. With
/// `preserve_links`, targets of Markdown links are left alone.
fn simplify_urls(input: &str, preserve_links: bool) -> String {
    map_lines(input, Scope::Unfenced, |line| {
        let out = RE_URL.replace_all(line, |caps: &Captures<'_>| {
            if let Some(link) = caps.get(1) {
                if preserve_links {
                    return link.as_str().to_string();
                }
                let target = &link.as_str()[2..link.as_str().len() - 1];
                return format!("]({})", simplify_urls(target, false));
            }
            let path = caps.get(3).map_or("", |m| m.as_str());
            let path = if path == "/" { "" } else { path };
            format!("{}{}", &caps[2], path)
        });
        Some(out.into_owned())
    })
}

// ── Rule 12: Join hard-wrapped lines ─────────────────────────────────────────

enum Join {
    Dehyphenate,
    Space,
}

fn join_kind(prev: &str, next: &str, reflow: bool) -> Option<Join> {
    let prev = prev.trim_end();
    let next_lower = next
        .trim_start()
        .chars()
        .next()
        .is_some_and(char::is_lowercase);
    let mut tail = prev.chars().rev();
    let last = tail.next()?;
    if last == '-' && tail.next().is_some_and(char::is_alphabetic) && next_lower {
        return Some(Join::Dehyphenate);
    }
    let terminal = matches!(last, '.' | '!' | '?' | ':' | ';');
    if reflow || last == ',' || (!terminal && next_lower) {
        return Some(Join::Space);
    }
    None
}

/// Re-join prose lines that the source layout broke mid-sentence. With
/// `reflow` (wrapping enabled) every run of prose lines becomes one line.
fn join_paragraph_lines(input: &str, reflow: bool) -> String {
    let lines: Vec<&str> = input.split('\n').collect();
    let fenced = fence_mask(&lines);
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut joinable = false;
    for (line, fenced) in lines.iter().zip(fenced) {
        let prose = !fenced && !line.trim().is_empty() && !is_structural(line);
        if prose && joinable {
            if let Some(prev) = out.last_mut() {
                match join_kind(prev, line, reflow) {
                    Some(Join::Dehyphenate) => {
                        prev.truncate(prev.trim_end().len() - 1);
                        prev.push_str(line.trim());
                        continue;
                    }
                    Some(Join::Space) => {
                        prev.truncate(prev.trim_end().len());
                        prev.push(' ');
                        prev.push_str(line.trim());
                        continue;
                    }
                    None => {}
                }
            }
        }
        joinable = prose;
        out.push(line.to_string());
    }
    out.join("\n")
}

// ── Rule 13: Merge short paragraphs ──────────────────────────────────────────

fn is_short_paragraph(block: &str) -> bool {
    !block.contains('\n')
        && block.chars().count() < SHORT_PARAGRAPH_LEN
        && !is_structural(block)
        && !block
            .trim_end()
            .ends_with(|c: char| matches!(c, '.' | '!' | '?' | ':' | ';'))
}

fn merge_short_paragraphs(input: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for block in split_blocks(input) {
        let first_line = block.lines().next().unwrap_or_default();
        if let Some(last) = out.last_mut() {
            if is_short_paragraph(last) && !is_structural(first_line) {
                last.truncate(last.trim_end().len());
                last.push(' ');
                last.push_str(block.trim_start());
                continue;
            }
        }
        out.push(block);
    }
    out.join("\n\n")
}

// ── Rule 14: Whitespace ──────────────────────────────────────────────────────

static RE_INNER_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}|\t").unwrap());

/// Collapse inner runs of spaces and tabs, trim line ends and keep at most
/// one blank line in a row. Fenced code only loses trailing whitespace.
fn clean_whitespace(input: &str) -> String {
    let lines: Vec<&str> = input.split('\n').collect();
    let fenced = fence_mask(&lines);
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut previous_blank = false;
    for (line, fenced) in lines.iter().zip(fenced) {
        let line = line.trim_end();
        if fenced {
            out.push(line.to_string());
            previous_blank = false;
            continue;
        }
        if line.is_empty() {
            if !previous_blank {
                out.push(String::new());
            }
            previous_blank = true;
            continue;
        }
        previous_blank = false;
        let body = line.trim_start();
        let indent = &line[..line.len() - body.len()];
        out.push(format!("{indent}{}", RE_INNER_SPACE.replace_all(body, " ")));
    }
    out.join("\n")
}

// ── Rule 15: Wrap ────────────────────────────────────────────────────────────

fn wrap_lines(input: &str, width: usize) -> String {
    map_lines(input, Scope::Prose, |line| {
        if line.chars().count() <= width {
            Some(line.to_string())
        } else {
            Some(wrap_line(line, width))
        }
    })
}

/// Greedy word wrap. A word that would start a continuation line with
/// something Markdown reads as structure stays on the current line instead,
/// as does the word after a trailing hyphen.
fn wrap_line(line: &str, width: usize) -> String {
    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::from(indent);
    for word in body.split_whitespace() {
        if current.len() == indent.len() {
            current.push_str(word);
            continue;
        }
        let fits = current.chars().count() + 1 + word.chars().count() <= width;
        if fits || current.ends_with('-') || is_structural(&format!("{word} ")) {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, format!("{indent}{word}")));
        }
    }
    // A lone number on the last line would read as a page number.
    match lines.last_mut() {
        Some(prev) if current.trim().chars().all(|c| c.is_ascii_digit()) => {
            prev.push(' ');
            prev.push_str(current.trim());
        }
        _ => lines.push(current),
    }
    lines.join("\n")
}

// ── Rule 16: Final trim ──────────────────────────────────────────────────────

fn finish(input: &str) -> String {
    input.trim_start_matches('\n').trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AbbreviationDomain;

    fn default_cleaner() -> ContentCleaner {
        ContentCleaner::new(&CleaningConfig::default(), &OptimizationConfig::default(), true)
    }

    fn cleaner_with(f: impl FnOnce(&mut CleaningConfig, &mut OptimizationConfig)) -> ContentCleaner {
        let mut cleaning = CleaningConfig::default();
        let mut optimization = OptimizationConfig::default();
        f(&mut cleaning, &mut optimization);
        ContentCleaner::new(&cleaning, &optimization, true)
    }

    const REPORT: &str = "ACME Quarterly Report\r\n\
Page 1 of 3\r\n\
\r\n\
# Summary\r\n\
\r\n\
Revenue grew strongly due to the fact that demand was high and\r\n\
costs were contained in the second half of the year.\r\n\
\r\n\
ACME Quarterly Report\r\n\
2\r\n\
\r\n\
* First point\r\n\
* Second point\r\n\
\r\n\
| Region | Sales |\r\n\
| --- | --- |\r\n\
| North | 10 |\r\n\
\r\n\
ACME Quarterly Report\r\n\
Copyright © 2024 ACME Corp. All rights reserved.\r\n";

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(default_cleaner().clean(""), "");
        assert_eq!(default_cleaner().clean("  \n\n \t"), "");
    }

    #[test]
    fn cleans_report() {
        let out = default_cleaner().clean(REPORT);
        assert_eq!(
            out,
            "# Summary\n\n\
Revenue grew strongly because demand was high and costs were contained in the second half of the year.\n\n\
* First point\n\
* Second point\n\n\
| Region | Sales |\n\
| --- | --- |\n\
| North | 10 |"
        );
    }

    #[test]
    fn cleaning_is_idempotent() {
        let samples = [
            REPORT,
            "Hello   world!!!  \n\n\n\nSecond  para...",
            "The the results were very very good.\nThey improved (Smith et al., 2020).",
            "co-\noperation is key, and\nso is trust",
            "```\nraw   text\n\n\nkept\n```\n\nafter",
        ];
        let cleaners = [
            default_cleaner(),
            cleaner_with(|c, o| {
                c.merge_short_paragraphs = true;
                o.max_line_length = 20;
                o.simplify_urls = true;
            }),
        ];
        for cleaner in &cleaners {
            for sample in samples {
                let once = cleaner.clean(sample);
                assert_eq!(cleaner.clean(&once), once, "not idempotent for {sample:?}");
            }
        }
    }

    #[test]
    fn redundant_phrase_is_shortened() {
        let out = default_cleaner().clean("We stopped due to the fact that it rained.");
        assert_eq!(out, "We stopped because it rained.");
    }

    #[test]
    fn repeated_header_lines_are_removed() {
        let text = "Running head\nBody one.\n\nRunning head\nBody two.\n\nRunning head\nBody three.";
        let out = default_cleaner().clean(text);
        assert_eq!(out, "Body one.\n\nBody two.\n\nBody three.");
    }

    #[test]
    fn two_repeats_are_not_a_header() {
        let text = "Note\nBody one.\n\nNote\nBody two.";
        let out = cleaner_with(|c, _| c.remove_duplicate_content = false).clean(text);
        assert_eq!(out, "Note\nBody one.\n\nNote\nBody two.");
    }

    #[test]
    fn safeguard_keeps_text_when_everything_is_noise() {
        let mut text = String::from("Keep me");
        for n in 1..=30 {
            text.push_str(&format!("\n{n}"));
        }
        let out = cleaner_with(|_, o| o.condense_repetitive_patterns = false).clean(&text);
        assert!(out.starts_with("Keep me\n1\n2"), "{out}");
    }

    #[test]
    fn page_numbers_and_watermarks_go() {
        let text = "Intro text.\n- 4 -\nPage 7\nCONFIDENTIAL\nMore text.";
        let out = default_cleaner().clean(text);
        assert_eq!(out, "Intro text.\nMore text.");
    }

    #[test]
    fn metadata_lines_go() {
        let text = "From: alice@example.com\nSubject: Hello\n12/03/2024\nActual content.";
        assert_eq!(default_cleaner().clean(text), "Actual content.");
    }

    #[test]
    fn footnotes_only_when_enabled() {
        let text = "A claim[^1] here.\n\n[^1]: The source.";
        assert_eq!(default_cleaner().clean(text), text);
        let out = cleaner_with(|c, _| c.remove_footnotes = true).clean(text);
        assert_eq!(out, "A claim here.");
    }

    #[test]
    fn boilerplate_is_stripped() {
        let text = "Real content here.\n© 2023 Example Inc.\nSent from my iPhone";
        assert_eq!(default_cleaner().clean(text), "Real content here.");
    }

    #[test]
    fn duplicate_paragraphs_removed() {
        let para = "This paragraph is long enough to count as content.";
        let text = format!("{para}\n\nOther.\n\n{}", para.to_uppercase());
        assert_eq!(default_cleaner().clean(&text), format!("{para}\n\nOther."));
    }

    #[test]
    fn short_duplicates_survive() {
        let text = "Yes.\n\nNo.\n\nYes.";
        assert_eq!(default_cleaner().clean(text), text);
    }

    #[test]
    fn repeated_words_collapse() {
        let out = default_cleaner().clean("It was very very. The the end 10 10.");
        assert_eq!(out, "It was very. The end 10 10.");
    }

    #[test]
    fn consecutive_duplicate_lines_collapse() {
        let out = cleaner_with(|c, _| c.join_paragraph_lines = false).clean("Same line.\nSame line.\nOther.");
        assert_eq!(out, "Same line.\nOther.");
    }

    #[test]
    fn csv_rows_are_never_joined_or_dropped() {
        const ROWS: &str = "name qty\nbolt 4\nbolt 4\nnut 5\nnut 5\nnut 5\nwasher 6\n12\n12";
        let mut metadata = Metadata::new();
        metadata.insert("format".into(), "csv".into());
        let out = default_cleaner().process(ROWS, &metadata).unwrap();
        assert_eq!(out, ROWS);

        let prose = default_cleaner().clean(ROWS);
        assert!(prose.lines().count() < 9, "{prose}");
    }

    #[test]
    fn punctuation_runs_collapse() {
        assert_eq!(default_cleaner().clean("Wait!!! Really?? Yes..."), "Wait! Really? Yes.");
    }

    #[test]
    fn citations_simplify() {
        let out = default_cleaner().clean("As shown (Smith et al., 2020, p. 4) and (Lee & Park, 2019).");
        assert_eq!(out, "As shown [Smith et al. 2020] and [Lee & Park 2019].");
    }

    #[test]
    fn urls_simplify_but_links_survive() {
        let cleaner = cleaner_with(|_, o| o.simplify_urls = true);
        let out = cleaner.clean("See https://www.example.com/docs/a?x=1#top and [site](https://example.com/).");
        assert_eq!(out, "See example.com/docs/a and [site](https://example.com/).");

        let unpreserved = ContentCleaner::new(
            &CleaningConfig::default(),
            &OptimizationConfig {
                simplify_urls: true,
                ..OptimizationConfig::default()
            },
            false,
        );
        assert_eq!(unpreserved.clean("[site](https://example.com/)"), "[site](example.com)");
    }

    #[test]
    fn joins_and_dehyphenates() {
        let out = default_cleaner().clean("The co-\noperation was\ngood. Next\nSentence stays.");
        assert_eq!(out, "The cooperation was good. Next\nSentence stays.");
    }

    #[test]
    fn structure_is_never_joined() {
        let text = "# Heading\nbody text\n* item one\n* item two";
        assert_eq!(default_cleaner().clean(text), text);
    }

    #[test]
    fn merges_short_paragraphs_when_enabled() {
        let text = "Short intro\n\nThe rest of the paragraph.";
        assert_eq!(default_cleaner().clean(text), text);
        let out = cleaner_with(|c, _| c.merge_short_paragraphs = true).clean(text);
        assert_eq!(out, "Short intro The rest of the paragraph.");
    }

    #[test]
    fn whitespace_collapses_outside_code() {
        let text = "a  b\t c\n\n\n\nd\n```\nx   y\n```";
        assert_eq!(
            cleaner_with(|c, _| c.join_paragraph_lines = false).clean(text),
            "a b c\n\nd\n```\nx   y\n```"
        );
    }

    #[test]
    fn wraps_long_lines() {
        let cleaner = cleaner_with(|_, o| o.max_line_length = 20);
        let out = cleaner.clean("one two three four five six seven eight");
        assert_eq!(out, "one two three four\nfive six seven eight");
        assert!(out.lines().all(|l| l.chars().count() <= 20));
    }

    #[test]
    fn wrap_never_starts_a_line_with_markup() {
        let cleaner = cleaner_with(|_, o| o.max_line_length = 10);
        let out = cleaner.clean("alpha beta # gamma");
        for line in out.lines() {
            assert!(!is_structural(line), "{line:?} in {out:?}");
        }
    }

    #[test]
    fn domain_abbreviations_apply_when_listed() {
        let cleaner = cleaner_with(|_, o| o.domain_abbreviations = vec![AbbreviationDomain::Medical]);
        assert_eq!(
            cleaner.clean("Measure blood pressure daily."),
            "Measure BP daily."
        );
    }

    #[test]
    fn unicode_is_normalised() {
        let out = default_cleaner().clean("\u{feff}The “ﬁnal” word\u{200b}\u{a0}ends…");
        assert_eq!(out, "The \"final\" word ends.");
    }

    #[test]
    fn stage_reports_name() {
        let cleaner = default_cleaner();
        assert_eq!(cleaner.name(), "content_cleaner");
        assert_eq!(cleaner.process("x", &Metadata::new()).unwrap(), "x");
    }
}
