//! Line classification shared by the processing stages.
//!
//! Stages rewrite prose but must leave Markdown structure alone: headings,
//! list items, table rows, block quotes, rules and code. Everything here
//! works on `\n`-separated text, so run line-ending normalisation first.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_STRUCTURAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:#{1,6}\s|\||>|(?:[*+-]|\d{1,3}[.)])\s|[-*_]{3,}\s*$|```)").unwrap()
});

static RE_INDENTED_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?: {4,}|\t)\S").unwrap());

/// Whether `line` carries Markdown structure (heading, list item, table row,
/// quote, rule, fence or indented code).
pub fn is_structural(line: &str) -> bool {
    RE_STRUCTURAL.is_match(line) || RE_INDENTED_CODE.is_match(line)
}

pub fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

pub fn is_table_row(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// For each line, whether it is a fence line or sits inside a fenced block.
pub fn fence_mask(lines: &[&str]) -> Vec<bool> {
    let mut inside = false;
    lines
        .iter()
        .map(|line| {
            if is_fence(line) {
                inside = !inside;
                true
            } else {
                inside
            }
        })
        .collect()
}

/// Which lines a line-wise rule may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every line outside fenced code.
    Unfenced,
    /// Unfenced lines that carry no Markdown structure.
    Prose,
}

/// Apply `f` to every line in `scope`. Returning `None` drops the line;
/// lines outside the scope pass through untouched.
pub fn map_lines<F>(text: &str, scope: Scope, mut f: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let lines: Vec<&str> = text.split('\n').collect();
    let fenced = fence_mask(&lines);
    let mut out = Vec::with_capacity(lines.len());
    for (line, fenced) in lines.iter().copied().zip(fenced) {
        let in_scope = !fenced && (scope == Scope::Unfenced || !is_structural(line));
        if !in_scope {
            out.push(line.to_string());
        } else if let Some(mapped) = f(line) {
            out.push(mapped);
        }
    }
    out.join("\n")
}

/// Split `text` into blank-line separated blocks. Blank lines inside fenced
/// code do not split.
pub fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut inside = false;
    for line in text.split('\n') {
        if is_fence(line) {
            inside = !inside;
        }
        if !inside && !is_fence(line) && line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}
