//! Clean-up of text recognised by OCR.
//!
//! Runs only on documents whose metadata says `ocr_applied: true`. Fixes the
//! character confusions tesseract makes most often inside words, rejoins
//! words hyphenated across lines and drops the stray symbol lines that scan
//! noise produces.

use super::markup::{fence_mask, is_structural, map_lines, Scope};
use super::Stage;
use crate::converters::Metadata;
use crate::error::StageError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Lines this short with no letters or digits are scan noise.
const MAX_NOISE_LINE_LEN: usize = 3;

static RE_SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

#[derive(Debug, Clone, Default)]
pub struct OcrPostProcessor;

impl OcrPostProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn fix(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let s = map_lines(text, Scope::Prose, |line| {
            let body = line.trim_start();
            let indent = &line[..line.len() - body.len()];
            let body = RE_SPACE_RUNS.replace_all(body, " ");
            let trimmed = body.trim();
            if !trimmed.is_empty()
                && trimmed.chars().count() <= MAX_NOISE_LINE_LEN
                && !trimmed.chars().any(char::is_alphanumeric)
            {
                return None;
            }
            Some(format!("{indent}{}", fix_confusions(&body)))
        });
        join_hyphenated(&s)
    }
}

impl Stage for OcrPostProcessor {
    fn name(&self) -> &'static str {
        "ocr_postprocessor"
    }

    fn applies_to(&self, metadata: &Metadata) -> bool {
        metadata
            .get("ocr_applied")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn process(&self, text: &str, _metadata: &Metadata) -> Result<String, StageError> {
        Ok(self.fix(text))
    }
}

/// `|` read for `I`, `0` for `o` and `1` for `l`. Each candidate is judged on
/// its original neighbours, so one fix never enables another.
fn fix_confusions(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let lower = |i: Option<usize>| i.and_then(|i| chars.get(i)).is_some_and(|c| c.is_lowercase());
    let word_edge = |i: Option<usize>| {
        i.and_then(|i| chars.get(i))
            .map_or(true, |c| c.is_whitespace() || c.is_alphabetic())
    };
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let prev = i.checked_sub(1);
            let next = Some(i + 1);
            match c {
                '|' if word_edge(prev) && word_edge(next) => 'I',
                '0' if lower(prev) && lower(next) => 'o',
                '1' if lower(prev) && lower(next) => 'l',
                _ => c,
            }
        })
        .collect()
}

/// "recog-\nnition" → "recognition" when the second part starts lowercase.
fn join_hyphenated(input: &str) -> String {
    let lines: Vec<&str> = input.split('\n').collect();
    let fenced = fence_mask(&lines);
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut joinable = false;
    for (line, fenced) in lines.iter().copied().zip(fenced) {
        let prose = !fenced && !is_structural(line) && !line.trim().is_empty();
        if prose && joinable {
            if let Some(prev) = out.last_mut() {
                let head = prev.trim_end();
                let mut tail = head.chars().rev();
                let hyphenated = tail.next() == Some('-') && tail.next().is_some_and(char::is_alphabetic);
                if hyphenated && line.trim_start().starts_with(char::is_lowercase) {
                    let keep = head.len() - 1;
                    prev.truncate(keep);
                    prev.push_str(line.trim());
                    continue;
                }
            }
        }
        joinable = prose;
        out.push(line.to_string());
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn applies_only_to_ocr_output() {
        let stage = OcrPostProcessor::new();
        let mut meta = Metadata::new();
        assert!(!stage.applies_to(&meta));
        meta.insert("ocr_applied".into(), json!(false));
        assert!(!stage.applies_to(&meta));
        meta.insert("ocr_applied".into(), json!(true));
        assert!(stage.applies_to(&meta));
    }

    #[test]
    fn fixes_character_confusions() {
        let out = OcrPostProcessor::new().fix("| think the c0de is wi1d and pipes|fit");
        assert_eq!(out, "I think the code is wild and pipesIfit");
    }

    #[test]
    fn digits_in_numbers_survive() {
        let text = "Total 100 items in 2019, ratio 1:10";
        assert_eq!(OcrPostProcessor::new().fix(text), text);
    }

    #[test]
    fn joins_hyphenated_breaks_and_drops_noise() {
        let text = "Optical recog-\nnition works.\n~\n.,\nNext   line";
        assert_eq!(
            OcrPostProcessor::new().fix(text),
            "Optical recognition works.\nNext line"
        );
    }

    #[test]
    fn tables_are_left_alone() {
        let text = "| a | b |\n| --- | --- |";
        assert_eq!(OcrPostProcessor::new().fix(text), text);
    }

    #[test]
    fn fix_is_idempotent() {
        let stage = OcrPostProcessor::new();
        for text in ["a-\nb-\nc", "x | y a0a0a", "  ...  \nword"] {
            let once = stage.fix(text);
            assert_eq!(stage.fix(&once), once, "{text:?}");
        }
    }
}
