//! Size and speed metrics attached to every successful result.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::time::Duration;

static RE_TOKEN_PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.,!?;:]").unwrap());

/// Rough LLM token estimate: whitespace-separated words plus punctuation marks.
pub fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace().count() + RE_TOKEN_PUNCTUATION.find_iter(text).count()
}

/// Percentage by which `after` is smaller than `before`; 0 when `before` is 0.
fn reduction_percent(before: usize, after: usize) -> f64 {
    if before == 0 {
        return 0.0;
    }
    round2((before as f64 - after as f64) / before as f64 * 100.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Compute the metrics map for one processed document.
pub fn calculate(original: &str, processed: &str, elapsed: Duration) -> Map<String, Value> {
    let seconds = elapsed.as_secs_f64();
    let original_len = original.chars().count();
    let processed_len = processed.chars().count();
    let original_tokens = estimate_tokens(original);
    let processed_tokens = estimate_tokens(processed);
    let chars_per_second = if seconds > 0.0 {
        round2(original_len as f64 / seconds)
    } else {
        0.0
    };

    let mut m = Map::new();
    m.insert("processing_time_seconds".into(), json!(round2(seconds)));
    m.insert("original_text_length".into(), json!(original_len));
    m.insert("processed_text_length".into(), json!(processed_len));
    m.insert(
        "text_length_reduction_percent".into(),
        json!(reduction_percent(original_len, processed_len)),
    );
    m.insert("original_token_estimate".into(), json!(original_tokens));
    m.insert("processed_token_estimate".into(), json!(processed_tokens));
    m.insert(
        "token_reduction_percent".into(),
        json!(reduction_percent(original_tokens, processed_tokens)),
    );
    m.insert("chars_per_second".into(), json!(chars_per_second));
    m
}
