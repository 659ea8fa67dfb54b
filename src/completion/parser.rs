use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Sentiment;

// Greedy: first '[' to last ']', newlines included. Models tend to wrap the
// array in prose, so take the widest span and let the JSON parser judge it.
static ARRAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

/// Extract a label array from raw completion text.
///
/// Finds the longest array-literal substring, parses it as a list of strings,
/// and maps each to a sentiment (unrecognized labels become neutral). If no
/// array is found or it is not valid JSON, returns `expected` neutrals
/// instead of failing. The returned length can differ from `expected` when an
/// array was found but had the wrong arity; callers index with a neutral
/// default.
pub fn parse_labels(raw: &str, expected: usize) -> Vec<Sentiment> {
    let fallback = || vec![Sentiment::Neutral; expected];

    let Some(found) = ARRAY_RE.find(raw) else {
        return fallback();
    };

    match serde_json::from_str::<Vec<String>>(found.as_str()) {
        Ok(labels) => labels
            .iter()
            .map(|label| Sentiment::from_label(label))
            .collect(),
        Err(_) => fallback(),
    }
}
