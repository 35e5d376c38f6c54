//! Substitution of localized references in the card document

use super::scanner::reference_spans;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::ops::Range;

/// Returns a copy of `document` with every localized URL replaced
///
/// Maps and sequences are rebuilt; string leaves have each `url -> public
/// path` substitution applied; other leaves and object keys are unchanged.
///
/// Longer URLs are substituted first. An occurrence is only replaced when it
/// is not followed by more URL characters and does not start inside a longer
/// URL, so a reference embedded in another one (for example an image proxy's
/// `?url=` parameter) never corrupts it.
///
/// # Example
///
/// ```
/// use card_localizer::localizer::walk;
/// use serde_json::json;
/// use std::collections::HashMap;
///
/// let references = HashMap::from([(
///     "http://example.com/a.png".to_string(),
///     "/niko/Ann/images/a.png".to_string(),
/// )]);
/// let document = json!({"greeting_image": "http://example.com/a.png"});
///
/// assert_eq!(
///     walk(&document, &references),
///     json!({"greeting_image": "/niko/Ann/images/a.png"})
/// );
/// ```
pub fn walk(document: &Value, references: &HashMap<String, String>) -> Value {
    let mut ordered: Vec<(&str, &str)> = references
        .iter()
        .map(|(url, public)| (url.as_str(), public.as_str()))
        .collect();
    // Longest first; ties broken by text for a stable result
    ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

    walk_value(document, &ordered)
}

fn walk_value(value: &Value, ordered: &[(&str, &str)]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), walk_value(value, ordered)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| walk_value(item, ordered)).collect())
        }
        Value::String(text) => Value::String(rewrite_text(text, ordered)),
        other => other.clone(),
    }
}

fn rewrite_text(text: &str, ordered: &[(&str, &str)]) -> String {
    let mut current = text.to_string();
    for (url, public) in ordered {
        if let Some(replaced) = replace_bounded(&current, url, public) {
            current = replaced;
        }
    }
    current
}

/// Replaces occurrences of `from` that stand on their own as a reference
///
/// Returns None when nothing was replaced.
fn replace_bounded(text: &str, from: &str, to: &str) -> Option<String> {
    if from.is_empty() || !text.contains(from) {
        return None;
    }

    let spans = reference_spans(text);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut replaced = false;

    for (start, _) in text.match_indices(from) {
        let end = start + from.len();
        if !ends_reference(&text[end..]) || starts_inside_reference(&spans, start) {
            continue;
        }
        out.push_str(&text[last..start]);
        out.push_str(to);
        last = end;
        replaced = true;
    }

    if !replaced {
        return None;
    }

    out.push_str(&text[last..]);
    Some(out)
}

/// True if the text following a match cannot continue the URL
fn ends_reference(rest: &str) -> bool {
    match rest.chars().next() {
        None => true,
        Some(c) => {
            c.is_whitespace() || matches!(c, '\'' | '"' | '`' | '<' | '>' | '(' | ')' | '\\')
        }
    }
}

/// True if `start` falls strictly inside a longer URL-shaped run
fn starts_inside_reference(spans: &[Range<usize>], start: usize) -> bool {
    spans
        .iter()
        .any(|span| span.start < start && start < span.end)
}
