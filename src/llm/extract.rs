//! Turning model text into validated domain values.
//!
//! Model output is not a reliable wire format. Text may come wrapped in
//! markdown fences, surrounded by commentary, or (in JSON-object mode) nested
//! one level down under an arbitrary key. The helpers here recover the JSON
//! and then validate it in full: a batch either parses completely or the whole
//! call fails.

use serde_json::Value;

use super::error::ProviderError;
use super::provider::Provider;
use super::types::{GemReport, TrendItem};

type Attempt = fn(&str) -> Option<Vec<Value>>;

/// Recovery steps for free text, tried in order. The first one that yields a
/// JSON array wins.
const ATTEMPTS: [(&str, Attempt); 3] = [
    ("bracketed", bracketed_array),
    ("unfenced", unfenced_array),
    ("leading", leading_array),
];

/// Recover a JSON array from free text, or `None` if nothing parses.
pub fn recover_array(raw: &str) -> Option<Vec<Value>> {
    ATTEMPTS.iter().find_map(|(step, attempt)| {
        let items = attempt(raw)?;
        tracing::debug!(step, items = items.len(), "recovered JSON array from model text");
        Some(items)
    })
}

/// Parse the outermost bracketed span: first `[` through last `]`.
pub fn bracketed_array(raw: &str) -> Option<Vec<Value>> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }
    as_array(serde_json::from_str(&raw[start..=end]).ok()?)
}

/// Strip code-fence markers and parse what's left as a whole.
pub fn unfenced_array(raw: &str) -> Option<Vec<Value>> {
    as_array(serde_json::from_str(&strip_code_fences(raw)).ok()?)
}

/// If the unfenced text opens an array, parse the first complete JSON value
/// and ignore whatever trails it.
pub fn leading_array(raw: &str) -> Option<Vec<Value>> {
    let cleaned = strip_code_fences(raw);
    if !cleaned.starts_with('[') {
        return None;
    }
    let first = serde_json::Deserializer::from_str(&cleaned)
        .into_iter::<Value>()
        .next()?
        .ok()?;
    as_array(first)
}

/// Remove a markdown code fence around the whole text: an opening fence
/// with an optional language tag, and a closing fence. Backticks inside
/// the body are left alone.
pub fn strip_code_fences(raw: &str) -> String {
    let text = raw.trim();
    let text = match text.strip_prefix("```") {
        Some(rest) => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        None => text,
    };
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim().to_string()
}

/// Parse text that should already be a bare JSON array.
pub fn parse_array(raw: &str) -> Option<Vec<Value>> {
    as_array(serde_json::from_str(raw.trim()).ok()?)
}

/// Find the trend array inside a JSON-object-mode envelope.
///
/// Accepts the array itself, an object with a `trends` array, or failing
/// that the first array-valued field of the object, in document order.
pub fn unwrap_envelope(value: Value) -> Option<Vec<Value>> {
    let mut map = match value {
        Value::Array(items) => return Some(items),
        Value::Object(map) => map,
        _ => return None,
    };

    let key = if map.get("trends").is_some_and(Value::is_array) {
        "trends".to_string()
    } else {
        map.iter().find(|(_, v)| v.is_array())?.0.clone()
    };

    as_array(map.remove(&key)?)
}

/// Validate every recovered item. Zero items is a failure, and so is any
/// item that doesn't fit [`TrendItem`].
pub fn parse_trend_items(
    provider: Provider,
    items: Vec<Value>,
) -> Result<Vec<TrendItem>, ProviderError> {
    if items.is_empty() {
        return Err(ProviderError::EmptyResult { provider });
    }
    let count = items.len();
    serde_json::from_value(Value::Array(items)).map_err(|e| {
        tracing::warn!(%provider, count, error = %e, "trend batch failed validation");
        ProviderError::malformed(provider, format!("a trend item failed validation ({e})"))
    })
}

/// Parse and validate a GEM report from JSON text.
pub fn parse_report(provider: Provider, raw: &str) -> Result<GemReport, ProviderError> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|_| ProviderError::malformed(provider, "the rating was not valid JSON"))?;
    serde_json::from_value(value).map_err(|e| {
        tracing::warn!(%provider, error = %e, "rating failed validation");
        ProviderError::malformed(provider, format!("the rating was incomplete ({e})"))
    })
}

fn as_array(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        _ => None,
    }
}
