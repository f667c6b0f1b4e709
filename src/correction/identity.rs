//! Stable segment identifiers and review snippets.

use crate::defaults;
use crate::segment::Segment;
use serde_json::Value;
use sha1::{Digest, Sha1};

pub(crate) fn stable_sha1(value: &str) -> String {
    format!("{:x}", Sha1::digest(value.as_bytes()))
}

fn explicit_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn render(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Derive the id candidates, decisions and patch-log entries use to refer
/// to a segment.
///
/// Explicit `id`/`uuid` wins. Otherwise numeric timestamps are hashed with
/// the transcript key, so ids survive reordering. Then the segment index,
/// and finally a hash of whatever the segment does carry.
pub fn resolve_segment_id(segment: &Segment, transcript_key: &str, index: Option<usize>) -> String {
    if let Some(id) = explicit_id(segment.id.as_ref()).or_else(|| explicit_id(segment.uuid.as_ref())) {
        return id;
    }

    if let (Some(start), Some(end)) = (segment.start_secs(), segment.end_secs()) {
        return stable_sha1(&format!("{transcript_key}:{start:.3}:{end:.3}"));
    }

    if let Some(index) = index {
        return stable_sha1(&format!("{transcript_key}:{index}"));
    }

    let head: String = segment.text().chars().take(50).collect();
    stable_sha1(&format!(
        "{transcript_key}:{}:{}:{}:{head}",
        render(segment.start_value()),
        render(segment.end_value()),
        segment.speaker.as_deref().unwrap_or(""),
    ))
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Context around `[start, end)` for a human reviewer.
pub fn build_snippet(text: &str, start: usize, end: usize) -> String {
    let from = floor_boundary(text, start.saturating_sub(defaults::SNIPPET_WINDOW));
    let to = ceil_boundary(text, end.saturating_add(defaults::SNIPPET_WINDOW).min(text.len()));
    text.get(from..to).unwrap_or(text).trim().to_string()
}
