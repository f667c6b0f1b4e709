//! Diarized dialogue segments and speaker-label heuristics.
//!
//! A segment owns its original text and, once the applier has touched it,
//! the edited text. On the wire this maps to `text` (current) and
//! `text_raw` (original, only present after the first edit).

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// One utterance from a diarized transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SegmentRecord", into = "SegmentRecord")]
pub struct Segment {
    pub speaker: Option<String>,
    original: String,
    edited: Option<String>,
    pub id: Option<Value>,
    pub uuid: Option<Value>,
    pub start: Option<Value>,
    pub end: Option<Value>,
    pub start_time: Option<Value>,
    pub end_time: Option<Value>,
    /// Fields this engine does not interpret; preserved on rewrite.
    pub extra: Map<String, Value>,
}

impl Segment {
    /// Create an unedited segment with no timestamps or ids.
    pub fn new(speaker: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.map(str::to_string),
            original: text.into(),
            edited: None,
            id: None,
            uuid: None,
            start: None,
            end: None,
            start_time: None,
            end_time: None,
            extra: Map::new(),
        }
    }

    /// Builder-style timestamps, stored under `start`/`end`.
    pub fn with_times(mut self, start: f64, end: f64) -> Self {
        self.start = Some(Value::from(start));
        self.end = Some(Value::from(end));
        self
    }

    /// Builder-style explicit id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(Value::String(id.into()));
        self
    }

    /// The text detectors and the applier operate on.
    pub fn text(&self) -> &str {
        self.edited.as_deref().unwrap_or(&self.original)
    }

    /// Text as it was before any correction.
    pub fn original_text(&self) -> &str {
        &self.original
    }

    /// Whether any correction has been applied.
    pub fn is_edited(&self) -> bool {
        self.edited.is_some()
    }

    /// Replace the current text, keeping the original untouched.
    pub fn set_text(&mut self, text: String) {
        self.edited = Some(text);
    }

    /// Raw `start` (or `start_time`) value.
    pub fn start_value(&self) -> Option<&Value> {
        self.start.as_ref().or(self.start_time.as_ref())
    }

    /// Raw `end` (or `end_time`) value.
    pub fn end_value(&self) -> Option<&Value> {
        self.end.as_ref().or(self.end_time.as_ref())
    }

    /// Start time in seconds, when numeric.
    pub fn start_secs(&self) -> Option<f64> {
        self.start_value().and_then(Value::as_f64)
    }

    /// End time in seconds, when numeric.
    pub fn end_secs(&self) -> Option<f64> {
        self.end_value().and_then(Value::as_f64)
    }
}

#[derive(Serialize, Deserialize)]
struct SegmentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speaker: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uuid: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_time: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<SegmentRecord> for Segment {
    fn from(record: SegmentRecord) -> Self {
        let (original, edited) = match record.text_raw {
            Some(raw) => (raw, Some(record.text)),
            None => (record.text, None),
        };
        Self {
            speaker: record.speaker,
            original,
            edited,
            id: record.id,
            uuid: record.uuid,
            start: record.start,
            end: record.end,
            start_time: record.start_time,
            end_time: record.end_time,
            extra: record.extra,
        }
    }
}

impl From<Segment> for SegmentRecord {
    fn from(segment: Segment) -> Self {
        let (text, text_raw) = match segment.edited {
            Some(edited) => (edited, Some(segment.original)),
            None => (segment.original, None),
        };
        Self {
            speaker: segment.speaker,
            text,
            text_raw,
            id: segment.id,
            uuid: segment.uuid,
            start: segment.start,
            end: segment.end,
            start_time: segment.start_time,
            end_time: segment.end_time,
            extra: segment.extra,
        }
    }
}

static PLACEHOLDER_SPEAKER: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: hardcoded pattern — always valid
    #[allow(clippy::expect_used)]
    Regex::new(
        r"^(?:speaker_\d+|speaker\s*\d+.*|\d+|unidentified.*|unknown|unknown_speaker|unknown.*speaker|none)$",
    )
    .expect("hardcoded placeholder speaker pattern")
});

/// Whether a label looks like a human-annotated name rather than a
/// diarizer placeholder ("SPEAKER_01", "Unknown", "10", ...).
pub fn is_named_speaker(name: &str) -> bool {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return false;
    }
    !PLACEHOLDER_SPEAKER.is_match(&name)
}

/// Whether a segment's speaker is not a confirmed, named person.
pub fn is_unidentified_speaker(speaker: Option<&str>) -> bool {
    let Some(speaker) = speaker else {
        return true;
    };
    let upper = speaker.to_uppercase();
    if speaker.is_empty() || upper.starts_with("SPEAKER_") || upper.contains("UNKNOWN") {
        return true;
    }
    !is_named_speaker(speaker)
}
