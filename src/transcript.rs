//! Transcript files: loading, identity, speaker names and write-back.

use crate::error::{CorrectionError, Result};
use crate::segment::Segment;
use serde_json::{Map, Value};
use sha1::{Digest, Sha1};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A diarized transcript as stored on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub segments: Vec<Segment>,
    /// Raw speaker label → display name.
    pub speaker_map: BTreeMap<String, String>,
    /// Other top-level keys; `None` when the file is a bare segment list.
    envelope: Option<Map<String, Value>>,
}

fn malformed(path: &Path, message: impl Into<String>) -> CorrectionError {
    CorrectionError::Transcript {
        path: path.display().to_string(),
        message: message.into(),
    }
}

fn parse_speaker_map(value: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(map)) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(label, name)| match name {
            Value::String(name) if !name.trim().is_empty() => Some((label.clone(), name.clone())),
            _ => None,
        })
        .collect()
}

impl Transcript {
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            speaker_map: BTreeMap::new(),
            envelope: None,
        }
    }

    /// Parse a transcript from JSON text; `path` is only used in errors.
    pub fn from_json_str(contents: &str, path: &Path) -> Result<Self> {
        let value: Value = serde_json::from_str(contents).map_err(|e| malformed(path, e.to_string()))?;
        match value {
            Value::Array(_) => {
                let segments = serde_json::from_value(value).map_err(|e| malformed(path, e.to_string()))?;
                Ok(Self::from_segments(segments))
            }
            Value::Object(mut object) => {
                let raw_segments = object
                    .remove("segments")
                    .ok_or_else(|| malformed(path, "missing `segments` list"))?;
                let segments: Vec<Segment> =
                    serde_json::from_value(raw_segments).map_err(|e| malformed(path, e.to_string()))?;
                let speaker_map = parse_speaker_map(object.get("speaker_map"));
                Ok(Self {
                    segments,
                    speaker_map,
                    envelope: Some(object),
                })
            }
            _ => Err(malformed(path, "expected an object or a list of segments")),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents, path)
    }

    /// Hash of every speaker and original text, stable across edits.
    pub fn key(&self) -> String {
        transcript_key(&self.segments)
    }

    /// Display names used for fuzzy matching and speaker trust.
    ///
    /// Mapped names when a speaker map exists, else the distinct raw labels
    /// in order of first appearance.
    pub fn speaker_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let names: Box<dyn Iterator<Item = &String>> = if self.speaker_map.is_empty() {
            Box::new(self.segments.iter().filter_map(|s| s.speaker.as_ref()))
        } else {
            Box::new(self.speaker_map.values())
        };
        names.filter(|n| seen.insert(n.as_str())).cloned().collect()
    }

    /// JSON form, preserving keys this engine does not interpret.
    pub fn to_json(&self) -> Result<Value> {
        let segments = serde_json::to_value(&self.segments)?;
        Ok(match &self.envelope {
            Some(envelope) => {
                let mut object = envelope.clone();
                object.insert("segments".to_string(), segments);
                Value::Object(object)
            }
            None => segments,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_json()?)?;
        fs::write(path, json)?;
        Ok(())
    }
}

pub fn transcript_key(segments: &[Segment]) -> String {
    let mut hasher = Sha1::new();
    for segment in segments {
        hasher.update(segment.speaker.as_deref().unwrap_or("").as_bytes());
        hasher.update("\u{1f}".as_bytes());
        hasher.update(segment.original_text().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// `<file>.backup_<YYYYmmdd_HHMMSS>` next to `path`.
pub fn backup_path(path: &Path, now: chrono::DateTime<chrono::Local>) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".backup_{}", now.format("%Y%m%d_%H%M%S")));
    path.with_file_name(name)
}

/// Copy `path` to a timestamped backup and return the backup's path.
pub fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup = backup_path(path, chrono::Local::now());
    fs::copy(path, &backup)?;
    info!(backup = %backup.display(), "Backed up transcript");
    Ok(backup)
}

/// Overwrite the transcript at `path`, backing it up first when asked.
///
/// The backup is taken before the rewrite, so a failed rewrite leaves a
/// known-good copy behind.
pub fn rewrite_with_backup(transcript: &Transcript, path: &Path, create_backup: bool) -> Result<Option<PathBuf>> {
    let backup = if create_backup { Some(backup_file(path)?) } else { None };
    transcript.save(path)?;
    info!(path = %path.display(), "Updated transcript file");
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_object_with_segments_and_speaker_map() {
        let file = write_temp(
            r#"{
                "title": "Weekly sync",
                "speaker_map": {"SPEAKER_00": "Alice", "SPEAKER_01": ""},
                "segments": [
                    {"speaker": "SPEAKER_00", "text": "hello", "start": 0.0, "end": 1.0}
                ]
            }"#,
        );
        let transcript = Transcript::load(file.path()).unwrap();
        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(transcript.speaker_map.len(), 1);
        assert_eq!(transcript.speaker_names(), vec!["Alice"]);

        let json = transcript.to_json().unwrap();
        assert_eq!(json["title"], "Weekly sync");
        assert_eq!(json["segments"][0]["text"], "hello");
    }

    #[test]
    fn loads_bare_segment_list() {
        let file = write_temp(r#"[{"speaker": "Bob", "text": "a"}, {"speaker": "Bob", "text": "b"}, {"text": "c"}]"#);
        let transcript = Transcript::load(file.path()).unwrap();
        assert_eq!(transcript.segments.len(), 3);
        assert_eq!(transcript.speaker_names(), vec!["Bob"]);
        assert!(transcript.to_json().unwrap().is_array());
    }

    #[test]
    fn malformed_transcript_is_reported() {
        let file = write_temp(r#"{"title": "no segments"}"#);
        assert!(matches!(
            Transcript::load(file.path()),
            Err(CorrectionError::Transcript { .. })
        ));
        let file = write_temp("not json");
        assert!(matches!(
            Transcript::load(file.path()),
            Err(CorrectionError::Transcript { .. })
        ));
    }

    #[test]
    fn key_ignores_edits() {
        let mut segments = vec![Segment::new(Some("Alice"), "Acmee")];
        let before = transcript_key(&segments);
        segments[0].set_text("Acme".to_string());
        assert_eq!(transcript_key(&segments), before);

        let other = vec![Segment::new(Some("Bob"), "Acmee")];
        assert_ne!(transcript_key(&other), before);
    }

    #[test]
    fn backup_name_has_timestamp_suffix() {
        let now = chrono::Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let path = backup_path(Path::new("/data/call.json"), now);
        assert_eq!(path, PathBuf::from("/data/call.json.backup_20260304_050607"));
    }

    #[test]
    fn rewrite_creates_backup_first() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("call.json");
        fs::write(&path, r#"{"segments": [{"speaker": "Alice", "text": "Acmee"}]}"#).unwrap();

        let mut transcript = Transcript::load(&path).unwrap();
        transcript.segments[0].set_text("Acme".to_string());
        let backup = rewrite_with_backup(&transcript, &path, true).unwrap().unwrap();

        assert!(fs::read_to_string(&backup).unwrap().contains("Acmee"));
        let rewritten = Transcript::load(&path).unwrap();
        assert_eq!(rewritten.segments[0].text(), "Acme");
        assert_eq!(rewritten.segments[0].original_text(), "Acmee");
    }
}
