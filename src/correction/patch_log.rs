//! Audit trail of every edit, conflict and skip made by the applier.

use crate::correction::model::Span;
use crate::defaults;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source of patch-log timestamps.
pub trait Clock {
    /// ISO-8601 UTC timestamp.
    fn now(&self) -> String;
}

/// Wall-clock UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

/// Always returns the same timestamp; for reproducible logs.
#[derive(Debug, Clone)]
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn now(&self) -> String {
        self.0.clone()
    }
}

/// First entry of every log: which resolution algorithm produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyHeader {
    pub resolution_policy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replacement {
    pub wrong: String,
    pub right: String,
    pub span_before: Span,
    /// Position in the final text; absent when the replacement was not applied.
    pub span_after: Option<Span>,
    pub candidate_id: String,
    #[serde(default)]
    pub rule_id: Option<String>,
}

/// An accepted replacement that blocked a conflicting one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRef {
    pub span: Span,
    pub candidate_id: String,
    #[serde(default)]
    pub rule_id: Option<String>,
    pub kind: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatchOutcome {
    Applied {
        replacements: Vec<Replacement>,
    },
    ConflictSkipped {
        reason: String,
        conflicts_with: Vec<ConflictRef>,
        replacements: Vec<Replacement>,
    },
    SkippedNoSpan {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub timestamp: String,
    pub rule_id: Option<String>,
    pub candidate_id: String,
    pub segment_id: String,
    pub speaker: Option<String>,
    pub time_start: Option<f64>,
    pub time_end: Option<f64>,
    pub before: String,
    pub after: String,
    #[serde(flatten)]
    pub outcome: PatchOutcome,
}

impl PatchRecord {
    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, PatchOutcome::Applied { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchLogEntry {
    Header(PolicyHeader),
    Record(PatchRecord),
}

/// Ordered patch log that always starts with the policy header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchLog {
    entries: Vec<PatchLogEntry>,
}

impl Default for PatchLog {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchLog {
    pub fn new() -> Self {
        Self {
            entries: vec![PatchLogEntry::Header(PolicyHeader {
                resolution_policy: defaults::RESOLUTION_POLICY.to_string(),
            })],
        }
    }

    pub fn push(&mut self, record: PatchRecord) {
        self.entries.push(PatchLogEntry::Record(record));
    }

    pub fn entries(&self) -> &[PatchLogEntry] {
        &self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &PatchRecord> {
        self.entries.iter().filter_map(|entry| match entry {
            PatchLogEntry::Record(record) => Some(record),
            PatchLogEntry::Header(_) => None,
        })
    }

    /// Entries that mutated a segment.
    pub fn applied_count(&self) -> usize {
        self.records().filter(|r| r.is_applied()).count()
    }

    /// Applied entries per rule id, with `"unruled"` for detector-only fixes.
    pub fn counts_by_rule(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in self.records().filter(|r| r.is_applied()) {
            let key = record.rule_id.clone().unwrap_or_else(|| "unruled".to_string());
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rule_id: Option<&str>, outcome: PatchOutcome) -> PatchRecord {
        PatchRecord {
            timestamp: "2026-01-01T00:00:00Z".into(),
            rule_id: rule_id.map(str::to_string),
            candidate_id: "cand".into(),
            segment_id: "seg".into(),
            speaker: Some("Alice".into()),
            time_start: Some(1.0),
            time_end: None,
            before: "a".into(),
            after: "b".into(),
            outcome,
        }
    }

    fn applied() -> PatchOutcome {
        PatchOutcome::Applied {
            replacements: vec![Replacement {
                wrong: "a".into(),
                right: "b".into(),
                span_before: Span::new(0, 1),
                span_after: Some(Span::new(0, 1)),
                candidate_id: "cand".into(),
                rule_id: None,
            }],
        }
    }

    #[test]
    fn new_log_starts_with_header() {
        let log = PatchLog::new();
        assert_eq!(log.entries().len(), 1);
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(
            json[0]["resolution_policy"],
            "longest_span > confidence > kind_priority > left_to_right"
        );
    }

    #[test]
    fn counts_exclude_header_and_skips() {
        let mut log = PatchLog::new();
        log.push(record(Some("r1"), applied()));
        log.push(record(Some("r1"), applied()));
        log.push(record(None, applied()));
        log.push(record(
            Some("r2"),
            PatchOutcome::SkippedNoSpan {
                reason: "no span".into(),
            },
        ));
        log.push(record(
            Some("r3"),
            PatchOutcome::ConflictSkipped {
                reason: "overlap".into(),
                conflicts_with: Vec::new(),
                replacements: Vec::new(),
            },
        ));

        assert_eq!(log.applied_count(), 3);
        let counts = log.counts_by_rule();
        assert_eq!(counts.get("r1"), Some(&2));
        assert_eq!(counts.get("unruled"), Some(&1));
        assert!(!counts.contains_key("r2"));
        assert!(!counts.contains_key("r3"));
    }

    #[test]
    fn status_is_flattened_into_record() {
        let json = serde_json::to_value(record(
            None,
            PatchOutcome::SkippedNoSpan {
                reason: "occurrence has no span".into(),
            },
        ))
        .unwrap();
        assert_eq!(json["status"], "skipped_no_span");
        assert_eq!(json["reason"], "occurrence has no span");
        assert_eq!(json["segment_id"], "seg");
    }

    #[test]
    fn log_round_trips_through_json() {
        let mut log = PatchLog::new();
        log.push(record(Some("r1"), applied()));
        let text = serde_json::to_string(&log).unwrap();
        let back: PatchLog = serde_json::from_str(&text).unwrap();
        assert_eq!(back, log);
        assert!(matches!(back.entries()[0], PatchLogEntry::Header(_)));
    }

    #[test]
    fn fixed_clock_is_stable() {
        let clock = FixedClock("2026-01-01T00:00:00Z".into());
        assert_eq!(clock.now(), clock.now());
        assert!(SystemClock.now().ends_with('Z'));
    }
}
