//! Conflict resolution and application of accepted candidates.
//!
//! Replacements are planned per segment, filtered by rule conditions and
//! speaker trust, ranked by (longest span, confidence, kind priority,
//! leftmost start) and accepted greedily without overlap. Accepted
//! replacements are spliced right-to-left so earlier offsets stay valid.

use crate::correction::detector::find_bounded;
use crate::correction::identity::resolve_segment_id;
use crate::correction::model::{
    Candidate, CandidateKind, CorrectionRule, Decision, DecisionAction, Occurrence, RuleType, Span,
};
use crate::correction::patch_log::{
    Clock, ConflictRef, PatchLog, PatchOutcome, PatchRecord, Replacement,
};
use crate::segment::{Segment, is_named_speaker, is_unidentified_speaker};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

const NO_SPAN_REASON: &str = "occurrence has no span; apply_some requires span";
const CONFLICT_REASON: &str = "overlaps a higher-priority replacement";

/// Which occurrences of a candidate a decision accepted.
enum Selection<'d> {
    All,
    Some(HashSet<&'d str>),
}

fn selections(decisions: &[Decision]) -> HashMap<&str, Selection<'_>> {
    let mut map = HashMap::new();
    for decision in decisions {
        match decision.decision {
            DecisionAction::ApplyAll => {
                map.insert(decision.candidate_id.as_str(), Selection::All);
            }
            DecisionAction::ApplySome => {
                let ids = decision
                    .selected_occurrence_ids
                    .iter()
                    .flatten()
                    .map(String::as_str)
                    .collect();
                map.insert(decision.candidate_id.as_str(), Selection::Some(ids));
            }
            DecisionAction::Reject => {}
        }
    }
    map
}

#[derive(Debug, Clone)]
struct Planned<'c> {
    candidate: &'c Candidate,
    span: Span,
    wrong: String,
}

impl Planned<'_> {
    fn rule_id(&self) -> Option<String> {
        self.candidate.rule_id().map(str::to_string)
    }

    fn replacement(&self, span_after: Option<Span>) -> Replacement {
        Replacement {
            wrong: self.wrong.clone(),
            right: self.candidate.proposed_right.clone(),
            span_before: self.span,
            span_after,
            candidate_id: self.candidate.candidate_id.clone(),
            rule_id: self.rule_id(),
        }
    }

    fn conflict_ref(&self) -> ConflictRef {
        ConflictRef {
            span: self.span,
            candidate_id: self.candidate.candidate_id.clone(),
            rule_id: self.rule_id(),
            kind: self.candidate.kind.as_str().to_string(),
            confidence: self.candidate.confidence,
        }
    }
}

/// Ranking for overlap resolution; `Less` wins.
fn rank(a: &Planned<'_>, b: &Planned<'_>) -> Ordering {
    b.span
        .len()
        .cmp(&a.span.len())
        .then_with(|| b.candidate.confidence.total_cmp(&a.candidate.confidence))
        .then_with(|| b.candidate.kind.priority().cmp(&a.candidate.kind.priority()))
        .then_with(|| a.span.start.cmp(&b.span.start))
}

/// Whether the segment satisfies the rule's applicability conditions.
fn conditions_allow(rule: &CorrectionRule, segment: &Segment) -> bool {
    let Some(conditions) = &rule.conditions else {
        return true;
    };
    let text = segment.text();

    if let Some(speaker) = conditions.speaker.as_deref()
        && !speaker.is_empty()
        && segment.speaker.as_deref() != Some(speaker)
    {
        return false;
    }

    if let Some(min) = conditions.min_token_len
        && text.split_whitespace().count() < min
    {
        return false;
    }

    let terms: Vec<&str> = conditions
        .context_any
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return true;
    }
    terms.iter().any(|term| {
        if conditions.word_boundary {
            !find_bounded(text, term, conditions.case_sensitive).is_empty()
        } else if conditions.case_sensitive {
            text.contains(term)
        } else {
            text.to_lowercase().contains(&term.to_lowercase())
        }
    })
}

/// Rules that rename people are not trusted on unconfirmed speakers.
fn is_person_rule(rule: &CorrectionRule) -> bool {
    match rule.is_person_name {
        Some(flag) => flag,
        None => matches!(rule.rule_type, RuleType::Token | RuleType::Phrase) && is_named_speaker(&rule.right),
    }
}

/// Applies accepted candidates to segments and records a patch log.
pub struct Applier<'a> {
    rules: &'a BTreeMap<String, CorrectionRule>,
    speaker_map: Option<&'a BTreeMap<String, String>>,
    clock: &'a dyn Clock,
}

impl<'a> Applier<'a> {
    pub fn new(rules: &'a BTreeMap<String, CorrectionRule>, clock: &'a dyn Clock) -> Self {
        Self {
            rules,
            speaker_map: None,
            clock,
        }
    }

    /// Resolve raw speaker labels to display names before the trust check.
    pub fn with_speaker_map(mut self, speaker_map: &'a BTreeMap<String, String>) -> Self {
        self.speaker_map = Some(speaker_map);
        self
    }

    fn rule_for(&self, candidate: &Candidate) -> Option<&'a CorrectionRule> {
        candidate.rule_id().and_then(|id| self.rules.get(id))
    }

    fn speaker_is_unidentified(&self, segment: &Segment) -> bool {
        let raw = segment.speaker.as_deref();
        let display = raw
            .and_then(|s| self.speaker_map.and_then(|map| map.get(s)))
            .map(String::as_str)
            .or(raw);
        is_unidentified_speaker(display)
    }

    fn record(
        &self,
        segment: &Segment,
        segment_id: &str,
        candidate: &Candidate,
        before: &str,
        after: &str,
        outcome: PatchOutcome,
    ) -> PatchRecord {
        PatchRecord {
            timestamp: self.clock.now(),
            rule_id: candidate.rule_id().map(str::to_string),
            candidate_id: candidate.candidate_id.clone(),
            segment_id: segment_id.to_string(),
            speaker: segment.speaker.clone(),
            time_start: segment.start_secs(),
            time_end: segment.end_secs(),
            before: before.to_string(),
            after: after.to_string(),
            outcome,
        }
    }

    /// Apply `candidates` to `segments` in place.
    ///
    /// With `decisions` present only candidates with an apply decision are
    /// eligible; without them every candidate is (rule-driven auto-apply).
    /// Data problems are recorded in the returned log, never raised.
    pub fn apply(
        &self,
        segments: &mut [Segment],
        candidates: &[Candidate],
        transcript_key: &str,
        decisions: Option<&[Decision]>,
    ) -> PatchLog {
        let selection_map = decisions.map(selections);
        let mut log = PatchLog::new();

        let mut by_segment: HashMap<&str, Vec<(&Candidate, &Occurrence)>> = HashMap::new();
        for candidate in candidates {
            for occurrence in &candidate.occurrences {
                by_segment
                    .entry(occurrence.segment_id.as_str())
                    .or_default()
                    .push((candidate, occurrence));
            }
        }

        for (index, segment) in segments.iter_mut().enumerate() {
            let segment_id = resolve_segment_id(segment, transcript_key, Some(index));
            let Some(pending) = by_segment.get(segment_id.as_str()) else {
                continue;
            };
            let text = segment.text().to_string();

            let mut planned: Vec<Planned<'_>> = Vec::new();
            let mut allowed: HashMap<&str, bool> = HashMap::new();
            for &(candidate, occurrence) in pending {
                let selection = match &selection_map {
                    Some(map) => match map.get(candidate.candidate_id.as_str()) {
                        Some(selection) => Some(selection),
                        None => continue,
                    },
                    None => None,
                };

                let permitted = *allowed.entry(candidate.candidate_id.as_str()).or_insert_with(|| {
                    self.rule_for(candidate).is_none_or(|rule| conditions_allow(rule, segment))
                });
                if !permitted {
                    continue;
                }

                let subset = match selection {
                    Some(Selection::Some(ids)) => Some(ids),
                    Some(Selection::All) | None => None,
                };

                if let Some(ids) = subset {
                    let replayable = occurrence
                        .span
                        .and_then(|span| text.get(span.start..span.end))
                        .is_some_and(|current| current == candidate.proposed_wrong);
                    if !ids.contains(occurrence.occurrence_id.as_str()) && !replayable {
                        continue;
                    }
                }

                let Some(span) = occurrence.span else {
                    if subset.is_some() {
                        log.push(self.record(
                            segment,
                            &segment_id,
                            candidate,
                            &text,
                            &text,
                            PatchOutcome::SkippedNoSpan {
                                reason: NO_SPAN_REASON.to_string(),
                            },
                        ));
                        continue;
                    }
                    if candidate.proposed_wrong.is_empty() || candidate.proposed_wrong == candidate.proposed_right {
                        continue;
                    }
                    for (start, matched) in text.match_indices(candidate.proposed_wrong.as_str()) {
                        planned.push(Planned {
                            candidate,
                            span: Span::new(start, start + matched.len()),
                            wrong: matched.to_string(),
                        });
                    }
                    continue;
                };

                let Some(current) = text.get(span.start..span.end) else {
                    debug!(segment_id = %segment_id, ?span, "Span outside current text");
                    continue;
                };
                if span.is_empty() || occurrence.matched.as_deref().is_some_and(|m| m != current) {
                    debug!(segment_id = %segment_id, ?span, "Stale span");
                    continue;
                }
                if current == candidate.proposed_right {
                    continue;
                }
                planned.push(Planned {
                    candidate,
                    span,
                    wrong: current.to_string(),
                });
            }

            let mut seen = HashSet::new();
            planned.retain(|p| seen.insert((p.candidate.candidate_id.as_str(), p.span)));

            if self.speaker_is_unidentified(segment) {
                planned.retain(|p| match self.rule_for(p.candidate) {
                    Some(rule) => !is_person_rule(rule),
                    None => !matches!(p.candidate.kind, CandidateKind::Consistency | CandidateKind::Fuzzy),
                });
            }
            if planned.is_empty() {
                continue;
            }

            planned.sort_by(rank);
            let mut accepted: Vec<Planned<'_>> = Vec::new();
            for plan in planned {
                let conflicts: Vec<ConflictRef> = accepted
                    .iter()
                    .filter(|a| a.span.overlaps(&plan.span))
                    .map(Planned::conflict_ref)
                    .collect();
                if conflicts.is_empty() {
                    accepted.push(plan);
                    continue;
                }
                debug!(
                    segment_id = %segment_id,
                    candidate_id = %plan.candidate.candidate_id,
                    "Conflicting replacement skipped"
                );
                log.push(self.record(
                    segment,
                    &segment_id,
                    plan.candidate,
                    &text,
                    &text,
                    PatchOutcome::ConflictSkipped {
                        reason: CONFLICT_REASON.to_string(),
                        conflicts_with: conflicts,
                        replacements: vec![plan.replacement(None)],
                    },
                ));
            }

            let Some(winner) = accepted.first().map(|p| p.candidate) else {
                continue;
            };

            let mut updated = text.clone();
            let mut right_to_left: Vec<&Planned<'_>> = accepted.iter().collect();
            right_to_left.sort_by(|a, b| b.span.start.cmp(&a.span.start));
            for plan in &right_to_left {
                updated.replace_range(plan.span.start..plan.span.end, &plan.candidate.proposed_right);
            }

            let mut replacements = Vec::with_capacity(accepted.len());
            let mut shift: isize = 0;
            for plan in right_to_left.iter().rev() {
                let right_len = plan.candidate.proposed_right.len();
                let start = plan.span.start.saturating_add_signed(shift);
                replacements.push(plan.replacement(Some(Span::new(start, start + right_len))));
                shift += right_len as isize - plan.span.len() as isize;
            }

            let record = self.record(
                segment,
                &segment_id,
                winner,
                &text,
                &updated,
                PatchOutcome::Applied { replacements },
            );
            segment.set_text(updated);
            log.push(record);
        }

        info!(applied = log.applied_count(), "Corrections applied");
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::model::{Decision, RuleConditions};
    use crate::correction::patch_log::{FixedClock, PatchLogEntry};

    const KEY: &str = "key";

    fn clock() -> FixedClock {
        FixedClock("2026-01-01T00:00:00Z".into())
    }

    fn segment_id(segments: &[Segment], index: usize) -> String {
        resolve_segment_id(&segments[index], KEY, Some(index))
    }

    fn candidate_at(
        segments: &[Segment],
        kind: CandidateKind,
        start: usize,
        end: usize,
        right: &str,
        confidence: f64,
    ) -> Candidate {
        let text = segments[0].text();
        let mut occurrence = Occurrence::new(segment_id(segments, 0), Some(Span::new(start, end)), text);
        occurrence.matched = Some(text[start..end].to_string());
        Candidate::new(kind, &text[start..end], right, confidence, vec![occurrence])
    }

    fn applied_records(log: &PatchLog) -> Vec<&PatchRecord> {
        log.records().filter(|r| r.is_applied()).collect()
    }

    #[test]
    fn longer_span_beats_higher_confidence() {
        let mut segments = vec![Segment::new(Some("Alice"), "We said abcdefghijklmn here")];
        let long = candidate_at(&segments, CandidateKind::Acronym, 8, 19, "LONG", 0.9);
        let short = candidate_at(&segments, CandidateKind::Acronym, 10, 15, "SHORT", 0.95);
        let rules = BTreeMap::new();
        let clock = clock();
        let log = Applier::new(&rules, &clock).apply(&mut segments, &[short.clone(), long.clone()], KEY, None);

        assert_eq!(segments[0].text(), "We said LONGlmn here");
        let conflict = log
            .records()
            .find(|r| matches!(r.outcome, PatchOutcome::ConflictSkipped { .. }))
            .unwrap();
        assert_eq!(conflict.candidate_id, short.candidate_id);
        let PatchOutcome::ConflictSkipped { conflicts_with, .. } = &conflict.outcome else {
            unreachable!()
        };
        assert_eq!(conflicts_with[0].candidate_id, long.candidate_id);
        assert_eq!(conflicts_with[0].span, Span::new(8, 19));
    }

    #[test]
    fn equal_spans_tie_break_on_confidence_then_kind_then_position() {
        let text = "Call Jonathon now";
        let base = vec![Segment::new(Some("Alice"), text)];

        let rules = BTreeMap::new();
        let clock = clock();

        let low = candidate_at(&base, CandidateKind::Acronym, 5, 13, "LOW", 0.6);
        let high = candidate_at(&base, CandidateKind::Acronym, 5, 13, "HIGH", 0.7);
        let mut segments = base.clone();
        Applier::new(&rules, &clock).apply(&mut segments, &[low, high], KEY, None);
        assert_eq!(segments[0].text(), "Call HIGH now");

        let acronym = candidate_at(&base, CandidateKind::Acronym, 5, 13, "ACRONYM", 0.8);
        let memory = candidate_at(
            &base,
            CandidateKind::MemoryHit {
                rule_id: "missing".into(),
            },
            5,
            13,
            "MEMORY",
            0.8,
        );
        let mut segments = base.clone();
        Applier::new(&rules, &clock).apply(&mut segments, &[acronym, memory], KEY, None);
        assert_eq!(segments[0].text(), "Call MEMORY now");

        // "ll J" [2,6) and "l Jo" [3,7): same length, confidence and kind
        let left = candidate_at(&base, CandidateKind::Acronym, 2, 6, "X", 0.8);
        let right = candidate_at(&base, CandidateKind::Acronym, 3, 7, "Y", 0.8);
        let mut segments = base.clone();
        Applier::new(&rules, &clock).apply(&mut segments, &[right, left], KEY, None);
        assert_eq!(segments[0].text(), "CaXonathon now");
    }

    #[test]
    fn non_overlapping_replacements_apply_right_to_left() {
        let mut segments = vec![Segment::new(Some("Alice"), "aa bb cc")];
        let first = candidate_at(&segments, CandidateKind::Acronym, 0, 2, "AAAA", 0.8);
        let second = candidate_at(&segments, CandidateKind::Acronym, 3, 5, "B", 0.8);
        let third = candidate_at(&segments, CandidateKind::Acronym, 6, 8, "CCC", 0.8);
        let rules = BTreeMap::new();
        let clock = clock();
        let log = Applier::new(&rules, &clock).apply(&mut segments, &[first, second, third], KEY, None);

        assert_eq!(segments[0].text(), "AAAA B CCC");
        let records = applied_records(&log);
        assert_eq!(records.len(), 1);
        let PatchOutcome::Applied { replacements } = &records[0].outcome else {
            unreachable!()
        };
        let after: Vec<_> = replacements.iter().map(|r| r.span_after.unwrap()).collect();
        assert_eq!(after, vec![Span::new(0, 4), Span::new(5, 6), Span::new(7, 10)]);
        for (replacement, span) in replacements.iter().zip(&after) {
            assert_eq!(&segments[0].text()[span.start..span.end], replacement.right);
        }
    }

    #[test]
    fn missing_span_with_apply_all_scans_literally() {
        let mut segments = vec![Segment::new(Some("Alice"), "Acmee and Acmee")];
        let id = segment_id(&segments, 0);
        let candidate = Candidate::new(
            CandidateKind::Acronym,
            "Acmee",
            "Acme",
            0.9,
            vec![Occurrence::new(id, None, "Acmee and Acmee")],
        );
        let decisions = vec![Decision::apply_all(candidate.candidate_id.clone())];
        let rules = BTreeMap::new();
        let clock = clock();
        Applier::new(&rules, &clock).apply(&mut segments, &[candidate], KEY, Some(&decisions));
        assert_eq!(segments[0].text(), "Acme and Acme");
    }

    #[test]
    fn missing_span_with_apply_some_is_logged() {
        let mut segments = vec![Segment::new(Some("Alice"), "Acmee here")];
        let id = segment_id(&segments, 0);
        let occurrence = Occurrence::new(id, None, "Acmee here");
        let selected = vec![occurrence.occurrence_id.clone()];
        let candidate = Candidate::new(CandidateKind::Acronym, "Acmee", "Acme", 0.9, vec![occurrence]);
        let decisions = vec![Decision::apply_some(candidate.candidate_id.clone(), selected)];
        let rules = BTreeMap::new();
        let clock = clock();
        let log = Applier::new(&rules, &clock).apply(&mut segments, &[candidate], KEY, Some(&decisions));

        assert_eq!(segments[0].text(), "Acmee here");
        assert!(!segments[0].is_edited());
        let record = log.records().next().unwrap();
        assert!(matches!(record.outcome, PatchOutcome::SkippedNoSpan { .. }));
        assert_eq!(record.before, record.after);
        assert_eq!(log.applied_count(), 0);
    }

    #[test]
    fn rejected_and_undecided_candidates_are_skipped() {
        let mut segments = vec![Segment::new(Some("Alice"), "aa bb")];
        let a = candidate_at(&segments, CandidateKind::Acronym, 0, 2, "AA", 0.8);
        let b = candidate_at(&segments, CandidateKind::Acronym, 3, 5, "BB", 0.8);
        let decisions = vec![Decision::reject(a.candidate_id.clone())];
        let rules = BTreeMap::new();
        let clock = clock();
        let log = Applier::new(&rules, &clock).apply(&mut segments, &[a, b], KEY, Some(&decisions));
        assert_eq!(segments[0].text(), "aa bb");
        assert_eq!(log.entries().len(), 1);
        assert!(matches!(log.entries()[0], PatchLogEntry::Header(_)));
    }

    #[test]
    fn stale_span_is_not_applied() {
        let mut segments = vec![Segment::new(Some("Alice"), "We use Kubernettes here.")];
        let candidate = candidate_at(&segments, CandidateKind::Acronym, 7, 18, "Kubernetes", 0.9);
        segments[0].set_text("We now use Kubernettes.".to_string());
        let rules = BTreeMap::new();
        let clock = clock();
        Applier::new(&rules, &clock).apply(&mut segments, &[candidate], KEY, None);
        assert_eq!(segments[0].text(), "We now use Kubernettes.");
    }

    #[test]
    fn unidentified_speaker_drops_unruled_name_fixes() {
        let mut segments = vec![Segment::new(Some("SPEAKER_03"), "Thanks Jonathon")];
        let fuzzy = candidate_at(&segments, CandidateKind::Fuzzy, 7, 15, "Jonathan", 0.95);
        let decisions = vec![Decision::apply_all(fuzzy.candidate_id.clone())];
        let rules = BTreeMap::new();
        let clock = clock();
        let log = Applier::new(&rules, &clock).apply(&mut segments, &[fuzzy], KEY, Some(&decisions));
        assert_eq!(segments[0].text(), "Thanks Jonathon");
        assert_eq!(log.applied_count(), 0);
    }

    #[test]
    fn speaker_map_confirms_speaker() {
        let mut segments = vec![Segment::new(Some("SPEAKER_03"), "Thanks Jonathon")];
        let fuzzy = candidate_at(&segments, CandidateKind::Fuzzy, 7, 15, "Jonathan", 0.95);
        let rules = BTreeMap::new();
        let mut speaker_map = BTreeMap::new();
        speaker_map.insert("SPEAKER_03".to_string(), "Maria".to_string());
        let clock = clock();
        Applier::new(&rules, &clock)
            .with_speaker_map(&speaker_map)
            .apply(&mut segments, &[fuzzy], KEY, None);
        assert_eq!(segments[0].text(), "Thanks Jonathan");
    }

    #[test]
    fn person_rules_are_filtered_but_others_survive() {
        let mut segments = vec![Segment::new(None, "Jon uses Kubernettes")];
        let person = CorrectionRule::new(RuleType::Token, vec!["Jon".into()], "John").with_person_name(true);
        let tool = CorrectionRule::new(RuleType::Token, vec!["Kubernettes".into()], "Kubernetes")
            .with_person_name(false);
        let mut rules = BTreeMap::new();
        rules.insert(person.id.clone(), person.clone());
        rules.insert(tool.id.clone(), tool.clone());

        let a = candidate_at(&segments, CandidateKind::MemoryHit { rule_id: person.id.clone() }, 0, 3, "John", 0.9);
        let b = candidate_at(&segments, CandidateKind::MemoryHit { rule_id: tool.id.clone() }, 9, 20, "Kubernetes", 0.9);
        let clock = clock();
        Applier::new(&rules, &clock).apply(&mut segments, &[a, b], KEY, None);
        assert_eq!(segments[0].text(), "Jon uses Kubernetes");
    }

    #[test]
    fn legacy_rule_infers_person_name_from_right() {
        let legacy = CorrectionRule::new(RuleType::Token, vec!["Jon".into()], "John");
        assert!(is_person_rule(&legacy));
        let acronym = CorrectionRule::new(RuleType::Acronym, vec!["CSE".into()], "CSE");
        assert!(!is_person_rule(&acronym));
    }

    #[test]
    fn rule_conditions_gate_segments() {
        let mut segments = vec![
            Segment::new(Some("Alice"), "the ren report"),
            Segment::new(Some("Bob"), "the ren report"),
            Segment::new(Some("Alice"), "ren"),
        ];
        let rule = CorrectionRule::new(RuleType::Token, vec!["ren".into()], "REN21")
            .with_person_name(false)
            .with_conditions(RuleConditions {
                speaker: Some("Alice".into()),
                min_token_len: Some(2),
                context_any: vec!["report".into()],
                ..RuleConditions::default()
            });
        let mut rules = BTreeMap::new();
        rules.insert(rule.id.clone(), rule.clone());

        let occurrences = (0..segments.len())
            .map(|i| {
                let text = segments[i].text();
                let start = text.find("ren").unwrap();
                let mut o = Occurrence::new(segment_id(&segments, i), Some(Span::new(start, start + 3)), text);
                o.matched = Some("ren".into());
                o
            })
            .collect();
        let candidate = Candidate::new(
            CandidateKind::MemoryHit { rule_id: rule.id.clone() },
            "ren",
            "REN21",
            0.9,
            occurrences,
        );
        let clock = clock();
        Applier::new(&rules, &clock).apply(&mut segments, &[candidate], KEY, None);

        assert_eq!(segments[0].text(), "the REN21 report");
        assert_eq!(segments[1].text(), "the ren report");
        assert_eq!(segments[2].text(), "ren");
    }

    #[test]
    fn applied_entry_is_attributed_to_winning_candidate() {
        let mut segments = vec![Segment::new(Some("Alice"), "aa bbbb")];
        let small = candidate_at(&segments, CandidateKind::Acronym, 0, 2, "A", 0.9);
        let big = candidate_at(&segments, CandidateKind::Acronym, 3, 7, "B", 0.5);
        let rules = BTreeMap::new();
        let clock = clock();
        let log = Applier::new(&rules, &clock).apply(&mut segments, &[small, big.clone()], KEY, None);
        assert_eq!(applied_records(&log)[0].candidate_id, big.candidate_id);
    }

    #[test]
    fn text_already_matching_the_fix_is_left_alone() {
        let mut segments = vec![Segment::new(Some("Alice"), "the CSE team")];
        let candidate = candidate_at(&segments, CandidateKind::Acronym, 4, 7, "CSE", 0.9);
        let rules = BTreeMap::new();
        let clock = clock();
        let log = Applier::new(&rules, &clock).apply(&mut segments, &[candidate], KEY, None);
        assert!(!segments[0].is_edited());
        assert_eq!(log.applied_count(), 0);
    }
}
