//! Merge candidates that propose the same correction.

use crate::correction::model::{Candidate, ConditionsSignature, CorrectionRule, Span};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

#[derive(Debug, PartialEq, Eq, Hash)]
struct DedupeKey {
    kind: &'static str,
    wrong: String,
    right: String,
    conditions: Option<ConditionsSignature>,
}

fn key_for(candidate: &Candidate, rules: &BTreeMap<String, CorrectionRule>) -> DedupeKey {
    let conditions = candidate
        .rule_id()
        .and_then(|id| rules.get(id))
        .and_then(CorrectionRule::conditions_signature);
    DedupeKey {
        kind: candidate.kind.as_str(),
        wrong: candidate.proposed_wrong.to_lowercase(),
        right: candidate.proposed_right.to_lowercase(),
        conditions,
    }
}

fn merge_into(existing: &mut Candidate, incoming: Candidate) {
    existing.confidence = existing.confidence.max(incoming.confidence);
    let mut seen: HashSet<(String, Option<Span>)> = existing
        .occurrences
        .iter()
        .map(|o| (o.segment_id.clone(), o.span))
        .collect();
    for occurrence in incoming.occurrences {
        if seen.insert((occurrence.segment_id.clone(), occurrence.span)) {
            existing.occurrences.push(occurrence);
        }
    }
}

/// Collapse candidates sharing (kind, wrong, right, rule conditions).
///
/// The first candidate of each group keeps its id and strings; it takes the
/// highest confidence and the union of occurrences. Group order follows
/// first appearance.
pub fn dedupe_candidates(
    candidates: Vec<Candidate>,
    rules: &BTreeMap<String, CorrectionRule>,
) -> Vec<Candidate> {
    let before = candidates.len();
    let mut merged: Vec<Candidate> = Vec::with_capacity(before);
    let mut index_of: HashMap<DedupeKey, usize> = HashMap::new();

    for candidate in candidates {
        let key = key_for(&candidate, rules);
        match index_of.get(&key) {
            Some(&i) => merge_into(&mut merged[i], candidate),
            None => {
                index_of.insert(key, merged.len());
                merged.push(candidate);
            }
        }
    }

    if merged.len() < before {
        debug!(before, after = merged.len(), "Merged duplicate candidates");
    }
    merged
}
