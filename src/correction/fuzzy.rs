//! Fuzzy speaker-name matcher (opt-in).

use crate::correction::consistency::CAPITALIZED_TOKEN;
use crate::correction::detector::{Detector, occurrence_at};
use crate::correction::identity::resolve_segment_id;
use crate::correction::model::{Candidate, CandidateKind};
use crate::correction::similarity::ratio;
use crate::defaults;
use crate::error::Result;
use crate::segment::{Segment, is_named_speaker};
use tracing::debug;

struct Name {
    display: String,
    lower: String,
    first: Option<char>,
    len: usize,
}

/// Flags capitalized tokens that are a near miss of a named speaker.
pub struct FuzzyNameMatcher {
    names: Vec<Name>,
    threshold: f64,
    enabled: bool,
}

impl FuzzyNameMatcher {
    /// Placeholder labels such as `SPEAKER_01` are dropped from `speaker_names`.
    pub fn new(speaker_names: &[String], threshold: f64, enabled: bool) -> Self {
        let names = speaker_names
            .iter()
            .filter(|n| is_named_speaker(n))
            .map(|display| {
                let lower = display.to_lowercase();
                Name {
                    display: display.clone(),
                    first: lower.chars().next(),
                    len: lower.chars().count(),
                    lower,
                }
            })
            .collect();
        Self {
            names,
            threshold,
            enabled,
        }
    }
}

impl Detector for FuzzyNameMatcher {
    fn detect(&mut self, segments: &[Segment], transcript_key: &str) -> Result<Vec<Candidate>> {
        let mut candidates = Vec::new();
        if !self.enabled || self.names.is_empty() {
            return Ok(candidates);
        }

        for (index, segment) in segments.iter().enumerate() {
            let text = segment.text();
            let segment_id = resolve_segment_id(segment, transcript_key, Some(index));
            for m in CAPITALIZED_TOKEN.find_iter(text) {
                let token = m.as_str().to_lowercase();
                let token_len = token.chars().count();
                let token_first = token.chars().next();

                for name in &self.names {
                    if token_len.abs_diff(name.len) > defaults::MAX_LENGTH_DELTA || token_first != name.first {
                        continue;
                    }
                    if token == name.lower {
                        continue;
                    }
                    let score = ratio(&token, &name.lower);
                    if score < self.threshold {
                        continue;
                    }
                    candidates.push(Candidate::new(
                        CandidateKind::Fuzzy,
                        m.as_str(),
                        name.display.clone(),
                        score,
                        vec![occurrence_at(segment, &segment_id, m.start(), m.end())],
                    ));
                }
            }
        }

        debug!(count = candidates.len(), "Fuzzy name candidates");
        Ok(candidates)
    }

    fn name(&self) -> &str {
        "fuzzy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::model::Span;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn near_miss_of_speaker_name_is_flagged() {
        let mut detector = FuzzyNameMatcher::new(&names(&["Jonathan"]), 0.85, true);
        let segments = vec![Segment::new(Some("Alice"), "Thanks Jonathon for that.")];
        let candidates = detector.detect(&segments, "key").unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].proposed_wrong, "Jonathon");
        assert_eq!(candidates[0].proposed_right, "Jonathan");
        assert_eq!(candidates[0].kind, CandidateKind::Fuzzy);
        assert_eq!(candidates[0].occurrences[0].span, Some(Span::new(7, 15)));
    }

    #[test]
    fn disabled_matcher_finds_nothing() {
        let mut detector = FuzzyNameMatcher::new(&names(&["Jonathan"]), 0.85, false);
        let segments = vec![Segment::new(None, "Thanks Jonathon")];
        assert!(detector.detect(&segments, "key").unwrap().is_empty());
    }

    #[test]
    fn exact_name_is_not_a_candidate() {
        let mut detector = FuzzyNameMatcher::new(&names(&["Jonathan"]), 0.5, true);
        let segments = vec![Segment::new(None, "Thanks Jonathan")];
        assert!(detector.detect(&segments, "key").unwrap().is_empty());
    }

    #[test]
    fn placeholder_speakers_are_not_targets() {
        let mut detector = FuzzyNameMatcher::new(&names(&["SPEAKER_01", "Unknown"]), 0.1, true);
        let segments = vec![Segment::new(None, "Speaker Unknowns")];
        assert!(detector.detect(&segments, "key").unwrap().is_empty());
    }

    #[test]
    fn first_letter_must_agree() {
        let mut detector = FuzzyNameMatcher::new(&names(&["Karen"]), 0.5, true);
        let segments = vec![Segment::new(None, "Caren arrived")];
        assert!(detector.detect(&segments, "key").unwrap().is_empty());
    }

    #[test]
    fn default_threshold_rejects_loose_matches() {
        let mut detector = FuzzyNameMatcher::new(&names(&["Jonathan"]), 0.92, true);
        let segments = vec![Segment::new(None, "Thanks Jonathon")];
        // 0.875 < 0.92
        assert!(detector.detect(&segments, "key").unwrap().is_empty());
    }
}
