//! Acronym matcher: spaced letter runs and known organization phrases.

use crate::correction::detector::{Detector, find_bounded, occurrence_at};
use crate::correction::identity::resolve_segment_id;
use crate::correction::model::{Candidate, CandidateKind};
use crate::defaults;
use crate::error::Result;
use crate::segment::Segment;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use tracing::debug;

static SPACED_LETTERS: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: hardcoded pattern — always valid
    #[allow(clippy::expect_used)]
    Regex::new(r"\b(?:[A-Za-z]\s+)+[A-Za-z]\b").expect("hardcoded spaced-letter pattern")
});

/// Collapses "c s e" into a known acronym and maps spoken organization
/// phrases onto their canonical spelling.
pub struct AcronymMatcher {
    acronyms: HashSet<String>,
    /// canonical → lowercased phrases
    org_phrases: BTreeMap<String, Vec<String>>,
}

impl AcronymMatcher {
    pub fn new(known_acronyms: &[String], known_org_phrases: &BTreeMap<String, Vec<String>>) -> Self {
        Self {
            acronyms: known_acronyms.iter().map(|a| a.to_uppercase()).collect(),
            org_phrases: known_org_phrases
                .iter()
                .map(|(canonical, phrases)| {
                    let phrases = phrases
                        .iter()
                        .filter(|p| !p.trim().is_empty())
                        .map(|p| p.to_lowercase())
                        .collect();
                    (canonical.clone(), phrases)
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.acronyms.is_empty() && self.org_phrases.is_empty()
    }
}

impl Detector for AcronymMatcher {
    fn detect(&mut self, segments: &[Segment], transcript_key: &str) -> Result<Vec<Candidate>> {
        let mut candidates = Vec::new();
        if self.is_empty() {
            return Ok(candidates);
        }

        for (index, segment) in segments.iter().enumerate() {
            let text = segment.text();
            let segment_id = resolve_segment_id(segment, transcript_key, Some(index));

            if !self.acronyms.is_empty() {
                for m in SPACED_LETTERS.find_iter(text) {
                    let letters: String = m
                        .as_str()
                        .chars()
                        .filter(char::is_ascii_alphabetic)
                        .collect::<String>()
                        .to_uppercase();
                    if !self.acronyms.contains(&letters) {
                        continue;
                    }
                    candidates.push(Candidate::new(
                        CandidateKind::Acronym,
                        m.as_str(),
                        letters,
                        defaults::ACRONYM_LETTERS_CONFIDENCE,
                        vec![occurrence_at(segment, &segment_id, m.start(), m.end())],
                    ));
                }
            }

            for (canonical, phrases) in &self.org_phrases {
                for phrase in phrases {
                    for (start, end) in find_bounded(text, phrase, false) {
                        candidates.push(Candidate::new(
                            CandidateKind::Acronym,
                            &text[start..end],
                            canonical.clone(),
                            defaults::ORG_PHRASE_CONFIDENCE,
                            vec![occurrence_at(segment, &segment_id, start, end)],
                        ));
                    }
                }
            }
        }

        debug!(count = candidates.len(), "Acronym candidates");
        Ok(candidates)
    }

    fn name(&self) -> &str {
        "acronym"
    }
}
