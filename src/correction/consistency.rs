//! Consistency clusterer: collapses rare spellings of a capitalized token
//! into the spelling the transcript uses most.

use crate::correction::detector::{Detector, occurrence_at};
use crate::correction::identity::resolve_segment_id;
use crate::correction::model::{Candidate, CandidateKind, Occurrence};
use crate::correction::similarity::ratio;
use crate::defaults;
use crate::error::Result;
use crate::segment::Segment;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;
use tracing::debug;

pub(crate) static CAPITALIZED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: hardcoded pattern — always valid
    #[allow(clippy::expect_used)]
    Regex::new(r"\b[A-Z][A-Za-z0-9]+\b").expect("hardcoded capitalized-token pattern")
});

/// Pairwise (not transitive) clustering of near-duplicate tokens.
pub struct ConsistencyClusterer {
    threshold: f64,
}

struct TokenStats {
    token: String,
    len: usize,
    occurrences: Vec<Occurrence>,
}

impl TokenStats {
    fn count(&self) -> usize {
        self.occurrences.len()
    }
}

fn keep_token(token: &str) -> bool {
    token.chars().count() >= defaults::MIN_ENTITY_LEN
        && !token.chars().all(|c| c.is_ascii_digit())
        && token.chars().any(char::is_alphabetic)
        && !defaults::SENTENCE_STARTERS.contains(&token.to_lowercase().as_str())
}

impl ConsistencyClusterer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Tokens in first-appearance order, each with every occurrence.
    fn collect(segments: &[Segment], transcript_key: &str) -> Vec<TokenStats> {
        let mut stats: Vec<TokenStats> = Vec::new();
        let mut index_of: HashMap<String, usize> = HashMap::new();

        for (index, segment) in segments.iter().enumerate() {
            let segment_id = resolve_segment_id(segment, transcript_key, Some(index));
            for m in CAPITALIZED_TOKEN.find_iter(segment.text()) {
                let token = m.as_str();
                let occurrence = occurrence_at(segment, &segment_id, m.start(), m.end());
                match index_of.get(token) {
                    Some(&i) => stats[i].occurrences.push(occurrence),
                    None => {
                        index_of.insert(token.to_string(), stats.len());
                        stats.push(TokenStats {
                            token: token.to_string(),
                            len: token.chars().count(),
                            occurrences: vec![occurrence],
                        });
                    }
                }
            }
        }

        stats.retain(|s| keep_token(&s.token));
        stats
    }
}

impl Detector for ConsistencyClusterer {
    fn detect(&mut self, segments: &[Segment], transcript_key: &str) -> Result<Vec<Candidate>> {
        let stats = Self::collect(segments, transcript_key);

        let mut by_len: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, s) in stats.iter().enumerate() {
            by_len.entry(s.len).or_default().push(i);
        }

        let mut candidates = Vec::new();
        for (i, first) in stats.iter().enumerate() {
            let low = first.len.saturating_sub(defaults::MAX_LENGTH_DELTA);
            let high = first.len + defaults::MAX_LENGTH_DELTA;
            let mut partners: Vec<usize> = by_len
                .range(low..=high)
                .flat_map(|(_, indices)| indices.iter().copied())
                .filter(|&j| j > i)
                .collect();
            partners.sort_unstable();

            for j in partners {
                let second = &stats[j];
                let (dominant, minority) = if first.count() >= second.count() {
                    (first, second)
                } else {
                    (second, first)
                };
                if dominant.count() < defaults::CONSISTENCY_MIN_DOMINANT_COUNT
                    || minority.count() < defaults::CONSISTENCY_MIN_MINORITY_COUNT
                {
                    continue;
                }

                let score = ratio(&dominant.token.to_lowercase(), &minority.token.to_lowercase());
                if score < self.threshold {
                    continue;
                }

                debug!(
                    dominant = %dominant.token,
                    minority = %minority.token,
                    score,
                    "Inconsistent spelling"
                );
                candidates.push(Candidate::new(
                    CandidateKind::Consistency,
                    minority.token.clone(),
                    dominant.token.clone(),
                    score,
                    minority.occurrences.clone(),
                ));
            }
        }
        Ok(candidates)
    }

    fn name(&self) -> &str {
        "consistency"
    }
}
