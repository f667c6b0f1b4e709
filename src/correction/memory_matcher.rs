//! Rule-memory matcher: finds the wrong forms of remembered rules.

use crate::correction::detector::{Detector, occurrence_at};
use crate::correction::identity::resolve_segment_id;
use crate::correction::model::{Candidate, CandidateKind, CorrectionRule, RuleType};
use crate::error::{CorrectionError, Result};
use crate::segment::Segment;
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Matches remembered rules against segment text.
///
/// Owns a per-rule compiled-pattern cache; [`RuleMatcher::reload`] swaps the
/// rule set and drops every cached pattern.
pub struct RuleMatcher {
    rules: Vec<CorrectionRule>,
    compiled: HashMap<String, Vec<Regex>>,
}

/// `ABC` → `["ABC", "A B C", "A. B. C."]`; empty when the form has no letters.
pub fn acronym_variants(value: &str) -> Vec<String> {
    let letters: Vec<String> = value
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(String::from)
        .collect();
    if letters.is_empty() {
        return Vec::new();
    }
    vec![
        letters.concat(),
        letters.join(" "),
        format!("{}.", letters.join(". ")),
    ]
}

fn compile(rule: &CorrectionRule, pattern: String) -> Result<Regex> {
    RegexBuilder::new(&pattern)
        .case_insensitive(!rule.case_sensitive())
        .build()
        .map_err(|source| CorrectionError::InvalidRulePattern {
            rule_id: rule.id.clone(),
            pattern,
            source,
        })
}

fn bounded(pattern: String, word_boundary: bool) -> String {
    if word_boundary {
        format!(r"\b(?:{pattern})\b")
    } else {
        pattern
    }
}

/// The dotted form ends in `.`, so only a leading boundary applies to it.
fn acronym_alternative(variant: &str, word_boundary: bool) -> String {
    let escaped = regex::escape(variant);
    if !word_boundary {
        return escaped;
    }
    if variant.ends_with(|c: char| c.is_ascii_alphanumeric()) {
        format!(r"\b{escaped}\b")
    } else {
        format!(r"\b{escaped}")
    }
}

/// Compile every wrong form of `rule`; forms with nothing to match are skipped.
fn compile_rule(rule: &CorrectionRule) -> Result<Vec<Regex>> {
    let mut patterns = Vec::with_capacity(rule.wrong.len());
    for wrong in &rule.wrong {
        let pattern = match rule.rule_type {
            RuleType::Regex => wrong.clone(),
            RuleType::Acronym => {
                let variants = acronym_variants(wrong);
                if variants.is_empty() {
                    continue;
                }
                let word_boundary = rule.word_boundary();
                variants
                    .iter()
                    .map(|v| acronym_alternative(v, word_boundary))
                    .collect::<Vec<_>>()
                    .join("|")
            }
            RuleType::Token | RuleType::Phrase => {
                if wrong.is_empty() {
                    continue;
                }
                bounded(regex::escape(wrong), rule.word_boundary())
            }
        };
        patterns.push(compile(rule, pattern)?);
    }
    Ok(patterns)
}

impl RuleMatcher {
    pub fn new(rules: impl IntoIterator<Item = CorrectionRule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
            compiled: HashMap::new(),
        }
    }

    /// Build from a loaded rule memory, in id order.
    pub fn from_memory(rules: &BTreeMap<String, CorrectionRule>) -> Self {
        Self::new(rules.values().cloned())
    }

    /// Replace the rule set and invalidate the pattern cache.
    pub fn reload(&mut self, rules: impl IntoIterator<Item = CorrectionRule>) {
        self.rules = rules.into_iter().collect();
        self.compiled.clear();
    }

    pub fn cached_rule_count(&self) -> usize {
        self.compiled.len()
    }

    fn patterns_for(&mut self, index: usize) -> Result<&[Regex]> {
        let rule = &self.rules[index];
        if !self.compiled.contains_key(&rule.id) {
            let patterns = compile_rule(rule)?;
            self.compiled.insert(rule.id.clone(), patterns);
        }
        Ok(self
            .compiled
            .get(&self.rules[index].id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }
}

impl Detector for RuleMatcher {
    fn detect(&mut self, segments: &[Segment], transcript_key: &str) -> Result<Vec<Candidate>> {
        let segment_ids: Vec<String> = segments
            .iter()
            .enumerate()
            .map(|(i, s)| resolve_segment_id(s, transcript_key, Some(i)))
            .collect();

        let mut candidates = Vec::new();
        for index in 0..self.rules.len() {
            let patterns = self.patterns_for(index)?.to_vec();
            let rule = &self.rules[index];

            let mut occurrences = Vec::new();
            for pattern in &patterns {
                for (segment, segment_id) in segments.iter().zip(&segment_ids) {
                    for m in pattern.find_iter(segment.text()) {
                        if m.is_empty() {
                            continue;
                        }
                        occurrences.push(occurrence_at(segment, segment_id, m.start(), m.end()));
                    }
                }
            }

            if occurrences.is_empty() {
                continue;
            }
            let Some(wrong) = rule.wrong.first() else {
                continue;
            };
            debug!(rule_id = %rule.id, hits = occurrences.len(), "Rule matched");
            candidates.push(Candidate::new(
                CandidateKind::MemoryHit {
                    rule_id: rule.id.clone(),
                },
                wrong.clone(),
                rule.right.clone(),
                rule.confidence,
                occurrences,
            ));
        }
        Ok(candidates)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
