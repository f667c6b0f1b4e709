//! Value types shared by the detectors, the applier and the rule memory.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;

/// Half-open `[start, end)` byte range into a segment's current text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two half-open ranges share at least one position.
    pub fn overlaps(&self, other: &Span) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }
}

fn sha1_hex(value: &str) -> String {
    format!("{:x}", Sha1::digest(value.as_bytes()))
}

/// One concrete place a candidate's wrong text appears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Stable across re-detection of the same text; empty when unknown.
    #[serde(default)]
    pub occurrence_id: String,
    pub segment_id: String,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub time_start: Option<f64>,
    #[serde(default)]
    pub time_end: Option<f64>,
    #[serde(default)]
    pub span: Option<Span>,
    /// Literal text the detector matched at `span`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
    #[serde(default)]
    pub snippet: String,
}

impl Occurrence {
    pub fn new(segment_id: impl Into<String>, span: Option<Span>, snippet: impl Into<String>) -> Self {
        let segment_id = segment_id.into();
        let snippet = snippet.into();
        let occurrence_id = match span {
            Some(span) => sha1_hex(&format!("{segment_id}:{}:{}", span.start, span.end)),
            None => sha1_hex(&format!("{segment_id}:-:{snippet}")),
        };
        Self {
            occurrence_id,
            segment_id,
            speaker: None,
            time_start: None,
            time_end: None,
            span,
            matched: None,
            snippet,
        }
    }
}

/// Which detector produced a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateKind {
    MemoryHit { rule_id: String },
    Acronym,
    Consistency,
    Fuzzy,
}

impl CandidateKind {
    /// Tie-break rank among overlapping replacements; higher wins.
    pub fn priority(&self) -> u8 {
        match self {
            Self::MemoryHit { .. } => 3,
            Self::Acronym => 2,
            Self::Consistency => 1,
            Self::Fuzzy => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MemoryHit { .. } => "memory_hit",
            Self::Acronym => "acronym",
            Self::Consistency => "consistency",
            Self::Fuzzy => "fuzzy",
        }
    }

    pub fn rule_id(&self) -> Option<&str> {
        match self {
            Self::MemoryHit { rule_id } => Some(rule_id),
            Self::Acronym | Self::Consistency | Self::Fuzzy => None,
        }
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed wrong → right substitution with the places it applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub candidate_id: String,
    #[serde(flatten)]
    pub kind: CandidateKind,
    pub proposed_wrong: String,
    pub proposed_right: String,
    pub confidence: f64,
    pub occurrences: Vec<Occurrence>,
}

impl Candidate {
    pub fn new(
        kind: CandidateKind,
        proposed_wrong: impl Into<String>,
        proposed_right: impl Into<String>,
        confidence: f64,
        occurrences: Vec<Occurrence>,
    ) -> Self {
        Self {
            candidate_id: uuid::Uuid::new_v4().to_string(),
            kind,
            proposed_wrong: proposed_wrong.into(),
            proposed_right: proposed_right.into(),
            confidence: confidence.clamp(0.0, 1.0),
            occurrences,
        }
    }

    /// Set only for candidates derived from a remembered rule.
    pub fn rule_id(&self) -> Option<&str> {
        self.kind.rule_id()
    }
}

/// How a rule's `wrong` forms are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    #[default]
    Token,
    Phrase,
    Regex,
    Acronym,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Phrase => "phrase",
            Self::Regex => "regex",
            Self::Acronym => "acronym",
        }
    }
}

/// Durability tier of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    Session,
    #[default]
    Project,
    Global,
}

impl RuleScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Project => "project",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for RuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

/// Where a rule is allowed to fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConditions {
    /// Only segments spoken by this speaker label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Only segments with at least this many whitespace-separated tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_token_len: Option<usize>,
    /// Only segments mentioning at least one of these terms.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_any: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default = "default_true")]
    pub word_boundary: bool,
}

impl Default for RuleConditions {
    fn default() -> Self {
        Self {
            speaker: None,
            min_token_len: None,
            context_any: Vec::new(),
            case_sensitive: false,
            word_boundary: true,
        }
    }
}

/// Hashable identity of a condition set; context terms are order-free.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionsSignature {
    pub speaker: Option<String>,
    pub min_token_len: Option<usize>,
    pub context_any: Vec<String>,
    pub case_sensitive: bool,
    pub word_boundary: bool,
}

impl RuleConditions {
    pub fn signature(&self) -> ConditionsSignature {
        let mut context_any = self.context_any.clone();
        context_any.sort();
        ConditionsSignature {
            speaker: self.speaker.clone(),
            min_token_len: self.min_token_len,
            context_any,
            case_sensitive: self.case_sensitive,
            word_boundary: self.word_boundary,
        }
    }
}

fn default_confidence() -> f64 {
    0.8
}

/// A durable, reusable correction instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRule {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub rule_type: RuleType,
    pub wrong: Vec<String>,
    pub right: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub auto_apply: bool,
    /// Absent on rules written before the flag existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_person_name: Option<bool>,
    #[serde(default)]
    pub scope: RuleScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<RuleConditions>,
}

impl CorrectionRule {
    pub fn new(rule_type: RuleType, wrong: Vec<String>, right: impl Into<String>) -> Self {
        let mut rule = Self {
            id: String::new(),
            rule_type,
            wrong,
            right: right.into(),
            confidence: default_confidence(),
            auto_apply: false,
            is_person_name: None,
            scope: RuleScope::Project,
            conditions: None,
        };
        rule.ensure_id();
        rule
    }

    /// Id derived from what the rule does; identical rules hash identically.
    pub fn computed_id(&self) -> String {
        let signature = format!(
            "{}\u{1f}{}\u{1f}{}",
            self.rule_type.as_str(),
            self.wrong.join("\u{1e}"),
            self.right
        );
        sha1_hex(&signature)[..16].to_string()
    }

    /// Fill in `id` from the rule content when it is missing.
    pub fn ensure_id(&mut self) {
        if self.id.trim().is_empty() {
            self.id = self.computed_id();
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_auto_apply(mut self, auto_apply: bool) -> Self {
        self.auto_apply = auto_apply;
        self
    }

    pub fn with_scope(mut self, scope: RuleScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_conditions(mut self, conditions: RuleConditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn with_person_name(mut self, is_person_name: bool) -> Self {
        self.is_person_name = Some(is_person_name);
        self
    }

    pub fn case_sensitive(&self) -> bool {
        self.conditions.as_ref().is_some_and(|c| c.case_sensitive)
    }

    pub fn word_boundary(&self) -> bool {
        self.conditions.as_ref().is_none_or(|c| c.word_boundary)
    }

    /// Identity of the applicability conditions, if any.
    pub fn conditions_signature(&self) -> Option<ConditionsSignature> {
        self.conditions.as_ref().map(RuleConditions::signature)
    }

    /// Raise confidence after a reviewer reused this rule.
    pub fn reinforce(&mut self, nudge: f64) {
        self.confidence = (self.confidence + nudge).min(1.0);
    }
}

/// A reviewer's verdict on one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    ApplyAll,
    ApplySome,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub candidate_id: String,
    pub decision: DecisionAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_occurrence_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_rule: Option<CorrectionRule>,
}

impl Decision {
    pub fn apply_all(candidate_id: impl Into<String>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            decision: DecisionAction::ApplyAll,
            selected_occurrence_ids: None,
            new_rule: None,
        }
    }

    pub fn apply_some(candidate_id: impl Into<String>, selected: Vec<String>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            decision: DecisionAction::ApplySome,
            selected_occurrence_ids: Some(selected),
            new_rule: None,
        }
    }

    pub fn reject(candidate_id: impl Into<String>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            decision: DecisionAction::Reject,
            selected_occurrence_ids: None,
            new_rule: None,
        }
    }

    pub fn with_new_rule(mut self, rule: CorrectionRule) -> Self {
        self.new_rule = Some(rule);
        self
    }
}
