//! Transcript correction: detection, deduplication, review and application.

pub mod acronym;
pub mod apply;
pub mod consistency;
pub mod dedupe;
pub mod detector;
pub mod fuzzy;
pub mod identity;
pub mod memory_matcher;
pub mod model;
pub mod patch_log;
pub mod review;
pub mod similarity;

pub use acronym::AcronymMatcher;
pub use apply::Applier;
pub use consistency::ConsistencyClusterer;
pub use dedupe::dedupe_candidates;
pub use detector::Detector;
pub use fuzzy::FuzzyNameMatcher;
pub use identity::{build_snippet, resolve_segment_id};
pub use memory_matcher::RuleMatcher;
pub use model::{
    Candidate, CandidateKind, CorrectionRule, Decision, DecisionAction, Occurrence, RuleConditions,
    RuleScope, RuleType, Span,
};
pub use patch_log::{Clock, FixedClock, PatchLog, PatchLogEntry, PatchOutcome, PatchRecord, SystemClock};
pub use review::{ConsoleReviewer, Reviewer, ScriptedReviewer};
