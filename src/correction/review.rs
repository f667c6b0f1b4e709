//! Review collaborators: turn candidates into decisions.

use crate::correction::model::{
    Candidate, CandidateKind, CorrectionRule, Decision, RuleConditions, RuleScope, RuleType,
};
use crate::error::Result;
use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Write};
use tracing::warn;

/// Trait for anything that can pass verdicts on candidates.
pub trait Reviewer {
    /// Review `candidates`; `None` means no review took place.
    ///
    /// Rules authored during review default to `default_scope`.
    fn review(&mut self, candidates: &[Candidate], default_scope: RuleScope) -> Result<Option<Vec<Decision>>>;

    /// Return the name of this reviewer for logging.
    fn name(&self) -> &str;
}

/// Replays decisions recorded by an earlier review.
///
/// Candidate ids are generated per run, so decisions from an earlier run are
/// re-keyed through that run's suggestions: a recorded candidate maps onto
/// the current candidate with the same kind and wrong/right pair.
pub struct ScriptedReviewer {
    decisions: Vec<Decision>,
    recorded: HashMap<String, ReplayKey>,
    unmatched: usize,
}

type ReplayKey = (&'static str, String, String);

fn replay_key(candidate: &Candidate) -> ReplayKey {
    (
        candidate.kind.as_str(),
        candidate.proposed_wrong.to_lowercase(),
        candidate.proposed_right.to_lowercase(),
    )
}

impl ScriptedReviewer {
    pub fn new(decisions: Vec<Decision>) -> Self {
        Self {
            decisions,
            recorded: HashMap::new(),
            unmatched: 0,
        }
    }

    /// Suggestions from the run the decisions were recorded against.
    pub fn with_recorded_candidates(mut self, recorded: &[Candidate]) -> Self {
        self.recorded = recorded
            .iter()
            .map(|c| (c.candidate_id.clone(), replay_key(c)))
            .collect();
        self
    }

    /// Decisions of the last review that matched no current candidate.
    pub fn unmatched(&self) -> usize {
        self.unmatched
    }
}

impl Reviewer for ScriptedReviewer {
    fn review(&mut self, candidates: &[Candidate], _default_scope: RuleScope) -> Result<Option<Vec<Decision>>> {
        let known: HashSet<&str> = candidates.iter().map(|c| c.candidate_id.as_str()).collect();
        let current: HashMap<ReplayKey, &str> = candidates
            .iter()
            .map(|c| (replay_key(c), c.candidate_id.as_str()))
            .collect();

        let mut unmatched = 0;
        let decisions = self
            .decisions
            .iter()
            .cloned()
            .map(|mut decision| {
                if known.contains(decision.candidate_id.as_str()) {
                    return decision;
                }
                match self.recorded.get(&decision.candidate_id).and_then(|key| current.get(key)) {
                    Some(id) => decision.candidate_id = (*id).to_string(),
                    None => unmatched += 1,
                }
                decision
            })
            .collect();
        self.unmatched = unmatched;
        if unmatched > 0 {
            warn!(
                unmatched,
                "Recorded decisions match no current candidate; they were recorded against other suggestions"
            );
        }
        Ok(Some(decisions))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Draft a rule that reproduces `candidate`.
pub fn build_rule_from_candidate(
    candidate: &Candidate,
    scope: RuleScope,
    conditions: Option<RuleConditions>,
) -> CorrectionRule {
    let rule_type = if candidate.proposed_wrong.contains(' ') {
        RuleType::Phrase
    } else {
        RuleType::Token
    };
    let mut rule = CorrectionRule::new(
        rule_type,
        vec![candidate.proposed_wrong.clone()],
        candidate.proposed_right.clone(),
    )
    .with_confidence(candidate.confidence)
    .with_auto_apply(false)
    .with_scope(scope)
    .with_person_name(candidate.kind == CandidateKind::Fuzzy);
    rule.conditions = conditions;
    rule
}

fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

fn time_window(start: Option<f64>, end: Option<f64>) -> String {
    match (start, end) {
        (None, None) => "?".to_string(),
        (None, Some(end)) => format!("?-{}", format_time(end)),
        (Some(start), None) => format!("{}-?", format_time(start)),
        (Some(start), Some(end)) => format!("{}-{}", format_time(start), format_time(end)),
    }
}

/// Interactive line-oriented reviewer.
///
/// Actions: `a` apply all, `s` apply some, `c` learn with a condition,
/// `l` learn as-is, `r` reject, `k` skip.
pub struct ConsoleReviewer<R, W> {
    input: R,
    output: W,
    examples: usize,
}

impl<R: BufRead, W: Write> ConsoleReviewer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            examples: 3,
        }
    }

    /// Prompt and read one trimmed line; `None` once input is exhausted.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn ask_action(&mut self) -> Result<Option<char>> {
        loop {
            let Some(raw) = self.ask("Action [a/s/c/l/r/k]: ")? else {
                return Ok(None);
            };
            if let Some(action) = raw.to_lowercase().chars().next()
                && "asclrk".contains(action)
            {
                return Ok(Some(action));
            }
        }
    }

    fn show(&mut self, candidate: &Candidate) -> Result<()> {
        writeln!(self.output, "\n---")?;
        writeln!(
            self.output,
            "Suggest: '{}' → '{}' (kind={}, confidence={:.2})",
            candidate.proposed_wrong, candidate.proposed_right, candidate.kind, candidate.confidence
        )?;
        writeln!(self.output, "Occurrences: {}", candidate.occurrences.len())?;
        for occurrence in candidate.occurrences.iter().take(self.examples) {
            writeln!(
                self.output,
                "- [{}] {}: {}",
                time_window(occurrence.time_start, occurrence.time_end),
                occurrence.speaker.as_deref().unwrap_or("UNKNOWN"),
                occurrence.snippet
            )?;
        }
        Ok(())
    }

    fn select_occurrences(&mut self, candidate: &Candidate) -> Result<Vec<String>> {
        for (i, occurrence) in candidate.occurrences.iter().enumerate() {
            writeln!(
                self.output,
                "{}. [{}] {}: {}",
                i + 1,
                time_window(occurrence.time_start, occurrence.time_end),
                occurrence.speaker.as_deref().unwrap_or("UNKNOWN"),
                occurrence.snippet
            )?;
        }
        let raw = self
            .ask("Select occurrences (comma-separated indices): ")?
            .unwrap_or_default();
        Ok(raw
            .split(',')
            .filter_map(|part| part.trim().parse::<usize>().ok())
            .filter(|&i| (1..=candidate.occurrences.len()).contains(&i))
            .map(|i| candidate.occurrences[i - 1].occurrence_id.clone())
            .collect())
    }

    fn ask_conditions(&mut self) -> Result<RuleConditions> {
        let mut conditions = RuleConditions::default();
        let choice = self
            .ask("Condition [s=speaker, w=context word, n=none]: ")?
            .unwrap_or_default()
            .to_lowercase();
        if choice.starts_with('s') {
            let speaker = self.ask("Speaker name: ")?.unwrap_or_default();
            if !speaker.is_empty() {
                conditions.speaker = Some(speaker);
            }
        } else if choice.starts_with('w') {
            let words = self.ask("Context word(s) (comma-separated): ")?.unwrap_or_default();
            conditions.context_any = words
                .split(',')
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(conditions)
    }
}

impl<R: BufRead, W: Write> Reviewer for ConsoleReviewer<R, W> {
    fn review(&mut self, candidates: &[Candidate], default_scope: RuleScope) -> Result<Option<Vec<Decision>>> {
        let mut ordered: Vec<&Candidate> = candidates.iter().collect();
        ordered.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut decisions = Vec::new();
        for candidate in ordered {
            self.show(candidate)?;
            let Some(action) = self.ask_action()? else {
                break;
            };
            let id = candidate.candidate_id.clone();
            let decision = match action {
                'a' => Decision::apply_all(id),
                's' => Decision::apply_some(id, self.select_occurrences(candidate)?),
                'c' => {
                    let conditions = self.ask_conditions()?;
                    Decision::apply_all(id).with_new_rule(build_rule_from_candidate(
                        candidate,
                        default_scope,
                        Some(conditions),
                    ))
                }
                'l' => Decision::apply_all(id).with_new_rule(build_rule_from_candidate(candidate, default_scope, None)),
                'r' => Decision::reject(id),
                _ => continue,
            };
            decisions.push(decision);
        }
        Ok(Some(decisions))
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::model::{DecisionAction, Occurrence, Span};
    use std::io::Cursor;

    fn candidate(wrong: &str, right: &str, confidence: f64, kind: CandidateKind) -> Candidate {
        let mut a = Occurrence::new("s1", Some(Span::new(0, wrong.len())), format!("{wrong} first"));
        a.time_start = Some(65.0);
        a.time_end = Some(70.5);
        a.speaker = Some("Alice".into());
        let b = Occurrence::new("s2", Some(Span::new(4, 4 + wrong.len())), format!("and {wrong}"));
        Candidate::new(kind, wrong, right, confidence, vec![a, b])
    }

    fn run(input: &str, candidates: &[Candidate]) -> (Vec<Decision>, String) {
        let mut output = Vec::new();
        let decisions = {
            let mut reviewer = ConsoleReviewer::new(Cursor::new(input.to_string()), &mut output);
            reviewer.review(candidates, RuleScope::Project).unwrap().unwrap()
        };
        (decisions, String::from_utf8(output).unwrap())
    }

    #[test]
    fn actions_map_to_decisions_in_confidence_order() {
        let low = candidate("Acmee", "Acme", 0.6, CandidateKind::Consistency);
        let high = candidate("c s e", "CSE", 0.9, CandidateKind::Acronym);
        let (decisions, output) = run("a\nr\n", &[low.clone(), high.clone()]);

        assert_eq!(decisions.len(), 2);
        assert_eq!(decisions[0].candidate_id, high.candidate_id);
        assert_eq!(decisions[0].decision, DecisionAction::ApplyAll);
        assert_eq!(decisions[1].candidate_id, low.candidate_id);
        assert_eq!(decisions[1].decision, DecisionAction::Reject);
        assert!(output.contains("Suggest: 'c s e' → 'CSE' (kind=acronym, confidence=0.90)"));
        assert!(output.contains("- [01:05-01:10] Alice: c s e first"));
        assert!(output.contains("- [?] UNKNOWN: and c s e"));
    }

    #[test]
    fn apply_some_selects_by_index() {
        let c = candidate("Acmee", "Acme", 0.8, CandidateKind::Consistency);
        let (decisions, _) = run("s\n2, 9, x\n", std::slice::from_ref(&c));
        assert_eq!(decisions[0].decision, DecisionAction::ApplySome);
        assert_eq!(
            decisions[0].selected_occurrence_ids,
            Some(vec![c.occurrences[1].occurrence_id.clone()])
        );
    }

    #[test]
    fn learn_builds_rule() {
        let c = candidate("Jonathon", "Jonathan", 0.93, CandidateKind::Fuzzy);
        let (decisions, _) = run("l\n", std::slice::from_ref(&c));
        let rule = decisions[0].new_rule.as_ref().unwrap();
        assert_eq!(rule.rule_type, RuleType::Token);
        assert_eq!(rule.wrong, vec!["Jonathon"]);
        assert_eq!(rule.scope, RuleScope::Project);
        assert_eq!(rule.is_person_name, Some(true));
        assert!(!rule.auto_apply);
        assert!(rule.conditions.is_none());
    }

    #[test]
    fn conditional_rule_captures_context_words() {
        let c = candidate("wren twenty one", "REN21", 0.65, CandidateKind::Acronym);
        let (decisions, _) = run("c\nw\nreport, energy\n", std::slice::from_ref(&c));
        let rule = decisions[0].new_rule.as_ref().unwrap();
        assert_eq!(rule.rule_type, RuleType::Phrase);
        assert_eq!(rule.is_person_name, Some(false));
        let conditions = rule.conditions.as_ref().unwrap();
        assert_eq!(conditions.context_any, vec!["report", "energy"]);
    }

    #[test]
    fn skip_and_invalid_input_produce_no_decision() {
        let c = candidate("Acmee", "Acme", 0.8, CandidateKind::Consistency);
        let (decisions, output) = run("?\n\nk\n", std::slice::from_ref(&c));
        assert!(decisions.is_empty());
        assert_eq!(output.matches("Action [a/s/c/l/r/k]: ").count(), 3);
    }

    #[test]
    fn exhausted_input_ends_review() {
        let a = candidate("Acmee", "Acme", 0.8, CandidateKind::Consistency);
        let b = candidate("Bobb", "Bob", 0.7, CandidateKind::Consistency);
        let (decisions, _) = run("a\n", &[a, b]);
        assert_eq!(decisions.len(), 1);
    }

    #[test]
    fn scripted_reviewer_replays_decisions() {
        let c = candidate("Acmee", "Acme", 0.8, CandidateKind::Consistency);
        let mut reviewer = ScriptedReviewer::new(vec![Decision::apply_all(c.candidate_id.clone())]);
        let decisions = reviewer.review(&[c], RuleScope::Project).unwrap().unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(reviewer.name(), "scripted");
    }

    #[test]
    fn scripted_reviewer_rekeys_recorded_decisions() {
        let earlier = candidate("Acmee", "Acme", 0.8, CandidateKind::Consistency);
        let now = candidate("Acmee", "Acme", 0.8, CandidateKind::Consistency);
        let other = candidate("Acmee", "Acme", 0.8, CandidateKind::Fuzzy);
        assert_ne!(earlier.candidate_id, now.candidate_id);

        let mut reviewer = ScriptedReviewer::new(vec![
            Decision::apply_all(earlier.candidate_id.clone()),
            Decision::reject("never-seen"),
        ])
        .with_recorded_candidates(std::slice::from_ref(&earlier));
        let decisions = reviewer
            .review(&[other, now.clone()], RuleScope::Project)
            .unwrap()
            .unwrap();
        assert_eq!(decisions[0].candidate_id, now.candidate_id);
        assert_eq!(decisions[1].candidate_id, "never-seen");
        assert_eq!(reviewer.unmatched(), 1);
    }

    #[test]
    fn scripted_reviewer_counts_stale_replays() {
        let earlier = candidate("Acmee", "Acme", 0.8, CandidateKind::Consistency);
        let mut reviewer = ScriptedReviewer::new(vec![Decision::apply_all(earlier.candidate_id.clone())]);

        // Suggestions were rewritten since the decisions were recorded.
        let now = candidate("Acmee", "Acme", 0.8, CandidateKind::Consistency);
        reviewer.review(&[now], RuleScope::Project).unwrap();
        assert_eq!(reviewer.unmatched(), 1);

        let mut fresh = ScriptedReviewer::new(Vec::new());
        fresh.review(&[], RuleScope::Project).unwrap();
        assert_eq!(fresh.unmatched(), 0);
    }
}
