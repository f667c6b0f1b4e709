//! Correction workflow for one transcript.
//!
//! `detecting → reviewing → applying → persisting`, short-circuiting to
//! `skipped` when corrections are disabled and to `suggestions_only` when
//! the caller does not apply changes.

use crate::config::Config;
use crate::correction::model::{Candidate, CorrectionRule, Decision, DecisionAction, RuleScope};
use crate::correction::patch_log::{Clock, PatchLog};
use crate::correction::review::Reviewer;
use crate::correction::{
    AcronymMatcher, Applier, ConsistencyClusterer, Detector, FuzzyNameMatcher, RuleMatcher, dedupe_candidates,
};
use crate::defaults;
use crate::error::Result;
use crate::memory::{RuleMap, RuleMemory};
use crate::transcript::{Transcript, rewrite_with_backup};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Skipped,
    SuggestionsOnly,
    Success,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Skipped => "skipped",
            Self::SuggestionsOnly => "suggestions_only",
            Self::Success => "success",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Detecting,
    Reviewing,
    Applying,
    Persisting,
}

fn enter(state: State) {
    debug!(?state, "Correction workflow");
}

/// Per-run switches; `None` falls back to the configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub interactive: Option<bool>,
    pub apply_changes: bool,
    pub update_original_file: Option<bool>,
    pub create_backup: Option<bool>,
    pub output_dir: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            interactive: None,
            apply_changes: true,
            update_original_file: None,
            create_backup: None,
            output_dir: None,
        }
    }
}

/// Files written by a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Artifacts {
    pub suggestions: Option<PathBuf>,
    pub decisions: Option<PathBuf>,
    pub patch_log: Option<PathBuf>,
    pub corrected_transcript: Option<PathBuf>,
    pub summary_csv: Option<PathBuf>,
    pub backup: Option<PathBuf>,
    pub promoted: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub status: RunStatus,
    pub suggestions_count: usize,
    pub applied_count: usize,
    pub candidates: Vec<Candidate>,
    pub decisions: Option<Vec<Decision>>,
    pub patch_log: PatchLog,
    pub artifacts: Artifacts,
}

impl RunSummary {
    fn skipped() -> Self {
        Self {
            status: RunStatus::Skipped,
            suggestions_count: 0,
            applied_count: 0,
            candidates: Vec::new(),
            decisions: None,
            patch_log: PatchLog::new(),
            artifacts: Artifacts::default(),
        }
    }
}

/// Artifact locations for one transcript.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    dir: PathBuf,
    stem: String,
}

impl ArtifactPaths {
    /// `output_dir`, or `<transcript_dir>/<stem>_corrections/`.
    pub fn new(transcript_path: &Path, output_dir: Option<&Path>) -> Self {
        let stem = transcript_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "transcript".to_string());
        let dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => transcript_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(format!("{stem}_corrections")),
        };
        Self { dir, stem }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, suffix: &str, extension: &str) -> PathBuf {
        self.dir.join(format!("{}_corrections_{suffix}.{extension}", self.stem))
    }

    pub fn suggestions(&self) -> PathBuf {
        self.file("suggestions", "json")
    }

    pub fn decisions(&self) -> PathBuf {
        self.file("decisions", "json")
    }

    pub fn patch_log(&self) -> PathBuf {
        self.file("patch_log", "json")
    }

    pub fn corrected_transcript(&self) -> PathBuf {
        self.file("transcript", "json")
    }

    pub fn summary_csv(&self) -> PathBuf {
        self.file("summary", "csv")
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(path.to_path_buf())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// `rule_id,count` rows for applied patch-log entries.
pub fn summary_csv(counts: &BTreeMap<String, usize>) -> String {
    let mut out = String::from("rule_id,count\n");
    for (rule_id, count) in counts {
        out.push_str(&format!("{},{count}\n", csv_field(rule_id)));
    }
    out
}

/// Read a decisions file: a bare list or `{"decisions": [...]}`.
pub fn read_decisions_file(path: &Path) -> Result<Vec<Decision>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DecisionsFile {
        List(Vec<Decision>),
        Wrapped { decisions: Vec<Decision> },
    }

    let contents = fs::read_to_string(path)?;
    Ok(match serde_json::from_str::<DecisionsFile>(&contents)? {
        DecisionsFile::List(decisions) | DecisionsFile::Wrapped { decisions } => decisions,
    })
}

/// Runs the correction pipeline for one transcript.
pub struct Workflow<'a> {
    config: &'a Config,
    reviewer: Option<&'a mut dyn Reviewer>,
    clock: &'a dyn Clock,
}

impl<'a> Workflow<'a> {
    pub fn new(config: &'a Config, clock: &'a dyn Clock) -> Self {
        Self {
            config,
            reviewer: None,
            clock,
        }
    }

    pub fn with_reviewer(mut self, reviewer: &'a mut dyn Reviewer) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    fn detect(&self, transcript: &Transcript, key: &str, rules: &RuleMap) -> Result<Vec<Candidate>> {
        let corrections = &self.config.corrections;
        let mut detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(RuleMatcher::from_memory(rules)),
            Box::new(AcronymMatcher::new(
                &corrections.known_acronyms,
                &corrections.known_org_phrases,
            )),
            Box::new(ConsistencyClusterer::new(corrections.consistency_similarity_threshold)),
            Box::new(FuzzyNameMatcher::new(
                &transcript.speaker_names(),
                corrections.fuzzy_similarity_threshold,
                corrections.enable_fuzzy,
            )),
        ];

        let mut candidates = Vec::new();
        for detector in &mut detectors {
            let found = detector.detect(&transcript.segments, key)?;
            debug!(detector = detector.name(), count = found.len(), "Detection finished");
            candidates.extend(found);
        }
        Ok(dedupe_candidates(candidates, rules))
    }

    /// Promote authored rules and reinforce reused ones.
    fn promote(
        &self,
        memory: &RuleMemory,
        rules: &mut RuleMap,
        candidates: &[Candidate],
        decisions: &[Decision],
    ) -> Result<Vec<PathBuf>> {
        let by_id: HashMap<&str, &Candidate> = candidates.iter().map(|c| (c.candidate_id.as_str(), c)).collect();
        let mut written = Vec::new();

        for decision in decisions {
            if let Some(rule) = &decision.new_rule {
                if matches!(rule.scope, RuleScope::Project | RuleScope::Global) {
                    written.push(memory.promote(rule, rule.scope)?);
                }
                continue;
            }
            if decision.decision == DecisionAction::Reject {
                continue;
            }
            let Some(rule) = by_id
                .get(decision.candidate_id.as_str())
                .and_then(|c| c.rule_id())
                .and_then(|id| rules.get_mut(id))
            else {
                continue;
            };
            rule.reinforce(defaults::REUSE_CONFIDENCE_NUDGE);
            written.push(memory.promote(rule, RuleScope::Project)?);
        }
        Ok(written)
    }

    /// Correct `transcript` in memory and write the run's artifacts.
    ///
    /// `transcript_path` locates rule memory and the artifact directory;
    /// the transcript file itself is not touched here.
    pub fn run_on_transcript(
        &mut self,
        transcript: &mut Transcript,
        transcript_path: &Path,
        options: &RunOptions,
    ) -> Result<RunSummary> {
        let config = self.config;
        let corrections = &config.corrections;
        if !corrections.enabled {
            info!("Corrections disabled in config");
            return Ok(RunSummary::skipped());
        }

        let interactive = options.interactive.unwrap_or(corrections.interactive_review);
        let paths = ArtifactPaths::new(transcript_path, options.output_dir.as_deref());
        let memory = RuleMemory::new(&config.memory, Some(transcript_path));
        let previous_decisions = paths.decisions();
        let mut rules = memory.load(previous_decisions.exists().then_some(previous_decisions.as_path()))?;
        let key = transcript.key();
        let mut artifacts = Artifacts::default();

        enter(State::Detecting);
        let candidates = self.detect(transcript, &key, &rules)?;
        info!(count = candidates.len(), "Correction suggestions");
        artifacts.suggestions = Some(write_json(&paths.suggestions(), &candidates)?);

        let mut decisions = None;
        if interactive && let Some(reviewer) = self.reviewer.as_deref_mut() {
            enter(State::Reviewing);
            decisions = reviewer.review(&candidates, corrections.default_rule_scope)?;
            if let Some(decisions) = &decisions {
                debug!(reviewer = reviewer.name(), count = decisions.len(), "Review finished");
                artifacts.decisions = Some(write_json(&paths.decisions(), decisions)?);
            }
        }

        if !options.apply_changes {
            return Ok(RunSummary {
                status: RunStatus::SuggestionsOnly,
                suggestions_count: candidates.len(),
                applied_count: 0,
                candidates,
                decisions,
                patch_log: PatchLog::new(),
                artifacts,
            });
        }

        enter(State::Applying);
        let eligible: Vec<Candidate> = if decisions.is_some() {
            candidates.clone()
        } else {
            candidates
                .iter()
                .filter(|c| {
                    c.rule_id()
                        .and_then(|id| rules.get(id))
                        .is_some_and(|rule: &CorrectionRule| rule.auto_apply)
                })
                .cloned()
                .collect()
        };
        let applier = Applier::new(&rules, self.clock).with_speaker_map(&transcript.speaker_map);
        let patch_log = if eligible.is_empty() {
            PatchLog::new()
        } else {
            applier.apply(&mut transcript.segments, &eligible, &key, decisions.as_deref())
        };
        let applied_count = patch_log.applied_count();

        enter(State::Persisting);
        artifacts.patch_log = Some(write_json(&paths.patch_log(), &patch_log)?);
        if let Some(decisions) = &decisions {
            artifacts.promoted = self.promote(&memory, &mut rules, &candidates, decisions)?;
        }
        if corrections.store_corrected_transcript && applied_count > 0 {
            let mut body = serde_json::Map::new();
            body.insert("segments".to_string(), serde_json::to_value(&transcript.segments)?);
            artifacts.corrected_transcript = Some(write_json(&paths.corrected_transcript(), &body)?);
        }
        if corrections.write_csv_summary && applied_count > 0 {
            let path = paths.summary_csv();
            fs::create_dir_all(paths.dir())?;
            fs::write(&path, summary_csv(&patch_log.counts_by_rule()))?;
            artifacts.summary_csv = Some(path);
        }

        Ok(RunSummary {
            status: RunStatus::Success,
            suggestions_count: candidates.len(),
            applied_count,
            candidates,
            decisions,
            patch_log,
            artifacts,
        })
    }

    /// Load, correct and optionally rewrite the transcript at `path`.
    pub fn run(&mut self, path: &Path, options: &RunOptions) -> Result<RunSummary> {
        if !self.config.corrections.enabled {
            info!("Corrections disabled in config");
            return Ok(RunSummary::skipped());
        }

        let mut transcript = Transcript::load(path)?;
        let mut summary = self.run_on_transcript(&mut transcript, path, options)?;

        let update_original = options
            .update_original_file
            .unwrap_or(self.config.corrections.update_original_file);
        let create_backup = options.create_backup.unwrap_or(self.config.corrections.create_backup);
        if options.apply_changes
            && update_original
            && summary.status == RunStatus::Success
            && summary.applied_count > 0
        {
            summary.artifacts.backup = rewrite_with_backup(&transcript, path, create_backup)?;
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_follow_transcript_stem() {
        let paths = ArtifactPaths::new(Path::new("/data/calls/monday.json"), None);
        assert_eq!(paths.dir(), Path::new("/data/calls/monday_corrections"));
        assert_eq!(
            paths.suggestions(),
            PathBuf::from("/data/calls/monday_corrections/monday_corrections_suggestions.json")
        );
        assert_eq!(
            paths.summary_csv(),
            PathBuf::from("/data/calls/monday_corrections/monday_corrections_summary.csv")
        );
    }

    #[test]
    fn explicit_output_dir_wins() {
        let paths = ArtifactPaths::new(Path::new("/data/monday.json"), Some(Path::new("/out")));
        assert_eq!(paths.patch_log(), PathBuf::from("/out/monday_corrections_patch_log.json"));
    }

    #[test]
    fn csv_quotes_when_needed() {
        let mut counts = BTreeMap::new();
        counts.insert("plain".to_string(), 2);
        counts.insert("with,comma".to_string(), 1);
        counts.insert("unruled".to_string(), 3);
        assert_eq!(
            summary_csv(&counts),
            "rule_id,count\nplain,2\nunruled,3\n\"with,comma\",1\n"
        );
    }

    #[test]
    fn decisions_file_accepts_both_shapes() {
        let dir = tempfile::TempDir::new().unwrap();
        let list = dir.path().join("list.json");
        let wrapped = dir.path().join("wrapped.json");
        let decisions = vec![Decision::apply_all("a"), Decision::reject("b")];
        fs::write(&list, serde_json::to_string(&decisions).unwrap()).unwrap();
        fs::write(
            &wrapped,
            serde_json::to_string(&serde_json::json!({ "decisions": decisions })).unwrap(),
        )
        .unwrap();

        assert_eq!(read_decisions_file(&list).unwrap(), decisions);
        assert_eq!(read_decisions_file(&wrapped).unwrap(), decisions);
    }

    #[test]
    fn status_display_is_snake_case() {
        assert_eq!(RunStatus::SuggestionsOnly.to_string(), "suggestions_only");
        assert_eq!(serde_json::to_value(RunStatus::Success).unwrap(), "success");
    }
}
