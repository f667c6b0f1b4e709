//! Tiered rule memory: global, project and transcript-local rules.
//!
//! Rule files are TOML, either keyed (`[rules.<id>]`) or a list
//! (`[[rules]]`). A more specific layer overrides a same-id rule from a
//! broader one: global < project < transcript-local.

use crate::config::MemoryConfig;
use crate::correction::model::{CorrectionRule, Decision, RuleScope};
use crate::defaults;
use crate::error::{CorrectionError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub type RuleMap = BTreeMap<String, CorrectionRule>;

/// Rules loaded from each layer, before reconciliation.
#[derive(Debug, Clone, Default)]
pub struct MemoryLayers {
    pub global: RuleMap,
    pub project: RuleMap,
    pub transcript: RuleMap,
}

impl MemoryLayers {
    /// Reconcile layers by id; the most specific layer wins.
    pub fn merged(&self) -> RuleMap {
        let mut rules = self.global.clone();
        rules.extend(self.project.clone());
        rules.extend(self.transcript.clone());
        rules
    }
}

/// Walk up from the transcript's directory (or the current directory)
/// looking for a project marker; falls back to the current directory.
pub fn resolve_project_root(transcript_path: Option<&Path>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let start = transcript_path
        .and_then(|p| {
            let absolute = if p.is_absolute() { p.to_path_buf() } else { cwd.join(p) };
            fs::canonicalize(&absolute).ok().or(Some(absolute))
        })
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| cwd.clone());

    for dir in start.ancestors() {
        if dir.parent().is_none() {
            break;
        }
        if dir.join(".git").exists()
            || dir.join(defaults::PROJECT_MEMORY_DIR).exists()
            || dir.join(defaults::PROJECT_MEMORY_FILE).exists()
        {
            return dir.to_path_buf();
        }
    }
    cwd
}

fn store_error(path: &Path, message: impl Into<String>) -> CorrectionError {
    CorrectionError::MemoryStore {
        path: path.display().to_string(),
        message: message.into(),
    }
}

fn parse_rule(value: toml::Value, key: Option<&str>, path: &Path) -> Option<CorrectionRule> {
    let mut value = value;
    if let (Some(key), toml::Value::Table(table)) = (key, &mut value) {
        if let Some(inline) = table.get("id").and_then(toml::Value::as_str)
            && inline != key
        {
            warn!(path = %path.display(), key, inline, "Rule key overrides inline id");
        }
        table.insert("id".to_string(), toml::Value::String(key.to_string()));
    }
    match value.try_into::<CorrectionRule>() {
        Ok(mut rule) => {
            rule.ensure_id();
            Some(rule)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping invalid correction rule");
            None
        }
    }
}

/// Load one rule file; a missing file is an empty layer.
///
/// A file that is not valid TOML is an error. A single malformed rule is
/// skipped with a warning.
pub fn load_rules_file(path: &Path) -> Result<RuleMap> {
    let mut rules = RuleMap::new();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(rules),
        Err(e) => return Err(e.into()),
    };
    let root: toml::Table = toml::from_str(&contents).map_err(|e| store_error(path, e.to_string()))?;

    let body = match root.get("rules") {
        Some(rules_value) => rules_value.clone(),
        None => toml::Value::Table(root),
    };

    match body {
        toml::Value::Table(table) => {
            for (key, value) in table {
                if !value.is_table() {
                    continue;
                }
                if let Some(rule) = parse_rule(value, Some(&key), path) {
                    rules.insert(rule.id.clone(), rule);
                }
            }
        }
        toml::Value::Array(items) => {
            for item in items {
                if let Some(rule) = parse_rule(item, None, path) {
                    rules.insert(rule.id.clone(), rule);
                }
            }
        }
        _ => return Err(store_error(path, "`rules` must be a table or an array of tables")),
    }

    debug!(path = %path.display(), count = rules.len(), "Loaded rule layer");
    Ok(rules)
}

/// Rules authored in a previous review of this transcript.
///
/// Accepts `{"decisions": [...]}` or a bare list. An unreadable file is
/// logged and treated as empty, since it is a run artifact rather than
/// curated memory.
pub fn load_decision_rules(path: &Path) -> Result<RuleMap> {
    let mut rules = RuleMap::new();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(rules),
        Err(e) => return Err(e.into()),
    };
    let payload: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable decisions file");
            return Ok(rules);
        }
    };

    let items = match payload {
        serde_json::Value::Object(mut object) => match object.remove("decisions") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Ok(rules),
        },
        serde_json::Value::Array(items) => items,
        _ => return Ok(rules),
    };

    for item in items {
        let Ok(decision) = serde_json::from_value::<Decision>(item) else {
            continue;
        };
        if let Some(mut rule) = decision.new_rule {
            rule.ensure_id();
            rules.insert(rule.id.clone(), rule);
        }
    }
    Ok(rules)
}

#[derive(Serialize)]
struct RuleFile<'a> {
    rules: Vec<&'a CorrectionRule>,
}

/// Write `rules` to `path` via a temp file and rename.
pub fn save_rules_file<'a>(path: &Path, rules: impl IntoIterator<Item = &'a CorrectionRule>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let payload = RuleFile {
        rules: rules.into_iter().collect(),
    };
    let content = toml::to_string(&payload)?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();
    if let Err(e) = written {
        fs::remove_file(&tmp_path).ok();
        return Err(e.into());
    }
    Ok(())
}

/// Locations of the durable rule layers for one transcript.
#[derive(Debug, Clone)]
pub struct RuleMemory {
    global_path: PathBuf,
    project_root: PathBuf,
}

impl RuleMemory {
    pub fn new(config: &MemoryConfig, transcript_path: Option<&Path>) -> Self {
        let global_path = config.global_path.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from(".config"))
                .join(defaults::APP_DIR)
                .join(defaults::GLOBAL_MEMORY_FILE)
        });
        let project_root = config
            .project_root
            .clone()
            .unwrap_or_else(|| resolve_project_root(transcript_path));
        Self {
            global_path,
            project_root,
        }
    }

    pub fn global_path(&self) -> &Path {
        &self.global_path
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// `<root>/scribefix_corrections.toml`, or `<root>/.scribefix/corrections.toml`
    /// when only that one exists.
    pub fn project_path(&self) -> PathBuf {
        let primary = self.project_root.join(defaults::PROJECT_MEMORY_FILE);
        let fallback = self
            .project_root
            .join(defaults::PROJECT_MEMORY_DIR)
            .join(defaults::GLOBAL_MEMORY_FILE);
        if primary.exists() || !fallback.exists() {
            primary
        } else {
            fallback
        }
    }

    pub fn load_layers(&self, decisions_path: Option<&Path>) -> Result<MemoryLayers> {
        Ok(MemoryLayers {
            global: load_rules_file(&self.global_path)?,
            project: load_rules_file(&self.project_path())?,
            transcript: match decisions_path {
                Some(path) => load_decision_rules(path)?,
                None => RuleMap::new(),
            },
        })
    }

    /// Load and reconcile every layer.
    pub fn load(&self, decisions_path: Option<&Path>) -> Result<RuleMap> {
        let rules = self.load_layers(decisions_path)?.merged();
        info!(count = rules.len(), "Loaded correction rules");
        Ok(rules)
    }

    /// Persist `rule` into the durable layer for `scope`.
    ///
    /// Returns the file written. Session rules live only in the
    /// transcript's decisions and cannot be promoted.
    pub fn promote(&self, rule: &CorrectionRule, scope: RuleScope) -> Result<PathBuf> {
        let path = match scope {
            RuleScope::Global => self.global_path.clone(),
            RuleScope::Project => self.project_path(),
            RuleScope::Session => {
                return Err(CorrectionError::InvalidScope {
                    scope: scope.to_string(),
                });
            }
        };

        let mut stored = rule.clone();
        stored.ensure_id();
        if scope == RuleScope::Project {
            stored.scope = RuleScope::Project;
        }

        let mut existing = load_rules_file(&path)?;
        existing.insert(stored.id.clone(), stored);
        save_rules_file(&path, existing.values())?;
        info!(rule_id = %rule.id, scope = %scope, path = %path.display(), "Promoted rule");
        Ok(path)
    }
}
