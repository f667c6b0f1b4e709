use crate::correction::model::RuleScope;
use crate::defaults;
use crate::error::{CorrectionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub corrections: CorrectionsConfig,
    pub memory: MemoryConfig,
}

/// Correction engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorrectionsConfig {
    pub enabled: bool,
    pub interactive_review: bool,
    pub consistency_similarity_threshold: f64,
    pub fuzzy_similarity_threshold: f64,
    pub known_acronyms: Vec<String>,
    /// Canonical spelling → spoken phrases that should become it.
    pub known_org_phrases: BTreeMap<String, Vec<String>>,
    pub enable_fuzzy: bool,
    pub default_rule_scope: RuleScope,
    pub store_corrected_transcript: bool,
    pub write_csv_summary: bool,
    pub update_original_file: bool,
    pub create_backup: bool,
}

/// Rule memory locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MemoryConfig {
    /// Overrides `<config_dir>/scribefix/corrections.toml`.
    pub global_path: Option<PathBuf>,
    /// Overrides project root discovery.
    pub project_root: Option<PathBuf>,
}

impl Default for CorrectionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interactive_review: true,
            consistency_similarity_threshold: defaults::CONSISTENCY_SIMILARITY_THRESHOLD,
            fuzzy_similarity_threshold: defaults::FUZZY_SIMILARITY_THRESHOLD,
            known_acronyms: Vec::new(),
            known_org_phrases: BTreeMap::new(),
            enable_fuzzy: false,
            default_rule_scope: RuleScope::Project,
            store_corrected_transcript: true,
            write_csv_summary: true,
            update_original_file: false,
            create_backup: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CorrectionError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                CorrectionError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(CorrectionError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SCRIBEFIX_GLOBAL_RULES → memory.global_path
    /// - SCRIBEFIX_PROJECT_ROOT → memory.project_root
    /// - SCRIBEFIX_ENABLE_FUZZY → corrections.enable_fuzzy ("1"/"true")
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("SCRIBEFIX_GLOBAL_RULES")
            && !path.is_empty()
        {
            self.memory.global_path = Some(PathBuf::from(path));
        }

        if let Ok(root) = std::env::var("SCRIBEFIX_PROJECT_ROOT")
            && !root.is_empty()
        {
            self.memory.project_root = Some(PathBuf::from(root));
        }

        if let Ok(flag) = std::env::var("SCRIBEFIX_ENABLE_FUZZY")
            && !flag.is_empty()
        {
            self.corrections.enable_fuzzy = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        self
    }

    /// Reject values the detectors cannot work with.
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            (
                "corrections.consistency_similarity_threshold",
                self.corrections.consistency_similarity_threshold,
            ),
            (
                "corrections.fuzzy_similarity_threshold",
                self.corrections.fuzzy_similarity_threshold,
            ),
        ];
        for (key, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(CorrectionError::ConfigInvalidValue {
                    key: key.to_string(),
                    message: format!("{value} is outside [0, 1]"),
                });
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/scribefix/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(defaults::APP_DIR)
            .join("config.toml")
    }

    /// Commented template with every key at its default value.
    pub fn dump_template() -> String {
        format!(
            r#"# scribefix configuration

[corrections]
# Set to false to skip the correction pass entirely.
enabled = true
# Ask a reviewer before applying; when false only auto_apply rules run.
interactive_review = true
consistency_similarity_threshold = {consistency}
fuzzy_similarity_threshold = {fuzzy}
# Letter sequences such as "c s e" are collapsed into these.
known_acronyms = []
# Fuzzy speaker-name matching is opt-in.
enable_fuzzy = false
# Scope for rules learned during review: "session", "project" or "global".
default_rule_scope = "project"
store_corrected_transcript = true
write_csv_summary = true
update_original_file = false
create_backup = true

[corrections.known_org_phrases]
# REN21 = ["ren twenty one", "wren twenty one"]

[memory]
# global_path = "/home/me/.config/scribefix/corrections.toml"
# project_root = "/path/to/project"
"#,
            consistency = defaults::CONSISTENCY_SIMILARITY_THRESHOLD,
            fuzzy = defaults::FUZZY_SIMILARITY_THRESHOLD,
        )
    }
}
