//! Default configuration constants for scribefix.
//!
//! Shared by the configuration layer, the detectors and the applier so the
//! tuning knobs live in one place.

/// Minimum similarity for the consistency clusterer to pair two spellings.
///
/// Tuned against the gestalt ratio: "Acme"/"Acmee" scores 0.889 and pairs,
/// "Acme"/"Acne" scores 0.75 and does not.
pub const CONSISTENCY_SIMILARITY_THRESHOLD: f64 = 0.88;

/// Minimum similarity for a token to be treated as a misheard speaker name.
pub const FUZZY_SIMILARITY_THRESHOLD: f64 = 0.92;

/// Confidence assigned to spaced-letter acronym matches ("c s e" → "CSE").
pub const ACRONYM_LETTERS_CONFIDENCE: f64 = 0.7;

/// Confidence assigned to known organization phrase matches.
pub const ORG_PHRASE_CONFIDENCE: f64 = 0.65;

/// The dominant spelling must occur at least this often to absorb a variant.
pub const CONSISTENCY_MIN_DOMINANT_COUNT: usize = 3;

/// The minority spelling must occur at least this often to be proposed.
pub const CONSISTENCY_MIN_MINORITY_COUNT: usize = 1;

/// Maximum length difference (in chars) between compared tokens.
pub const MAX_LENGTH_DELTA: usize = 2;

/// Tokens shorter than this are ignored by the consistency clusterer.
pub const MIN_ENTITY_LEN: usize = 3;

/// Context characters kept on each side of a match in review snippets.
pub const SNIPPET_WINDOW: usize = 40;

/// Confidence added to a rule each time a reviewer accepts one of its hits.
pub const REUSE_CONFIDENCE_NUDGE: f64 = 0.05;

/// Recorded as the first patch-log entry of every run.
pub const RESOLUTION_POLICY: &str = "longest_span > confidence > kind_priority > left_to_right";

/// Capitalized words that start sentences far more often than they name things.
pub const SENTENCE_STARTERS: &[&str] = &[
    "the", "but", "so", "and", "or", "if", "it", "is", "as", "at", "be", "by", "for", "in", "of",
    "on", "to", "we",
];

/// File name of the global rule store under the user config directory.
pub const GLOBAL_MEMORY_FILE: &str = "corrections.toml";

/// File name of the project rule store at the project root.
pub const PROJECT_MEMORY_FILE: &str = "scribefix_corrections.toml";

/// Hidden project directory that may hold the project rule store.
pub const PROJECT_MEMORY_DIR: &str = ".scribefix";

/// Application directory name under the user config directory.
pub const APP_DIR: &str = "scribefix";
