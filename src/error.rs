//! Error types for scribefix.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorrectionError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Rule memory errors
    #[error("Rule memory at {path} is unreadable: {message}")]
    MemoryStore { path: String, message: String },

    #[error("Failed to serialize rule memory: {0}")]
    MemorySerialize(#[from] toml::ser::Error),

    #[error("Cannot promote a rule into scope '{scope}'")]
    InvalidScope { scope: String },

    #[error("Rule {rule_id} has an invalid pattern '{pattern}': {source}")]
    InvalidRulePattern {
        rule_id: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    // Transcript errors
    #[error("Transcript {path} is malformed: {message}")]
    Transcript { path: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, CorrectionError>;
