//! scribefix - learned corrections for diarized transcripts
//!
//! Detects likely transcription errors, lets a reviewer accept or reject
//! them, applies the accepted ones without overlapping edits, and remembers
//! confirmed corrections for the next transcript.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod correction;
pub mod defaults;
pub mod error;
pub mod memory;
pub mod segment;
pub mod transcript;
pub mod workflow;

// Detection → review → application
pub use correction::{Applier, Detector, Reviewer};

// Error handling
pub use error::{CorrectionError, Result};

// Config
pub use config::Config;

// Data
pub use segment::Segment;
pub use transcript::Transcript;

// Memory and orchestration
pub use memory::RuleMemory;
pub use workflow::{RunOptions, RunStatus, RunSummary, Workflow};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
