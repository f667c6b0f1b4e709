//! Command-line interface for scribefix
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use crate::workflow::RunOptions;
use clap_complete::Shell;
use std::path::PathBuf;

/// Learned text corrections for diarized transcripts
#[derive(Parser, Debug)]
#[command(name = "scribefix", version, about = "Learned text corrections for diarized transcripts")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect, review and apply corrections for one transcript
    Run {
        /// Transcript JSON file
        transcript: PathBuf,

        /// Skip interactive review; only auto-apply rules are applied
        #[arg(long, conflicts_with = "decisions")]
        no_review: bool,

        /// Replay decisions recorded by an earlier review
        #[arg(long, value_name = "FILE")]
        decisions: Option<PathBuf>,

        /// Write suggestions without applying anything
        #[arg(long)]
        suggest_only: bool,

        /// Rewrite the transcript file when corrections were applied
        #[arg(long)]
        update_original: bool,

        /// Do not back up the transcript before rewriting it
        #[arg(long, requires = "update_original")]
        no_backup: bool,

        /// Directory for run artifacts (default: <transcript_dir>/<stem>_corrections)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Inspect remembered correction rules
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

impl Commands {
    /// Run options for the `run` flags; `None` for other commands.
    ///
    /// A decisions file is a review, so it forces the review step on even
    /// when the configuration disables interactive review.
    pub fn run_options(&self) -> Option<RunOptions> {
        let Self::Run {
            no_review,
            decisions,
            suggest_only,
            update_original,
            no_backup,
            output_dir,
            ..
        } = self
        else {
            return None;
        };
        let interactive = if decisions.is_some() {
            Some(true)
        } else {
            no_review.then_some(false)
        };
        Some(RunOptions {
            interactive,
            apply_changes: !suggest_only,
            update_original_file: update_original.then_some(true),
            create_backup: no_backup.then_some(false),
            output_dir: output_dir.clone(),
        })
    }
}

/// Rule memory actions
#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// List the merged global and project rules
    List {
        /// Resolve the project store relative to this transcript
        #[arg(long, value_name = "FILE")]
        transcript: Option<PathBuf>,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Dump a commented configuration template
    Dump,
}
