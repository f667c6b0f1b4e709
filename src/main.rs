use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use scribefix::cli::{Cli, Commands, ConfigAction, RulesAction};
use scribefix::config::Config;
use scribefix::correction::{Candidate, ConsoleReviewer, ScriptedReviewer, SystemClock};
use scribefix::memory::RuleMemory;
use scribefix::workflow::{ArtifactPaths, RunOptions, RunStatus, RunSummary, Workflow, read_decisions_file};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let run_options = cli.command.run_options();
    match cli.command {
        Commands::Run { transcript, decisions, .. } => {
            let config = load_config(cli.config.as_deref())?;
            let options = run_options.unwrap_or_default();
            let summary = handle_run(&config, &transcript, decisions.as_deref(), &options)?;
            if !cli.quiet {
                print_summary(&summary);
            }
        }
        Commands::Rules {
            action: RulesAction::List { transcript },
        } => {
            let config = load_config(cli.config.as_deref())?;
            list_rules(&config, transcript.as_deref())?;
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref());
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "scribefix", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Install the log subscriber; `RUST_LOG` wins over the flags.
fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("scribefix={level}"))),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/scribefix/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// Suggestions of the previous run, used to re-key recorded decisions.
fn recorded_candidates(path: &Path) -> Result<Vec<Candidate>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse suggestions {}", path.display()))
}

fn handle_run(
    config: &Config,
    transcript: &Path,
    decisions: Option<&Path>,
    options: &RunOptions,
) -> Result<RunSummary> {
    let clock = SystemClock;
    let mut scripted;
    let mut console;
    let mut workflow = Workflow::new(config, &clock);

    if let Some(path) = decisions {
        let paths = ArtifactPaths::new(transcript, options.output_dir.as_deref());
        let recorded = recorded_candidates(&paths.suggestions())?;
        let replay = read_decisions_file(path)
            .with_context(|| format!("Failed to read decisions {}", path.display()))?;
        scripted = ScriptedReviewer::new(replay).with_recorded_candidates(&recorded);
        workflow = workflow.with_reviewer(&mut scripted);
    } else if options.interactive != Some(false) {
        if std::io::stdin().is_terminal() {
            console = ConsoleReviewer::new(std::io::stdin().lock(), std::io::stdout());
            workflow = workflow.with_reviewer(&mut console);
        } else {
            warn!("stdin is not a terminal; skipping interactive review");
        }
    }

    workflow
        .run(transcript, options)
        .with_context(|| format!("Correction run failed for {}", transcript.display()))
}

fn print_summary(summary: &RunSummary) {
    let status = summary.status.to_string();
    match summary.status {
        RunStatus::Success => println!("{} {}", "Status:".bold(), status.green()),
        RunStatus::SuggestionsOnly => println!("{} {}", "Status:".bold(), status.yellow()),
        RunStatus::Skipped => println!("{} {}", "Status:".bold(), status.dimmed()),
    }
    println!("  suggestions: {}", summary.suggestions_count);
    println!("  applied:     {}", summary.applied_count);

    let artifacts = &summary.artifacts;
    let listed: [(&str, &Option<PathBuf>); 6] = [
        ("suggestions", &artifacts.suggestions),
        ("decisions", &artifacts.decisions),
        ("patch log", &artifacts.patch_log),
        ("transcript", &artifacts.corrected_transcript),
        ("summary", &artifacts.summary_csv),
        ("backup", &artifacts.backup),
    ];
    for (label, path) in listed {
        if let Some(path) = path {
            println!("  {:<12} {}", format!("{label}:"), path.display().dimmed());
        }
    }
    for path in &artifacts.promoted {
        println!("  {:<12} {}", "promoted:", path.display().dimmed());
    }
}

fn list_rules(config: &Config, transcript: Option<&Path>) -> Result<()> {
    let memory = RuleMemory::new(&config.memory, transcript);
    let rules = memory.load(None)?;

    println!("{} {}", "Global: ".bold(), memory.global_path().display());
    println!("{} {}", "Project:".bold(), memory.project_path().display());
    if rules.is_empty() {
        println!("No rules remembered yet");
        return Ok(());
    }

    for rule in rules.values() {
        let auto = if rule.auto_apply { "auto".green().to_string() } else { "review".dimmed().to_string() };
        println!(
            "  {} [{}/{}] {} → {} ({:.2}, {})",
            rule.id.dimmed(),
            rule.rule_type.as_str(),
            rule.scope,
            rule.wrong.join(" | ").red(),
            rule.right.green(),
            rule.confidence,
            auto
        );
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) {
    let config_path = custom_path.map(PathBuf::from).unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
        ConfigAction::Dump => {
            print!("{}", Config::dump_template());
        }
    }
}
