//! FixForward CLI
//!
//! The `fixforward` command exposes the core pipeline stages over files and
//! stdin. It never runs tests or talks to an assistant itself; it consumes
//! their captured output.
//!
//! ## Commands
//!
//! - `diagnose`: normalize test output and classify the failures
//! - `prompt`: build the fix (or explain) prompt for the failures
//! - `extract`: recover file changes from an assistant response
//! - `score`: compare before/after runs and score the fix
//! - `state`: inspect or clear the recorded rollback state

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, Level};

use fixforward_core::obs::PipelineSpan;
use fixforward_core::prompt::offline_explanation;
use fixforward_core::{
    build_explain_prompt, classify_all, diagnostics_json, extract_patch, normalize_run, verify,
    ClassifiedFailure, DirLookup, Ecosystem, FileRollbackStore, FixforwardConfig, PatchResult,
    RollbackStore, RunSummary, VerifyResult,
};

#[derive(Parser)]
#[command(name = "fixforward")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Failing-test triage, patch extraction and fix scoring", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// TOML file overriding scanning and extraction limits
    #[arg(long, global = true, env = "FIXFORWARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize captured test output and classify each failure
    Diagnose {
        /// Ecosystem whose output dialect to parse (python, node, rust)
        #[arg(short, long)]
        ecosystem: Ecosystem,

        /// File holding the captured output (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Exit code of the test command
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        exit_code: i32,

        /// Print the diagnostics as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Build the prompt asking an assistant to fix the failures
    Prompt {
        #[arg(short, long)]
        ecosystem: Ecosystem,

        /// Project root used to inline source files
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// File holding the captured test output (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print one explanation prompt per failure instead
        #[arg(long)]
        explain: bool,
    },

    /// Extract file changes from an assistant response
    Extract {
        /// Project root the response refers to
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// File holding the response (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print the extracted patch as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score a fix from the runs before and after it
    Score {
        /// RunSummary JSON for the run before the fix
        #[arg(long)]
        before: PathBuf,

        /// RunSummary JSON for the run after the fix
        #[arg(long)]
        after: PathBuf,

        /// Print the full verification result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or clear the rollback state
    State {
        #[command(subcommand)]
        action: StateAction,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// Show the recorded state
    Show {
        /// State directory (default: ~/.fixforward)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Only accept state recorded for this project
        #[arg(long)]
        project: Option<PathBuf>,
    },

    /// Remove the recorded state
    Clear {
        /// State directory (default: ~/.fixforward)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    fixforward_core::telemetry::init_tracing(cli.json_logs, level);

    let config = match &cli.config {
        Some(path) => FixforwardConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => FixforwardConfig::default(),
    };
    debug!(event = "cli.config", ?config);

    match cli.command {
        Commands::Diagnose {
            ecosystem,
            input,
            exit_code,
            json,
        } => cmd_diagnose(&config, ecosystem, input.as_deref(), exit_code, json),
        Commands::Prompt {
            ecosystem,
            project,
            input,
            explain,
        } => cmd_prompt(&config, ecosystem, &project, input.as_deref(), explain),
        Commands::Extract {
            project,
            input,
            json,
        } => cmd_extract(&config, &project, input.as_deref(), json),
        Commands::Score {
            before,
            after,
            json,
        } => cmd_score(&before, &after, json),
        Commands::State { action } => match action {
            StateAction::Show { dir, project } => cmd_state_show(dir, project.as_deref()),
            StateAction::Clear { dir } => cmd_state_clear(dir),
        },
    }
}

/// Read the whole input file, or stdin when no path is given.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input: {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn diagnose_text(
    config: &FixforwardConfig,
    ecosystem: Ecosystem,
    raw: &str,
    exit_code: i32,
) -> (RunSummary, Vec<ClassifiedFailure>) {
    let summary = normalize_run(ecosystem, raw, exit_code, 0.0, &config.normalize);
    let classified = classify_all(&summary.failures);
    (summary, classified)
}

fn cmd_diagnose(
    config: &FixforwardConfig,
    ecosystem: Ecosystem,
    input: Option<&Path>,
    exit_code: i32,
    json: bool,
) -> Result<()> {
    let _span = PipelineSpan::enter("-", ecosystem.as_str());
    let raw = read_input(input)?;
    let (summary, classified) = diagnose_text(config, ecosystem, &raw, exit_code);

    if json {
        println!("{}", diagnostics_json(&classified)?);
    } else {
        print!("{}", render_diagnosis(ecosystem, &summary, &classified));
    }
    Ok(())
}

fn render_diagnosis(
    ecosystem: Ecosystem,
    summary: &RunSummary,
    classified: &[ClassifiedFailure],
) -> String {
    let mut out = format!(
        "{}: {} failed / {} passed / {} total ({:.2}s)\n",
        ecosystem.label(),
        summary.failed_count,
        summary.passed_count,
        summary.total,
        summary.duration_seconds
    );
    if summary.passed {
        out.push_str(&format!("All {} tests passed.\n", summary.total));
        return out;
    }
    for item in classified {
        let location = item.failure.location();
        out.push_str(&format!(
            "\n[{}] {}{}\n      {} (confidence {:.2})\n",
            item.category.short_tag(),
            item.failure.test_name,
            if location.is_empty() {
                String::new()
            } else {
                format!("  {location}")
            },
            item.summary,
            item.confidence
        ));
    }
    out
}

fn cmd_prompt(
    config: &FixforwardConfig,
    ecosystem: Ecosystem,
    project: &Path,
    input: Option<&Path>,
    explain: bool,
) -> Result<()> {
    let _span = PipelineSpan::enter(&project.display().to_string(), ecosystem.as_str());
    let raw = read_input(input)?;
    let (_, classified) = diagnose_text(config, ecosystem, &raw, 1);
    if classified.is_empty() {
        anyhow::bail!("No failures found in the test output");
    }

    if explain {
        for item in &classified {
            println!("{}\n", build_explain_prompt(item));
            println!("Offline: {}\n", offline_explanation(item));
        }
    } else {
        let lookup = DirLookup::new(project);
        let prompt = fixforward_core::prompt::build_fix_prompt_with(
            &classified,
            ecosystem,
            &lookup,
            &config.prompt,
        );
        println!("{prompt}");
    }
    Ok(())
}

fn cmd_extract(
    config: &FixforwardConfig,
    project: &Path,
    input: Option<&Path>,
    json: bool,
) -> Result<()> {
    let raw = read_input(input)?;
    let lookup = DirLookup::new(project);
    let patch = extract_patch(&raw, &lookup, &config.extract);
    if patch.is_empty() {
        anyhow::bail!("Assistant produced no usable file changes");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&patch)?);
    } else {
        print!("{}", render_patch(&patch));
    }
    Ok(())
}

fn render_patch(patch: &PatchResult) -> String {
    let mut out = String::new();
    for change in &patch.changes {
        out.push_str(&change.diff);
        if !change.diff.ends_with('\n') {
            out.push('\n');
        }
    }
    if !patch.explanation.is_empty() {
        out.push_str(&format!("\nExplanation:\n{}\n", patch.explanation));
    }
    out
}

fn cmd_score(before: &Path, after: &Path, json: bool) -> Result<()> {
    let before: RunSummary = read_json_file(before)?;
    let after: RunSummary = read_json_file(after)?;
    let result = verify(&before, &after);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_score(&result));
    }
    Ok(())
}

fn render_score(result: &VerifyResult) -> String {
    let timeout_note = if result.after.is_timeout() {
        format!("{}\n", result.after.raw_output)
    } else {
        String::new()
    };
    format!(
        "{}\n{timeout_note}Confidence: {:.2}{}\n",
        result.summary_diff,
        result.confidence,
        if result.all_passing {
            " (all tests passing)"
        } else {
            ""
        }
    )
}

fn open_store(dir: Option<PathBuf>) -> Result<FileRollbackStore> {
    match dir {
        Some(dir) => Ok(FileRollbackStore::new(dir)),
        None => FileRollbackStore::default_location().context("Failed to locate state directory"),
    }
}

fn cmd_state_show(dir: Option<PathBuf>, project: Option<&Path>) -> Result<()> {
    let store = open_store(dir)?;
    let state = match project {
        Some(project) => Some(store.load_for_project(project)?),
        None => store.load()?,
    };
    match state {
        Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
        None => println!("No rollback state recorded in {}", store.dir().display()),
    }
    Ok(())
}

fn cmd_state_clear(dir: Option<PathBuf>) -> Result<()> {
    let store = open_store(dir)?;
    store.clear()?;
    println!("Cleared rollback state in {}", store.dir().display());
    Ok(())
}
