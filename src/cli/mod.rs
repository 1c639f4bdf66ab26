//! Command-line interface for govflow.
//!
//! Provides commands for listing frameworks, running governed generations,
//! probing prompts with the breach simulator, and verifying exported audit
//! logs.

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{CommandGenerator, Generator, StaticGenerator};
use crate::catalog::Catalog;
use crate::config::{self, ResolvedConfig};
use crate::core::{AuditLog, Orchestrator};
use crate::domain::{
    Action, AppState, ConfigPatch, GovernanceLayer, LogEntry, PhenomenologicalPatch,
    QualitativeStrength, SymbolicPatch,
};

/// govflow - Configuration-driven content-governance pipeline
#[derive(Parser, Debug)]
#[command(name = "govflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available governance frameworks
    Frameworks,

    /// Run a prompt through the governance pipeline
    Run {
        /// Framework id (see `govflow frameworks`)
        framework: String,

        /// Prompt file (reads piped stdin, else the framework's sample prompt)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Declarative spec file (JSON or YAML) selecting active constraints
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Symbolic coherence strength (low, balanced, high)
        #[arg(long)]
        coherence: Option<QualitativeStrength>,

        /// Phenomenological affective congruence target (low, balanced, high)
        #[arg(long)]
        congruence: Option<QualitativeStrength>,

        /// Disable archetype projection in the concept graph
        #[arg(long)]
        no_archetype: bool,

        /// Print the final state as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Export the audit log as JSONL
        #[arg(long)]
        audit_out: Option<PathBuf>,
    },

    /// Scan a prompt for injection without running the pipeline
    Breach {
        /// Prompt text (reads stdin if not provided)
        text: Option<String>,
    },

    /// Verify the digest chain of an exported audit log
    Verify {
        /// Path to a JSONL audit export
        path: PathBuf,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Frameworks => list_frameworks().await,
            Commands::Run {
                framework,
                input,
                spec,
                coherence,
                congruence,
                no_archetype,
                json,
                audit_out,
            } => {
                let options = RunOptions {
                    input,
                    spec,
                    coherence,
                    congruence,
                    no_archetype,
                    json,
                    audit_out,
                };
                run_framework(&framework, options).await
            }
            Commands::Breach { text } => run_breach(text).await,
            Commands::Verify { path } => verify_audit(&path).await,
            Commands::Config => show_config().await,
        }
    }
}

struct RunOptions {
    input: Option<PathBuf>,
    spec: Option<PathBuf>,
    coherence: Option<QualitativeStrength>,
    congruence: Option<QualitativeStrength>,
    no_archetype: bool,
    json: bool,
    audit_out: Option<PathBuf>,
}

/// Load the catalog named by configuration, or the built-in one
async fn load_catalog(cfg: &ResolvedConfig) -> Result<Catalog> {
    match &cfg.catalog {
        Some(path) => Catalog::load(path).await,
        None => Ok(Catalog::builtin()),
    }
}

fn build_generator(cfg: &ResolvedConfig) -> Arc<dyn Generator> {
    match &cfg.generator {
        Some(settings) => Arc::new(CommandGenerator::new(
            settings.command.clone(),
            settings.args.clone(),
            settings.timeout,
        )),
        None => Arc::new(StaticGenerator::default()),
    }
}

async fn build_orchestrator() -> Result<Orchestrator> {
    let cfg = config::config()?;
    let catalog = load_catalog(cfg).await?;
    Ok(Orchestrator::builder(catalog, build_generator(cfg))
        .pacing(cfg.pacing.clone())
        .build())
}

/// Read prompt text from a file or piped stdin
fn read_prompt(input_file: Option<&Path>) -> Result<Option<String>> {
    if let Some(path) = input_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;
        return Ok(Some(text));
    }

    if io::stdin().is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(Some(buffer))
}

/// Parse a declarative spec file; `.json` is JSON, anything else YAML
fn read_spec(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read spec file: {}", path.display()))?;

    let parsed = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content).map_err(anyhow::Error::from)
    } else {
        serde_yaml::from_str(&content).map_err(anyhow::Error::from)
    };
    parsed.with_context(|| format!("Failed to parse spec file: {}", path.display()))
}

fn format_entry(entry: &LogEntry) -> String {
    format!(
        "[+{:>6.2}s] {:<16} {:<20} {}",
        entry.time_offset,
        entry.module.to_string(),
        entry.event,
        entry.details
    )
}

/// Print log entries to stderr as they are appended
fn follow_log(orchestrator: &Orchestrator) -> crate::core::SubscriberId {
    let printed = AtomicUsize::new(0);
    orchestrator.subscribe(move |state: &AppState| {
        let seen = printed.load(Ordering::SeqCst);
        // The log is cleared when a run starts
        let start = if state.logs.len() < seen { 0 } else { seen };
        for entry in state.logs.iter().skip(start) {
            eprintln!("{}", format_entry(entry));
        }
        printed.store(state.logs.len(), Ordering::SeqCst);
    })
}

/// List frameworks in the catalog
async fn list_frameworks() -> Result<()> {
    let cfg = config::config()?;
    let catalog = load_catalog(cfg).await?;

    println!("{:<16} {:<40} {}", "ID", "TITLE", "RULES");
    println!("{}", "-".repeat(80));
    for framework in &catalog.frameworks {
        let counts: Vec<String> = GovernanceLayer::ALL
            .iter()
            .map(|layer| format!("{}={}", layer, framework.rules_in(*layer).count()))
            .collect();
        println!(
            "{:<16} {:<40} {}",
            framework.id,
            truncate(&framework.title, 38),
            counts.join(" ")
        );
    }

    Ok(())
}

/// Select a framework, apply overrides, and execute one run
async fn run_framework(framework: &str, options: RunOptions) -> Result<()> {
    let orchestrator = build_orchestrator().await?;

    orchestrator
        .dispatch(Action::SelectFramework(framework.to_string()))
        .await
        .with_context(|| {
            let known: Vec<&str> = orchestrator.catalog().ids().collect();
            format!("Available frameworks: {}", known.join(", "))
        })?;

    if let Some(text) = read_prompt(options.input.as_deref())? {
        orchestrator.dispatch(Action::SetPrompt(text.trim().to_string())).await?;
    }

    if let Some(path) = &options.spec {
        let spec = read_spec(path)?;
        orchestrator.dispatch(Action::ApplyDeclarativeSpec(spec)).await?;
    }

    if options.coherence.is_some() || options.no_archetype {
        let patch = SymbolicPatch {
            coherence_strength: options.coherence,
            archetype_projection: options.no_archetype.then_some(false),
        };
        orchestrator
            .dispatch(Action::UpdateConfig(ConfigPatch::Symbolic(patch)))
            .await?;
    }

    if let Some(target) = options.congruence {
        let patch = PhenomenologicalPatch {
            affective_congruence_target: Some(target),
            ..Default::default()
        };
        orchestrator
            .dispatch(Action::UpdateConfig(ConfigPatch::Phenomenological(patch)))
            .await?;
    }

    let prompt = orchestrator.snapshot().prompt;
    if prompt.trim().is_empty() {
        anyhow::bail!("No prompt provided. Use --input <file> or pipe to stdin");
    }

    let follower = (!options.json).then(|| follow_log(&orchestrator));
    let result = orchestrator.dispatch(Action::ExecuteNarrative(prompt)).await;
    if let Some(id) = follower {
        orchestrator.unsubscribe(id);
    }

    let state = orchestrator.snapshot();

    if let Some(path) = &options.audit_out {
        state.logs.export_jsonl(path).await?;
        eprintln!("Audit log written to {}", path.display());
    }

    result?;

    if options.json {
        let json = serde_json::to_string_pretty(&state).context("Failed to serialize state")?;
        println!("{}", json);
        return Ok(());
    }

    if let Some(report) = &state.introspection_report {
        eprintln!();
        eprintln!("Introspection ({})", report.framework);
        for contributor in &report.contributors {
            eprintln!("  {}: {}", contributor.name, contributor.contribution);
        }
        eprintln!("  {}", report.summary);
    }

    if let Some(output) = &state.final_output {
        if let Some(segment) = output.highlight() {
            eprintln!("\nFlagged segment: \"{}\"", segment);
        }
        println!("{}", output.text());
    }

    Ok(())
}

/// Run the breach simulator against a prompt
async fn run_breach(text: Option<String>) -> Result<()> {
    let prompt = match text {
        Some(text) => text,
        None => read_prompt(None)?.context("No prompt provided. Pass TEXT or pipe to stdin")?,
    };

    let orchestrator = build_orchestrator().await?;
    let follower = follow_log(&orchestrator);
    orchestrator
        .dispatch(Action::ExecuteBreachSimulation(prompt.trim().to_string()))
        .await?;
    orchestrator.unsubscribe(follower);

    let state = orchestrator.snapshot();
    match &state.final_output {
        Some(output) => {
            println!("{}", output.text());
            if output.highlight().is_some() {
                std::process::exit(2);
            }
        }
        None => anyhow::bail!("Prompt is empty"),
    }

    Ok(())
}

/// Verify an exported audit log
async fn verify_audit(path: &Path) -> Result<()> {
    let log = AuditLog::load_jsonl(path).await?;

    match log.verify() {
        Ok(()) => {
            println!(
                "OK: {} entries, head digest {}",
                log.len(),
                if log.head_digest().is_empty() { "(empty)" } else { log.head_digest() }
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("FAILED: {}", e);
            std::process::exit(1);
        }
    }
}

async fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("govflow configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:    {}", cfg.home.display());
    println!("  Audit:   {}", cfg.audit_dir().display());
    println!(
        "  Catalog: {}",
        cfg.catalog
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in)".to_string())
    );
    println!();
    println!("Generator:");
    match &cfg.generator {
        Some(g) => {
            println!("  Command: {} {}", g.command, g.args.join(" "));
            println!("  Timeout: {}s", g.timeout.as_secs());
        }
        None => println!("  (canned response)"),
    }
    println!();
    println!("Pacing:");
    println!("  Generation:       {}ms", cfg.pacing.generation_ms);
    println!("  Security:         {}ms", cfg.pacing.security_ms);
    println!("  Structural:       {}ms", cfg.pacing.structural_ms);
    println!("  Symbolic:         {}ms", cfg.pacing.symbolic_ms);
    println!("  Phenomenological: {}ms", cfg.pacing.phenomenological_ms);
    println!("  Breach:           {}ms", cfg.pacing.breach_simulation_ms);

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
