//! `covenant` command-line interface.
//!
//! Thin I/O glue around covenant-core and covenant-runtime: scaffold the
//! rule and history files, validate rules, run the generate/check/log
//! pipeline, and read the history back out.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use covenant_core::{LoadedRuleSet, RuleKind};
use covenant_runtime::{
    render_report, GenerationConfig, HistoryStore, Pipeline, RunRecord, StaticGenerator,
    TextGenerator, TogetherProvider, DEFAULT_MODEL,
};

const STARTER_RULES: &str = r#"{
    "rules": [
        {"id": "R1", "type": "keyword", "keywords": ["sudo", "rm -rf"], "severity": "high"},
        {"id": "R2", "type": "role", "allowed_roles": ["developer", "analyst"], "severity": "medium"}
    ]
}
"#;

#[derive(Parser)]
#[command(name = "covenant", version, about = "Policy-compliance checks for LLM agent runs")]
struct Cli {
    /// Rule file (JSON, or YAML by extension).
    #[arg(long, global = true, default_value = "constitution.json")]
    rules: PathBuf,

    /// Run history file.
    #[arg(long, global = true, default_value = "log.json")]
    log: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a starter rule file and an empty run history.
    Init,

    /// Load the rule file and report every rule and load warning.
    Validate,

    /// Generate a response, check it against the rules, and log the run.
    Run {
        /// The prompt to send to the generation backend.
        input_text: String,

        /// Actor role checked against role rules.
        #[arg(long, default_value = "developer")]
        role: String,

        /// Model to request.
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,

        /// Skip the network call and echo the input as the output.
        #[arg(long)]
        offline: bool,
    },

    /// Show a logged run by id.
    Trace {
        /// Run identifier, as printed by `run`.
        uuid: Uuid,
    },

    /// Show aggregate compliance over all logged runs.
    Score,

    /// Render an HTML report of all logged runs.
    Report {
        /// Output file.
        #[arg(long, default_value = "covenant_report.html")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Init => init(&cli),
        Command::Validate => validate(&cli),
        Command::Run {
            input_text,
            role,
            model,
            offline,
        } => run(&cli, input_text, role, model, *offline).await,
        Command::Trace { uuid } => trace(&cli, *uuid),
        Command::Score => score(&cli),
        Command::Report { out } => report(&cli, out),
    }
}

fn init(cli: &Cli) -> Result<()> {
    if cli.rules.exists() {
        println!("Skipping {}: already exists.", cli.rules.display());
    } else {
        fs::write(&cli.rules, STARTER_RULES)
            .with_context(|| format!("failed to write {}", cli.rules.display()))?;
        println!("Created {}.", cli.rules.display());
    }

    if cli.log.exists() {
        println!("Skipping {}: already exists.", cli.log.display());
    } else {
        fs::write(&cli.log, "[]\n")
            .with_context(|| format!("failed to write {}", cli.log.display()))?;
        println!("Created {}.", cli.log.display());
    }

    println!("Review the rule file and set TOGETHER_API_KEY to enable generation.");
    Ok(())
}

fn validate(cli: &Cli) -> Result<()> {
    let loaded = LoadedRuleSet::load(&cli.rules)
        .with_context(|| format!("failed to load rules from {}", cli.rules.display()))?;

    if loaded.rules.is_empty() {
        println!(
            "No rules defined in {}; no policy will be enforced.",
            cli.rules.display()
        );
    } else {
        println!("Rules in {}:", cli.rules.display());
        for rule in &loaded.rules {
            let detail = match &rule.kind {
                RuleKind::Keyword { keywords } => format!("keyword [{}]", keywords.join(", ")),
                RuleKind::Role { allowed_roles } => format!("role [{}]", allowed_roles.join(", ")),
                RuleKind::Inert => "inert (never matches)".to_string(),
                RuleKind::Unknown { declared } => format!("unknown kind '{declared}' (skipped)"),
            };
            println!("  {} ({}): {}", rule.id, rule.severity, detail);
        }
    }

    for warning in &loaded.warnings {
        println!("warning: {warning}");
    }

    println!(
        "Validation complete: {} rule(s), {} warning(s).",
        loaded.rules.len(),
        loaded.warnings.len()
    );
    Ok(())
}

async fn run(cli: &Cli, input_text: &str, role: &str, model: &str, offline: bool) -> Result<()> {
    let loaded = LoadedRuleSet::load(&cli.rules)
        .with_context(|| format!("failed to load rules from {}", cli.rules.display()))?;
    for warning in &loaded.warnings {
        tracing::warn!(rule_file = %cli.rules.display(), %warning, "rule load warning");
    }

    let generator: Arc<dyn TextGenerator> = if offline {
        Arc::new(StaticGenerator::echo())
    } else {
        Arc::new(TogetherProvider::from_env().context(
            "no generation backend available; set TOGETHER_API_KEY or pass --offline",
        )?)
    };

    let pipeline = Pipeline::new(generator, loaded.into_rules(), HistoryStore::new(&cli.log))
        .with_config(GenerationConfig::new(model));

    let record = pipeline
        .run(input_text, role)
        .await
        .context("pipeline run failed")?;
    print_record(&record);
    Ok(())
}

fn print_record(record: &RunRecord) {
    println!("--- Run Result ---");
    println!("UUID: {}", record.uuid);
    println!("Timestamp: {}", record.timestamp.to_rfc3339());
    println!("Input: {}", record.input);
    println!("Output: {}", record.output);
    println!("Role: {}", record.role);
    println!("Model: {}", record.llm_model);

    if record.violations.is_empty() {
        println!("Violations: none");
    } else {
        println!("Violations:");
        for violation in &record.violations {
            println!(
                "  - rule {} ({}) triggered by '{}' [{}]",
                violation.rule_id, violation.kind, violation.trigger, violation.severity
            );
        }
    }
    println!("Score: {} / 100", record.score);
}

fn trace(cli: &Cli, uuid: Uuid) -> Result<()> {
    let store = HistoryStore::new(&cli.log);
    match store.find(uuid)? {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        None => bail!("no run found for uuid '{uuid}'"),
    }
}

fn score(cli: &Cli) -> Result<()> {
    let summary = HistoryStore::new(&cli.log).summary()?;

    println!("Total runs: {}", summary.total_runs);
    println!("Average score: {} / 100", summary.average_score);
    if summary.violation_summary.is_empty() {
        println!("No violations recorded.");
    } else {
        println!("Violations by rule:");
        for (rule_id, count) in &summary.violation_summary {
            println!("  {rule_id}: {count}");
        }
    }
    Ok(())
}

fn report(cli: &Cli, out: &Path) -> Result<()> {
    let records = HistoryStore::new(&cli.log).load()?;
    let html = render_report(&records);
    fs::write(out, html).with_context(|| format!("failed to write {}", out.display()))?;
    println!("Report written to {}.", out.display());
    Ok(())
}
