//! CLI binary for reviewing a Python file with the codemend workflow.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use codemend_evaluator::{Credentials, HttpEvaluator};
use codemend_pipeline::{render_markdown, write_outputs, Workflow};
use codemend_tools::{CommandAnalyzer, PytestRunner};

#[derive(Parser)]
#[command(
    name = "codemend",
    version,
    about = "Self-healing code review: static checks, evaluator verdict, adversarial tests, and a suggested fix"
)]
struct Cli {
    /// Path to the Python file to review
    file: PathBuf,

    /// Print the report to stdout instead of writing artifacts
    #[arg(long)]
    no_write: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Credentials are resolved before anything else: missing configuration
    // is a startup error, not a per-run failure.
    let credentials = Credentials::resolve().context("resolving evaluator credentials")?;

    let code = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("reading {}", cli.file.display()))?;

    let workflow = Workflow::new(
        Arc::new(CommandAnalyzer::new()),
        Arc::new(HttpEvaluator::new(credentials)),
        Arc::new(PytestRunner::new()),
    );

    tracing::info!(file = %cli.file.display(), "starting review");
    let state = workflow.run(code).await?;

    let verdict_label = match &state.verdict {
        Some(v) if v.passed() => "✅ pass",
        Some(_) => "❌ fail",
        None => "unknown",
    };

    if cli.no_write {
        println!("{}", render_markdown(&state));
    } else {
        let paths = write_outputs(&cli.file, &state)?;
        println!("Report: {}", paths.report.display());
        if let Some(fixed) = paths.fixed {
            println!("Fix:    {}", fixed.display());
        }
    }
    println!("Verdict: {verdict_label}");

    Ok(())
}
