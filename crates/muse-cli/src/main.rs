//! Muse CLI - batch generation of catalogued media assets

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use muse_pipeline::catalog::load_catalog;
use muse_pipeline::providers::{create_client, PROVIDER_FAMILIES};
use muse_pipeline::{BatchRunner, Generator, MuseConfig, RunContext, RunSummary};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "muse")]
#[command(about = "Batch pipeline for AI-generated media assets", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every asset in a catalog
    Run {
        /// Path to the JSON request catalog
        catalog: String,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        out: Option<String>,

        /// Preview cost and prompts without contacting providers
        #[arg(long)]
        dry_run: bool,

        /// Provider transport (http or mock)
        #[arg(long, default_value = "http")]
        provider: String,
    },

    /// Preview a catalog's cost without contacting providers
    Preview {
        /// Path to the JSON request catalog
        catalog: String,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        out: Option<String>,
    },

    /// Show configured provider families
    Providers,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            catalog,
            out,
            dry_run,
            provider,
        } => run_batch(&catalog, out, dry_run, &provider),
        Commands::Preview { catalog, out } => run_batch(&catalog, out, true, "mock"),
        Commands::Providers => show_providers(),
    }
}

fn run_batch(catalog: &str, out: Option<String>, dry_run: bool, provider: &str) -> Result<()> {
    let config = MuseConfig::load().context("loading config")?;
    let requests =
        load_catalog(Path::new(catalog)).with_context(|| format!("loading catalog {}", catalog))?;
    let output_dir = out.unwrap_or_else(|| config.generation.output_dir.clone());

    println!(
        "Resolving {} requests into {}{}",
        requests.len(),
        output_dir,
        if dry_run { " (dry-run)" } else { "" }
    );

    let client = create_client(provider, &config)?;
    let generator = Generator::new(client, &config, PathBuf::from(output_dir));
    let runner = BatchRunner::new(generator, &config.generation.manifest_filename);
    let ctx = RunContext::new(dry_run);

    let summary = runner.run(&requests, &ctx)?;
    report(&summary);
    Ok(())
}

fn report(summary: &RunSummary) {
    for outcome in &summary.results {
        let status = if outcome.success {
            "ok"
        } else if outcome.dry_run {
            "preview"
        } else {
            "FAILED"
        };
        let detail = outcome
            .local_path
            .as_deref()
            .or(outcome.error.as_deref())
            .unwrap_or("");
        println!("  [{}] {} ({})  {}", outcome.asset_id, outcome.name, status, detail);
    }

    println!(
        "\n{} total, {} generated, {} failed, estimated cost ${:.2}",
        summary.total, summary.successful, summary.failed, summary.estimated_cost
    );
    for (priority, tally) in &summary.by_priority {
        println!(
            "  {}: {}/{} generated",
            priority, tally.successful, tally.total
        );
    }
}

fn show_providers() -> Result<()> {
    let config = MuseConfig::load().context("loading config")?;
    for family in PROVIDER_FAMILIES {
        let key = if config.api_key(family).is_some() {
            "key set"
        } else {
            "no key"
        };
        let enabled = if config.is_enabled(family) {
            "enabled"
        } else {
            "disabled"
        };
        println!("  {:12} {:8} {}", family, key, enabled);
    }
    Ok(())
}
