//! CLI for the plugin registry scanner.
//!
//! This tool scans a plugin catalog's repositories and the npm registry,
//! determines per-epoch platform support, and writes the registry report.

use clap::Parser;
use plugin_registry_scanner::{load_settings, Catalog, RunSummary, Runner, RunnerConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Plugin Registry Scanner - Determine which platform majors each cataloged plugin supports.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the catalog JSON file.
    #[arg(long, default_value = "catalog.json")]
    catalog: PathBuf,

    /// Path the registry report is written to.
    #[arg(long, default_value = "registry.json")]
    output: PathBuf,

    /// Path to the scanner settings TOML file.
    #[arg(long, default_value = "scanner.toml")]
    config: PathBuf,

    /// GitHub Personal Access Token.
    #[arg(long, env = "GITHUB_TOKEN")]
    token: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    init_tracing();

    // Parse arguments
    let args = Args::parse();

    // Run the main logic
    match run(args).await {
        Ok(summary) => {
            print_summary(&summary);

            if summary.all_resolved() {
                ExitCode::from(0)
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Tracing is Rust's structured logging/diagnostics framework. Unlike traditional
/// logging, it's async-aware and captures contextual, structured data rather than
/// just text. The subscriber configured here determines how events (from macros
/// like `info!`, `debug!`, etc.) are collected and displayed.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        // Use compact formatting without module target paths for cleaner output
        .with(fmt::layer().compact().with_target(false))
        // Allow runtime log filtering via RUST_LOG env var (e.g., RUST_LOG=debug)
        // Falls back to "info" level if RUST_LOG is not set or invalid
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        // Register as the global default subscriber
        .init();
}

/// Main execution logic. Any error here is fatal: unreadable settings or
/// catalog, a failed client build, or an unwritable output file.
async fn run(args: Args) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let settings = load_settings(&args.config)?;
    let catalog = Catalog::load(&args.catalog)?;

    let runner = Runner::new(RunnerConfig::new(settings, args.token))?;
    let output = runner.run(&catalog).await;

    std::fs::write(&args.output, output.report.to_json_pretty()?)?;
    info!(path = %args.output.display(), "Wrote registry report");

    Ok(output.summary)
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!("  Entries processed: {}", summary.entries_processed);
    println!("  Resolved cleanly: {}", summary.entries_resolved);
    println!("  Degraded: {}", summary.entries_degraded);
    println!("  Skipped: {}", summary.entries_skipped);

    if summary.issues.is_empty() {
        println!("  Issues: none");
    } else {
        println!("  Issues ({}):", summary.issues.len());
        for issue in &summary.issues {
            println!("    - {issue}");
        }
    }
}
