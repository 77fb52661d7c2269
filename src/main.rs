use auditor::{AuditError, IndexAuditor};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use repair::{RepairError, SchemaRepairer};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod context;
mod report;

use context::RunContext;

/// The main entry point for the Vigil schema upkeep tool.
#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Could not install the log subscriber: {}", e);
    }

    // Parse command-line arguments
    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Run aborted.");
            eprintln!("Fatal: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Keeps the live-monitoring database indexed and its schema repaired.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create any missing index on the events table and refresh its statistics.
    Audit,
    /// Apply the idempotent corrective migrations.
    Repair,
}

/// Builds the run context, dispatches the command, and shuts the pool down exactly once.
async fn run(command: Commands) -> anyhow::Result<ExitCode> {
    let ctx = RunContext::initialize().await?;
    println!(
        "Connected to {}:{}/{} at {}",
        ctx.descriptor.host,
        ctx.descriptor.port,
        ctx.descriptor.database,
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    let result = match command {
        Commands::Audit => handle_audit(&ctx).await,
        Commands::Repair => handle_repair(&ctx).await,
    };

    ctx.close().await;
    result
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_audit(ctx: &RunContext) -> anyhow::Result<ExitCode> {
    let settings = &ctx.settings.audit;
    println!("Auditing indexes on '{}'...", settings.table);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.set_message(format!("Building missing indexes on {}", settings.table));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let auditor = IndexAuditor::new(&ctx.repo, settings, ctx.settings.pool.max_connections as usize);
    let result = auditor.audit(&settings.table).await;
    spinner.finish_and_clear();

    match result {
        Ok(summary) => {
            print!("{}", report::render_audit(&summary));
            Ok(ExitCode::SUCCESS)
        }
        Err(AuditError::AggregateFailure(summary)) => {
            print!("{}", report::render_audit(&summary));
            eprintln!("No missing index could be created on a non-trivial table.");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

async fn handle_repair(ctx: &RunContext) -> anyhow::Result<ExitCode> {
    println!("Applying schema repairs...");

    match SchemaRepairer::new(&ctx.repo).apply_fixes().await {
        Ok(summary) => {
            print!("{}", report::render_repair(&summary));
            Ok(ExitCode::SUCCESS)
        }
        Err(RepairError::AggregateFailure(summary)) => {
            print!("{}", report::render_repair(&summary));
            eprintln!("Every repair step failed.");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}
