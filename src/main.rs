//! Strata CLI - upgrade preflight validation

use clap::{Parser, Subcommand};
use strata_common::telemetry::{init_tracing, LogFormat, TelemetryConfig, LOG_FORMAT_ENV};
use tokio_util::sync::CancellationToken;

use strata::commands::preflight::{self, PreflightArgs};

/// Strata - upgrade preflight validation for multi-provider Kubernetes clusters
#[derive(Parser, Debug)]
#[command(name = "strata", version, about, long_about = None)]
struct Cli {
    /// Log line format (text or json)
    #[arg(long, global = true, env = LOG_FORMAT_ENV)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that a cluster can be upgraded to a new configuration
    ///
    /// Reads the running cluster and compares it against the desired
    /// configuration. Every problem found is reported at once; exits
    /// non-zero when any check fails.
    Preflight(PreflightArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut telemetry = TelemetryConfig::default();
    if let Some(format) = cli.log_format {
        telemetry.format = format;
    }
    init_tracing(telemetry)?;

    match cli.command {
        Commands::Preflight(args) => run_preflight(args).await,
    }
}

/// Run one preflight pass, cancelled by Ctrl-C
async fn run_preflight(args: PreflightArgs) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling preflight checks");
            on_interrupt.cancel();
        }
    });

    let report = preflight::run(&args, &cancel).await?;
    println!("{}", preflight::render(&report));
    if !report.passed() {
        std::process::exit(1);
    }
    Ok(())
}
